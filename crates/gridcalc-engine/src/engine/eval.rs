//! Formula evaluation.
//!
//! The [`Evaluator`] owns a configured Rhai engine and nothing else: every
//! referenced cell value is pulled from a [`CellResolver`] supplied per call,
//! so one evaluator can be shared by every sheet in a workbook.

use std::cmp::Ordering;

use log::trace;
use rhai::{Dynamic, Engine, EvalAltResult, ImmutableString, Scope};

use super::cell_ref::CellRef;
use super::deps::{extract_dependencies, invalid_references};
use super::error::EvalError;
use super::preprocess::{REF_ERROR, contains_ref_error, preprocess_formula};
use super::value::{Blank, Value};

/// Source of referenced cell values during an evaluation.
pub trait CellResolver {
    fn resolve(&self, cell: CellRef) -> Value;
}

impl<F> CellResolver for F
where
    F: Fn(CellRef) -> Value,
{
    fn resolve(&self, cell: CellRef) -> Value {
        self(cell)
    }
}

pub struct Evaluator {
    engine: Engine,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Evaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Evaluator").finish_non_exhaustive()
    }
}

impl Evaluator {
    pub fn new() -> Self {
        let mut engine = Engine::new();
        engine.set_max_expr_depths(64, 32);
        engine.set_max_string_size(1 << 20);
        engine.set_max_array_size(4096);
        crate::builtins::register_builtins(&mut engine);
        register_blank(&mut engine);
        Evaluator { engine }
    }

    /// Evaluate formula text (with or without the leading `=`).
    pub fn evaluate(&self, formula: &str, resolver: &dyn CellResolver) -> Result<Value, EvalError> {
        self.evaluate_with_bindings(formula, resolver, &[])
    }

    /// Evaluate with extra named values in scope, e.g. a validation placeholder.
    pub fn evaluate_with_bindings(
        &self,
        formula: &str,
        resolver: &dyn CellResolver,
        bindings: &[(&str, Value)],
    ) -> Result<Value, EvalError> {
        let formula = formula.trim();
        let formula = formula.strip_prefix('=').unwrap_or(formula).trim();
        if formula.is_empty() {
            return Ok(Value::Text(String::new()));
        }
        if contains_ref_error(formula) {
            return Err(EvalError::Reference {
                reference: REF_ERROR.to_string(),
            });
        }
        if let Some(bad) = invalid_references(formula).into_iter().next() {
            return Err(EvalError::Reference { reference: bad });
        }

        let mut scope = Scope::new();
        for (name, value) in bindings {
            scope.push_constant_dynamic(name.to_string(), value.to_dynamic());
        }
        for cell in extract_dependencies(formula) {
            match resolver.resolve(cell) {
                Value::Error(tag) => {
                    return Err(EvalError::Propagated {
                        reference: cell.to_string(),
                        tag,
                    });
                }
                value if value.is_blank() => {
                    scope.push_constant_dynamic(cell.to_string(), Dynamic::from(Blank));
                }
                value => {
                    scope.push_constant_dynamic(cell.to_string(), value.to_dynamic());
                }
            }
        }

        let script = preprocess_formula(formula);
        let result = self
            .engine
            .eval_expression_with_scope::<Dynamic>(&mut scope, &script)
            .map_err(|err| {
                trace!("rhai rejected {script:?}: {err}");
                from_rhai(*err)
            })?;
        Value::from_dynamic(result)
    }
}

/// Operators for empty references: zero beside numbers, `""` beside strings.
fn register_blank(engine: &mut Engine) {
    engine.register_type_with_name::<Blank>("blank");

    let arithmetic: [(&str, fn(f64, f64) -> f64); 6] = [
        ("+", |a, b| a + b),
        ("-", |a, b| a - b),
        ("*", |a, b| a * b),
        ("/", |a, b| a / b),
        ("%", |a, b| a % b),
        ("**", f64::powf),
    ];
    for (op, f) in arithmetic {
        engine.register_fn(op, move |_: Blank, b: f64| f(0.0, b));
        engine.register_fn(op, move |a: f64, _: Blank| f(a, 0.0));
        engine.register_fn(op, move |_: Blank, _: Blank| f(0.0, 0.0));
    }

    let comparisons: [(&str, fn(Ordering) -> bool); 6] = [
        ("==", Ordering::is_eq),
        ("!=", Ordering::is_ne),
        ("<", Ordering::is_lt),
        ("<=", Ordering::is_le),
        (">", Ordering::is_gt),
        (">=", Ordering::is_ge),
    ];
    for (op, test) in comparisons {
        engine.register_fn(op, move |_: Blank, b: f64| 0.0f64.partial_cmp(&b).is_some_and(test));
        engine.register_fn(op, move |a: f64, _: Blank| a.partial_cmp(&0.0).is_some_and(test));
        engine.register_fn(op, move |_: Blank, s: ImmutableString| test("".cmp(s.as_str())));
        engine.register_fn(op, move |s: ImmutableString, _: Blank| test(s.as_str().cmp("")));
        engine.register_fn(op, move |_: Blank, _: Blank| test(Ordering::Equal));
    }

    engine.register_fn("+", |_: Blank, s: ImmutableString| s);
    engine.register_fn("+", |s: ImmutableString, _: Blank| s);
    engine.register_fn("-", |_: Blank| 0.0f64);
}

fn from_rhai(err: EvalAltResult) -> EvalError {
    match err {
        EvalAltResult::ErrorRuntime(value, _) if value.is::<EvalError>() => value.cast::<EvalError>(),
        EvalAltResult::ErrorInFunctionCall(_, _, inner, _) => from_rhai(*inner),
        EvalAltResult::ErrorParsing(kind, pos) => EvalError::Parse(format!("{kind} ({pos})")),
        EvalAltResult::ErrorVariableNotFound(name, _) => EvalError::UnknownName(name),
        EvalAltResult::ErrorFunctionNotFound(signature, _) => EvalError::Operator { signature },
        EvalAltResult::ErrorMismatchDataType(expected, actual, _) => EvalError::TypeCoercion {
            context: "expression".to_string(),
            value: actual,
            target: if expected.contains("bool") { "boolean" } else { "number" },
        },
        other => EvalError::Runtime(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank(_: CellRef) -> Value {
        Value::Number(0.0)
    }

    #[test]
    fn test_arithmetic_uses_float_semantics() {
        let ev = Evaluator::new();
        assert_eq!(ev.evaluate("=7 / 2", &blank), Ok(Value::Number(3.5)));
        assert_eq!(ev.evaluate("2 ** 3 + 1", &blank), Ok(Value::Number(9.0)));
        assert_eq!(ev.evaluate("", &blank), Ok(Value::Text(String::new())));
    }

    #[test]
    fn test_references_come_from_resolver() {
        let ev = Evaluator::new();
        let resolver = |cell: CellRef| {
            if cell == CellRef::new(2, 2) {
                Value::Text("5".to_string())
            } else {
                Value::Number(0.0)
            }
        };
        assert_eq!(ev.evaluate("POW(B2, 2)", &resolver), Ok(Value::Number(25.0)));
        assert_eq!(ev.evaluate("A1 + 1", &resolver), Ok(Value::Number(1.0)));
    }

    #[test]
    fn test_error_classes_and_tags() {
        let ev = Evaluator::new();
        let tag = |formula: &str| ev.evaluate(formula, &blank).unwrap_err().tag().to_string();
        assert_eq!(tag("B2*2 POW 2"), "#PARSE!");
        assert_eq!(tag("SIN(1, 2)"), "#ARGS!");
        assert_eq!(tag("CTAN(0)"), "#DIV/0!");
        assert_eq!(tag("SQRT(\"abc\")"), "#VALUE!");
        assert_eq!(tag("NOSUCH(1)"), "#NAME?");
        assert_eq!(tag("foo + 1"), "#NAME?");
        assert_eq!(tag("#REF! + 1"), "#REF!");
        assert_eq!(tag("A0 + 1"), "#REF!");
    }

    #[test]
    fn test_nested_call_errors_surface_inner_error() {
        let ev = Evaluator::new();
        let err = ev.evaluate("ABS(SIN(1, 2))", &blank).unwrap_err();
        assert!(matches!(err, EvalError::Arity { ref function, .. } if function == "SIN"));
    }

    #[test]
    fn test_upstream_error_value_propagates() {
        let ev = Evaluator::new();
        let resolver = |_: CellRef| Value::Error("#DIV/0!".to_string());
        let err = ev.evaluate("A1 + 1", &resolver).unwrap_err();
        assert_eq!(err.tag(), "#DIV/0!");
    }

    #[test]
    fn test_strings_comparisons_and_booleans() {
        let ev = Evaluator::new();
        assert_eq!(
            ev.evaluate("UPPER(\"abc\") == \"ABC\"", &blank),
            Ok(Value::Boolean(true))
        );
        assert_eq!(ev.evaluate("IF(3 > 2, \"yes\", \"no\")", &blank), Ok(Value::Text("yes".into())));
        assert_eq!(ev.evaluate("TRUE && !FALSE", &blank), Ok(Value::Boolean(true)));
        assert_eq!(ev.evaluate("LEN(\"A1\")", &blank), Ok(Value::Number(2.0)));
    }

    #[test]
    fn test_empty_references_act_as_zero_or_empty_text() {
        let ev = Evaluator::new();
        let empty = |_: CellRef| Value::default();
        assert_eq!(ev.evaluate("A1 + 1", &empty), Ok(Value::Number(1.0)));
        assert_eq!(ev.evaluate("2 * B3 - A1", &empty), Ok(Value::Number(0.0)));
        assert_eq!(ev.evaluate("-A1 < 1", &empty), Ok(Value::Boolean(true)));
        assert_eq!(ev.evaluate("A1 == \"\"", &empty), Ok(Value::Boolean(true)));
        assert_eq!(ev.evaluate("\"x\" + A1", &empty), Ok(Value::Text("x".into())));
        assert_eq!(ev.evaluate("ISBLANK(A1)", &empty), Ok(Value::Boolean(true)));
        assert_eq!(ev.evaluate("ISNUMBER(A1)", &empty), Ok(Value::Boolean(false)));
        assert_eq!(ev.evaluate("SQRT(A1)", &empty), Ok(Value::Number(0.0)));
        assert_eq!(ev.evaluate("A1", &empty), Ok(Value::default()));
    }

    #[test]
    fn test_bindings_are_visible() {
        let ev = Evaluator::new();
        let result = ev.evaluate_with_bindings("THIS > 3", &blank, &[("THIS", Value::Number(5.0))]);
        assert_eq!(result, Ok(Value::Boolean(true)));
    }

    #[test]
    fn test_evaluator_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Evaluator>();
    }
}
