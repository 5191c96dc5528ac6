//! Per-cell validation rules.
//!
//! A rule is a boolean expression in which [`PLACEHOLDER`] stands for the
//! candidate value, e.g. `THIS >= 0 && THIS <= 100`. Rules run before a
//! literal is written; a failing rule blocks the write.

use serde::{Deserialize, Serialize};

use gridcalc_engine::engine::{CellRef, EvalError, Evaluator, Value, extract_dependencies};

use crate::cell::{CellFormat, NumberFormat};
use crate::error::{GridcalcError, Result};

pub const PLACEHOLDER: &str = "THIS";

/// Value bound to the placeholder when checking that a rule is well formed.
const SAMPLE_VALUE: f64 = 5.0;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRule {
    pub expression: String,
    /// Shown instead of the default message when the rule fails.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ValidationRule {
    pub fn new(expression: impl Into<String>) -> Self {
        ValidationRule {
            expression: expression.into(),
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Check that the rule references no cells and yields a boolean for a
    /// sample value.
    pub fn verify(&self, evaluator: &Evaluator) -> Result<()> {
        if self.expression.trim().is_empty() {
            return Err(self.invalid("rule is empty"));
        }
        if let Some(cell) = extract_dependencies(&self.expression).first() {
            return Err(self.invalid(&format!("rules may not reference cells (found {cell})")));
        }
        match self.run(evaluator, Value::Number(SAMPLE_VALUE)) {
            Ok(Value::Boolean(_)) => Ok(()),
            Ok(_) => Err(self.invalid("Validation rule must return true/false")),
            Err(
                err @ (EvalError::Parse(_)
                | EvalError::UnknownName(_)
                | EvalError::UnknownFunction(_)
                | EvalError::Arity { .. }
                | EvalError::Reference { .. }),
            ) => Err(self.invalid(&err.to_string())),
            // Type errors depend on the candidate, not on the rule's shape.
            Err(_) => Ok(()),
        }
    }

    /// Check `candidate` (raw literal input) for the cell at `cell`.
    /// Empty input always passes.
    pub fn check(
        &self,
        cell: CellRef,
        candidate: &str,
        format: &CellFormat,
        evaluator: &Evaluator,
    ) -> Result<()> {
        if candidate.trim().is_empty() {
            return Ok(());
        }
        let value = match format.number_format {
            NumberFormat::Number | NumberFormat::Financial => {
                match format.normalize_numeric_input(candidate).parse::<f64>() {
                    Ok(n) => Value::Number(n),
                    Err(_) => {
                        return Err(GridcalcError::Validation {
                            cell,
                            message: "Value must be a number".to_string(),
                        });
                    }
                }
            }
            NumberFormat::General | NumberFormat::DateTime => format.parse_literal(candidate),
        };

        match self.run(evaluator, value) {
            Ok(Value::Boolean(true)) => Ok(()),
            Ok(Value::Boolean(false)) => Err(GridcalcError::Validation {
                cell,
                message: self.failure_message(),
            }),
            Ok(_) => Err(self.invalid("Validation rule must return true/false")),
            Err(err) => Err(GridcalcError::Validation {
                cell,
                message: format!("Validation error: {err}"),
            }),
        }
    }

    fn run(&self, evaluator: &Evaluator, value: Value) -> std::result::Result<Value, EvalError> {
        let no_cells = |_: CellRef| Value::Error("#REF!".to_string());
        evaluator.evaluate_with_bindings(&self.expression, &no_cells, &[(PLACEHOLDER, value)])
    }

    fn failure_message(&self) -> String {
        self.message
            .clone()
            .unwrap_or_else(|| format!("Value does not meet validation rule: {}", self.expression))
    }

    fn invalid(&self, message: &str) -> GridcalcError {
        GridcalcError::InvalidValidationRule {
            rule: self.expression.clone(),
            message: message.to_string(),
        }
    }
}

/// Ready-made rules for common constraints.
#[derive(Clone, Debug, PartialEq)]
pub enum ValidationPreset {
    WholeNumberBetween { min: f64, max: f64 },
    WholeNumberGreaterThan(f64),
    WholeNumberLessThan(f64),
    DecimalBetween { min: f64, max: f64 },
    DecimalGreaterThan(f64),
    DecimalLessThan(f64),
    TextLengthBetween { min: usize, max: usize },
    TextLengthMax(usize),
    NotEmpty,
    AllowedValues(Vec<String>),
    Email,
    PositiveNumber,
    Percentage,
}

impl ValidationPreset {
    pub fn expression(&self) -> String {
        match self {
            ValidationPreset::WholeNumberBetween { min, max } => {
                format!("THIS >= {min} && THIS <= {max} && THIS == FLOOR(THIS)")
            }
            ValidationPreset::WholeNumberGreaterThan(v) => {
                format!("THIS > {v} && THIS == FLOOR(THIS)")
            }
            ValidationPreset::WholeNumberLessThan(v) => {
                format!("THIS < {v} && THIS == FLOOR(THIS)")
            }
            ValidationPreset::DecimalBetween { min, max } => {
                format!("THIS >= {min} && THIS <= {max}")
            }
            ValidationPreset::DecimalGreaterThan(v) => format!("THIS > {v}"),
            ValidationPreset::DecimalLessThan(v) => format!("THIS < {v}"),
            ValidationPreset::TextLengthBetween { min, max } => {
                format!("LEN(THIS) >= {min} && LEN(THIS) <= {max}")
            }
            ValidationPreset::TextLengthMax(max) => format!("LEN(THIS) <= {max}"),
            ValidationPreset::NotEmpty => "LEN(THIS) > 0".to_string(),
            ValidationPreset::AllowedValues(values) => values
                .iter()
                .map(|v| {
                    let quoted = v.trim().replace('\\', "\\\\").replace('"', "\\\"");
                    format!("CONCAT(THIS) == \"{quoted}\"")
                })
                .collect::<Vec<_>>()
                .join(" || "),
            ValidationPreset::Email => {
                "CONTAINS(THIS, \"@\") && FIND(\".\", THIS, FIND(\"@\", THIS)) > 0".to_string()
            }
            ValidationPreset::PositiveNumber => "THIS > 0".to_string(),
            ValidationPreset::Percentage => "THIS >= 0 && THIS <= 100".to_string(),
        }
    }

    pub fn rule(&self) -> ValidationRule {
        ValidationRule::new(self.expression())
    }
}
