//! Evaluation errors and their display tags.

use std::fmt;
use thiserror::Error;

/// Accepted argument count of a builtin function.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Arity {
    pub min: usize,
    pub max: Option<usize>,
}

impl Arity {
    pub const fn exactly(n: usize) -> Arity {
        Arity {
            min: n,
            max: Some(n),
        }
    }

    pub const fn at_least(n: usize) -> Arity {
        Arity { min: n, max: None }
    }

    pub const fn between(min: usize, max: usize) -> Arity {
        Arity {
            min,
            max: Some(max),
        }
    }

    pub fn accepts(&self, count: usize) -> bool {
        count >= self.min && self.max.is_none_or(|max| count <= max)
    }

    /// Return an [`EvalError::Arity`] naming `function` when `count` is not accepted.
    pub fn check(&self, function: &str, count: usize) -> Result<(), EvalError> {
        if self.accepts(count) {
            Ok(())
        } else {
            Err(EvalError::Arity {
                function: function.to_string(),
                expected: *self,
                got: count,
            })
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) if max == self.min => write!(f, "exactly {}", max),
            Some(max) => write!(f, "{} to {}", self.min, max),
            None => write!(f, "at least {}", self.min),
        }
    }
}

/// Failure while evaluating a single formula.
///
/// These never escape a recalculation pass: the sheet renders them through
/// [`EvalError::tag`] and carries on with sibling cells.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("{function} requires {expected} argument(s), got {got}")]
    Arity {
        function: String,
        expected: Arity,
        got: usize,
    },

    #[error("{context}: cannot convert {value:?} to {target}")]
    TypeCoercion {
        context: String,
        value: String,
        target: &'static str,
    },

    #[error("unsupported operand types: {signature}")]
    Operator { signature: String },

    #[error("{function}: division by zero")]
    Division { function: String, sentinel: f64 },

    #[error("{function}: {message}")]
    OutOfRange { function: String, message: String },

    #[error("{function}: no condition matched")]
    NoMatch { function: String },

    #[error("Invalid reference: {reference}")]
    Reference { reference: String },

    #[error("{reference} holds an error value ({tag})")]
    Propagated { reference: String, tag: String },

    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    #[error("Unknown name: {0}")]
    UnknownName(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Result is not a cell value: {0}")]
    Unrepresentable(String),

    #[error("{0}")]
    Runtime(String),
}

impl EvalError {
    /// Short tag shown in place of a failed cell's display text.
    pub fn tag(&self) -> &str {
        match self {
            EvalError::Arity { .. } => "#ARGS!",
            EvalError::TypeCoercion { .. } | EvalError::Operator { .. } => "#VALUE!",
            EvalError::Unrepresentable(_) => "#VALUE!",
            EvalError::Division { .. } => "#DIV/0!",
            EvalError::OutOfRange { .. } => "#NUM!",
            EvalError::NoMatch { .. } => "#N/A",
            EvalError::Reference { .. } => "#REF!",
            EvalError::Propagated { tag, .. } => tag,
            EvalError::UnknownFunction(_) | EvalError::UnknownName(_) => "#NAME?",
            EvalError::Parse(_) => "#PARSE!",
            EvalError::Runtime(_) => "#ERR!",
        }
    }

    /// Attach a function name to a coercion failure raised while reading its arguments.
    pub fn in_function(self, function: &str) -> EvalError {
        match self {
            EvalError::TypeCoercion { value, target, .. } => EvalError::TypeCoercion {
                context: function.to_string(),
                value,
                target,
            },
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arity_message_names_function_and_counts() {
        let err = Arity::exactly(1).check("SIN", 2).unwrap_err();
        assert_eq!(err.to_string(), "SIN requires exactly 1 argument(s), got 2");
        assert_eq!(err.tag(), "#ARGS!");

        let err = Arity::between(2, 3).check("FIND", 1).unwrap_err();
        assert_eq!(err.to_string(), "FIND requires 2 to 3 argument(s), got 1");

        let err = Arity::at_least(1).check("SUM", 0).unwrap_err();
        assert_eq!(err.to_string(), "SUM requires at least 1 argument(s), got 0");
    }

    #[test]
    fn test_arity_accepts() {
        assert!(Arity::at_least(2).accepts(10));
        assert!(!Arity::between(1, 2).accepts(3));
        assert!(Arity::exactly(0).accepts(0));
    }

    #[test]
    fn test_propagated_error_keeps_upstream_tag() {
        let err = EvalError::Propagated {
            reference: "A1".to_string(),
            tag: "#DIV/0!".to_string(),
        };
        assert_eq!(err.tag(), "#DIV/0!");
    }

    #[test]
    fn test_in_function_rewrites_context() {
        let err = EvalError::TypeCoercion {
            context: "value".to_string(),
            value: "abc".to_string(),
            target: "number",
        }
        .in_function("SQRT");
        assert_eq!(err.to_string(), "SQRT: cannot convert \"abc\" to number");
    }
}
