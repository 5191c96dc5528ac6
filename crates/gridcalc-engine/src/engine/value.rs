//! Evaluated cell values.
//!
//! A formula or literal always evaluates to one of five variants. Conversions
//! between variants are explicit and fallible; the Rhai boundary is crossed
//! only through [`Value::to_dynamic`] and [`Value::from_dynamic`].

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rhai::Dynamic;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::EvalError;
use super::format::format_number;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d.%m.%Y"];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Number(f64),
    Text(String),
    Boolean(bool),
    DateTime(NaiveDateTime),
    /// A failed evaluation, holding its display tag (e.g. `#DIV/0!`).
    Error(String),
}

/// Discriminant of a [`Value`], stored alongside each cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    #[default]
    Text,
    Number,
    Boolean,
    DateTime,
    Error,
}

/// A referenced position with nothing in it.
///
/// Inside a formula it reads as `0` next to numbers and as `""` next to
/// strings; passed to a function or returned, it becomes empty text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Blank;

impl Default for Value {
    fn default() -> Self {
        Value::Text(String::new())
    }
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Number(_) => ValueKind::Number,
            Value::Text(_) => ValueKind::Text,
            Value::Boolean(_) => ValueKind::Boolean,
            Value::DateTime(_) => ValueKind::DateTime,
            Value::Error(_) => ValueKind::Error,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Value::Text(s) if s.is_empty())
    }

    /// Interpret a literal typed into a cell.
    ///
    /// Numbers, `TRUE`/`FALSE` and ISO-like dates are recognised; a pair of
    /// surrounding double quotes forces text. Everything else is text.
    pub fn from_literal(input: &str) -> Value {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Value::Text(String::new());
        }
        if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
            return Value::Text(trimmed[1..trimmed.len() - 1].to_string());
        }
        if let Ok(n) = trimmed.parse::<f64>()
            && n.is_finite()
        {
            return Value::Number(n);
        }
        if trimmed.eq_ignore_ascii_case("true") {
            return Value::Boolean(true);
        }
        if trimmed.eq_ignore_ascii_case("false") {
            return Value::Boolean(false);
        }
        if let Some(dt) = parse_datetime(trimmed) {
            return Value::DateTime(dt);
        }
        Value::Text(input.to_string())
    }

    /// Numeric coercion: numbers pass through, text is parsed, booleans map to 1/0.
    /// Blank text counts as zero.
    pub fn to_number(&self) -> Result<f64, EvalError> {
        match self {
            Value::Number(n) => Ok(*n),
            Value::Text(s) if s.trim().is_empty() => Ok(0.0),
            Value::Boolean(b) => Ok(if *b { 1.0 } else { 0.0 }),
            Value::Text(s) => s.trim().parse::<f64>().map_err(|_| coercion(s, "number")),
            Value::DateTime(dt) => Err(coercion(&dt.to_string(), "number")),
            Value::Error(tag) => Err(EvalError::Propagated {
                reference: "value".to_string(),
                tag: tag.clone(),
            }),
        }
    }

    /// Integer view of a numeric value, truncating toward zero.
    pub fn to_integer(&self) -> Result<i64, EvalError> {
        let n = self.to_number()?;
        if !n.is_finite() {
            return Err(coercion(&format_number(n), "integer"));
        }
        Ok(n.trunc() as i64)
    }

    pub fn to_bool(&self) -> Result<bool, EvalError> {
        match self {
            Value::Boolean(b) => Ok(*b),
            Value::Number(n) => Ok(*n != 0.0),
            Value::Text(s) if s.trim().is_empty() => Ok(false),
            Value::Text(s) if s.trim().eq_ignore_ascii_case("true") => Ok(true),
            Value::Text(s) if s.trim().eq_ignore_ascii_case("false") => Ok(false),
            other => Err(coercion(&other.to_string(), "boolean")),
        }
    }

    pub fn to_datetime(&self) -> Result<NaiveDateTime, EvalError> {
        match self {
            Value::DateTime(dt) => Ok(*dt),
            Value::Text(s) => parse_datetime(s).ok_or_else(|| coercion(s, "date")),
            other => Err(coercion(&other.to_string(), "date")),
        }
    }

    pub fn to_dynamic(&self) -> Dynamic {
        match self {
            Value::Number(n) => Dynamic::from_float(*n),
            Value::Text(s) => Dynamic::from(s.clone()),
            Value::Boolean(b) => Dynamic::from_bool(*b),
            Value::DateTime(dt) => Dynamic::from(*dt),
            Value::Error(tag) => Dynamic::from(tag.clone()),
        }
    }

    /// Convert a Rhai result back into a cell value.
    pub fn from_dynamic(value: Dynamic) -> Result<Value, EvalError> {
        if value.is_unit() || value.is::<Blank>() {
            return Ok(Value::Text(String::new()));
        }
        if let Ok(n) = value.as_float() {
            return Ok(Value::Number(n));
        }
        if let Ok(n) = value.as_int() {
            return Ok(Value::Number(n as f64));
        }
        if let Ok(b) = value.as_bool() {
            return Ok(Value::Boolean(b));
        }
        if value.is::<NaiveDateTime>() {
            return Ok(Value::DateTime(value.cast::<NaiveDateTime>()));
        }
        if value.is::<Value>() {
            return Ok(value.cast::<Value>());
        }
        let type_name = value.type_name().to_string();
        value
            .into_string()
            .map(Value::Text)
            .map_err(|_| EvalError::Unrepresentable(type_name))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::Text(s) => f.write_str(s),
            Value::Boolean(b) => f.write_str(if *b { "TRUE" } else { "FALSE" }),
            Value::DateTime(dt) if dt.time() == NaiveTime::MIN => {
                write!(f, "{}", dt.format("%Y-%m-%d"))
            }
            Value::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            Value::Error(tag) => f.write_str(tag),
        }
    }
}

fn coercion(value: &str, target: &'static str) -> EvalError {
    EvalError::TypeCoercion {
        context: "value".to_string(),
        value: value.to_string(),
        target,
    }
}

/// Parse a date or date-time in one of the accepted layouts.
/// Bare dates resolve to midnight.
pub fn parse_datetime(input: &str) -> Option<NaiveDateTime> {
    let input = input.trim();
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(input, format) {
            return Some(dt);
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(input, format) {
            return Some(date.and_time(NaiveTime::MIN));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_literal_infers_kind() {
        assert_eq!(Value::from_literal("42"), Value::Number(42.0));
        assert_eq!(Value::from_literal(" -1.5 "), Value::Number(-1.5));
        assert_eq!(Value::from_literal("true"), Value::Boolean(true));
        assert_eq!(Value::from_literal("hello"), Value::Text("hello".into()));
        assert_eq!(Value::from_literal("\"42\""), Value::Text("42".into()));
        assert_eq!(Value::from_literal("2024-02-29").kind(), ValueKind::DateTime);
        assert_eq!(Value::from_literal("NaN"), Value::Text("NaN".into()));
    }

    #[test]
    fn test_to_number_coercion() {
        assert_eq!(Value::Boolean(true).to_number(), Ok(1.0));
        assert_eq!(Value::Text(" 2.5 ".into()).to_number(), Ok(2.5));
        assert_eq!(Value::Text(String::new()).to_number(), Ok(0.0));
        let err = Value::Text("abc".into()).to_number().unwrap_err();
        assert_eq!(err.tag(), "#VALUE!");
    }

    #[test]
    fn test_error_value_propagates_tag() {
        let err = Value::Error("#DIV/0!".into()).to_number().unwrap_err();
        assert_eq!(err.tag(), "#DIV/0!");
    }

    #[test]
    fn test_datetime_display() {
        let midnight = parse_datetime("2024-03-01").unwrap();
        assert_eq!(Value::DateTime(midnight).to_string(), "2024-03-01");
        let dt = parse_datetime("2024-03-01 13:45:00").unwrap();
        assert_eq!(Value::DateTime(dt).to_string(), "2024-03-01 13:45:00");
    }

    #[test]
    fn test_dynamic_round_trip() {
        for value in [
            Value::Number(2.5),
            Value::Text("x".into()),
            Value::Boolean(false),
            Value::DateTime(parse_datetime("2020-01-02").unwrap()),
        ] {
            assert_eq!(Value::from_dynamic(value.to_dynamic()).unwrap(), value);
        }
        assert_eq!(
            Value::from_dynamic(Dynamic::from_int(3)).unwrap(),
            Value::Number(3.0)
        );
        assert_eq!(Value::from_dynamic(Dynamic::from(Blank)).unwrap(), Value::default());
    }
}
