//! Builtin spreadsheet functions.
//!
//! Every function is described once in [`BUILTINS`] (name, category, arity)
//! and evaluated by [`call`], which checks the argument count before running
//! the function. Formulas reach these functions through a single Rhai
//! dispatcher registered by [`register_builtins`].

use chrono::{Datelike, Duration, Local, NaiveDate, NaiveTime, Timelike};
use rand::Rng;
use rhai::{Array, Dynamic, Engine, EvalAltResult, ImmutableString, Position};
use std::f64::consts::{E, FRAC_PI_2, PI};

use crate::engine::{Arity, DISPATCH_FN, EvalError, Value};

/// Denominators smaller than this are treated as zero by division-like functions.
pub const DIVISION_EPSILON: f64 = 1e-10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Category {
    Trigonometric,
    InverseTrigonometric,
    Hyperbolic,
    Logarithmic,
    Power,
    Rounding,
    Aggregate,
    Logical,
    Text,
    DateTime,
    TypeTest,
    Bitwise,
    Special,
    Random,
    Constant,
}

#[derive(Clone, Copy, Debug)]
pub struct Builtin {
    pub name: &'static str,
    pub category: Category,
    pub arity: Arity,
    pub description: &'static str,
}

const fn builtin(
    name: &'static str,
    category: Category,
    arity: Arity,
    description: &'static str,
) -> Builtin {
    Builtin {
        name,
        category,
        arity,
        description,
    }
}

use Category::*;

const ONE: Arity = Arity::exactly(1);
const TWO: Arity = Arity::exactly(2);
const THREE: Arity = Arity::exactly(3);
const NONE: Arity = Arity::exactly(0);
const VARIADIC: Arity = Arity::at_least(1);

pub const BUILTINS: &[Builtin] = &[
    builtin("SIN", Trigonometric, ONE, "Sine of an angle in radians"),
    builtin("COS", Trigonometric, ONE, "Cosine of an angle in radians"),
    builtin("TAN", Trigonometric, ONE, "Tangent of an angle in radians"),
    builtin("CTAN", Trigonometric, ONE, "Cotangent of an angle in radians"),
    builtin("SEC", Trigonometric, ONE, "Secant of an angle in radians"),
    builtin("CSEC", Trigonometric, ONE, "Cosecant of an angle in radians"),
    builtin("RAD", Trigonometric, ONE, "Degrees to radians"),
    builtin("DEG", Trigonometric, ONE, "Radians to degrees"),
    builtin("ASIN", InverseTrigonometric, ONE, "Arcsine"),
    builtin("ACOS", InverseTrigonometric, ONE, "Arccosine"),
    builtin("ATAN", InverseTrigonometric, ONE, "Arctangent"),
    builtin("ATAN2", InverseTrigonometric, TWO, "Arctangent of y/x using both signs"),
    builtin("ACTAN", InverseTrigonometric, ONE, "Arccotangent"),
    builtin("ASEC", InverseTrigonometric, ONE, "Arcsecant"),
    builtin("ACSC", InverseTrigonometric, ONE, "Arccosecant"),
    builtin("SINH", Hyperbolic, ONE, "Hyperbolic sine"),
    builtin("COSH", Hyperbolic, ONE, "Hyperbolic cosine"),
    builtin("TANH", Hyperbolic, ONE, "Hyperbolic tangent"),
    builtin("CTANH", Hyperbolic, ONE, "Hyperbolic cotangent"),
    builtin("SECH", Hyperbolic, ONE, "Hyperbolic secant"),
    builtin("CSCH", Hyperbolic, ONE, "Hyperbolic cosecant"),
    builtin("ASINH", Hyperbolic, ONE, "Inverse hyperbolic sine"),
    builtin("ACOSH", Hyperbolic, ONE, "Inverse hyperbolic cosine"),
    builtin("ATANH", Hyperbolic, ONE, "Inverse hyperbolic tangent"),
    builtin("ASECH", Hyperbolic, ONE, "Inverse hyperbolic secant"),
    builtin("ACSCH", Hyperbolic, ONE, "Inverse hyperbolic cosecant"),
    builtin("ACOTH", Hyperbolic, ONE, "Inverse hyperbolic cotangent"),
    builtin("EXP", Logarithmic, ONE, "e raised to a power"),
    builtin("LOG", Logarithmic, ONE, "Natural logarithm"),
    builtin("LOG10", Logarithmic, ONE, "Base-10 logarithm"),
    builtin("LOG2", Logarithmic, ONE, "Base-2 logarithm"),
    builtin("SQRT", Power, ONE, "Square root"),
    builtin("CBRT", Power, ONE, "Cube root"),
    builtin("POW", Power, TWO, "Base raised to an exponent"),
    builtin("HYPOT", Power, TWO, "Euclidean norm of two values"),
    builtin("ABS", Rounding, ONE, "Absolute value"),
    builtin("CEIL", Rounding, ONE, "Round up to an integer"),
    builtin("FLOOR", Rounding, ONE, "Round down to an integer"),
    builtin("ROUND", Rounding, Arity::between(1, 2), "Round to optional decimal places"),
    builtin("ROUNDTO", Rounding, TWO, "Round to decimal places"),
    builtin("TRUNC", Rounding, ONE, "Drop the fractional part"),
    builtin("SIGN", Rounding, ONE, "Sign of a number (-1, 0, 1)"),
    builtin("CLAMP", Rounding, THREE, "Constrain a value to [min, max]"),
    builtin("LERP", Rounding, THREE, "Linear interpolation between a and b"),
    builtin("MOD", Rounding, TWO, "Remainder with the sign of the dividend"),
    builtin("REMAINDER", Rounding, TWO, "IEEE remainder"),
    builtin("MIN", Aggregate, VARIADIC, "Smallest argument"),
    builtin("MAX", Aggregate, VARIADIC, "Largest argument"),
    builtin("AVG", Aggregate, VARIADIC, "Arithmetic mean"),
    builtin("SUM", Aggregate, VARIADIC, "Sum of arguments"),
    builtin("PRODUCT", Aggregate, VARIADIC, "Product of arguments"),
    builtin("COUNT", Aggregate, VARIADIC, "Number of numeric arguments"),
    builtin("IF", Logical, THREE, "Choose between two values"),
    builtin("IFS", Logical, Arity::at_least(2), "First value whose condition holds"),
    builtin("AND", Logical, VARIADIC, "True if every argument is true"),
    builtin("OR", Logical, VARIADIC, "True if any argument is true"),
    builtin("NOT", Logical, ONE, "Logical negation"),
    builtin("XOR", Logical, VARIADIC, "True if an odd number of arguments are true"),
    builtin("CHOOSE", Logical, Arity::at_least(2), "Pick a value by 1-based index"),
    builtin("LEFT", Text, TWO, "Leading characters"),
    builtin("RIGHT", Text, TWO, "Trailing characters"),
    builtin("MID", Text, THREE, "Substring from a 1-based position"),
    builtin("UPPER", Text, ONE, "Upper case"),
    builtin("LOWER", Text, ONE, "Lower case"),
    builtin("PROPER", Text, ONE, "Capitalise each word"),
    builtin("TRIM", Text, ONE, "Strip surrounding whitespace"),
    builtin("FIND", Text, Arity::between(2, 3), "1-based position of a substring, or -1"),
    builtin("SUBSTITUTE", Text, Arity::between(3, 4), "Replace occurrences of a substring"),
    builtin("LEN", Text, ONE, "Number of characters"),
    builtin("CONCAT", Text, VARIADIC, "Join arguments as text"),
    builtin("CONTAINS", Text, TWO, "True if text contains a substring"),
    builtin("NOW", DateTime, NONE, "Current local date and time"),
    builtin("TODAY", DateTime, NONE, "Current local date"),
    builtin("DATE", DateTime, THREE, "Date from year, month and day"),
    builtin("TIME", DateTime, Arity::between(2, 3), "Time of day as HH:MM:SS"),
    builtin("YEAR", DateTime, ONE, "Year of a date"),
    builtin("MONTH", DateTime, ONE, "Month of a date (1-12)"),
    builtin("DAY", DateTime, ONE, "Day of the month"),
    builtin("HOUR", DateTime, ONE, "Hour of a date-time"),
    builtin("MINUTE", DateTime, ONE, "Minute of a date-time"),
    builtin("SECOND", DateTime, ONE, "Second of a date-time"),
    builtin("WEEKDAY", DateTime, ONE, "Day of the week, Sunday = 1"),
    builtin("DATEDIFF", DateTime, TWO, "Days from the first date to the second"),
    builtin("DATEADD", DateTime, TWO, "Date shifted by whole days"),
    builtin("ISNUMBER", TypeTest, ONE, "True for numbers"),
    builtin("ISTEXT", TypeTest, ONE, "True for text"),
    builtin("ISBLANK", TypeTest, ONE, "True for empty text"),
    builtin("BITAND", Bitwise, TWO, "Bitwise AND"),
    builtin("BITOR", Bitwise, TWO, "Bitwise OR"),
    builtin("BITXOR", Bitwise, TWO, "Bitwise XOR"),
    builtin("BITSHIFTLEFT", Bitwise, TWO, "Shift bits left"),
    builtin("BITSHIFTRIGHT", Bitwise, TWO, "Shift bits right"),
    builtin("FACTORIAL", Special, ONE, "n!"),
    builtin("GCD", Special, TWO, "Greatest common divisor"),
    builtin("LCM", Special, TWO, "Least common multiple"),
    builtin("ERF", Special, ONE, "Error function"),
    builtin("ERFC", Special, ONE, "Complementary error function"),
    builtin("GAMMA", Special, ONE, "Gamma function"),
    builtin("J0", Special, ONE, "Bessel function of the first kind, order 0"),
    builtin("J1", Special, ONE, "Bessel function of the first kind, order 1"),
    builtin("YN", Special, TWO, "Bessel function of the second kind, order n"),
    builtin("RAND", Random, NONE, "Uniform random number in [0, 1)"),
    builtin("RANDBETWEEN", Random, TWO, "Random integer in [low, high]"),
    builtin("PI", Constant, NONE, "π"),
    builtin("E", Constant, NONE, "Euler's number"),
    builtin("PHI", Constant, NONE, "Golden ratio"),
    builtin("INF", Constant, NONE, "Positive infinity"),
    builtin("NAN", Constant, NONE, "Not a number"),
];

/// Find a builtin by name, ignoring case.
pub fn lookup(name: &str) -> Option<&'static Builtin> {
    BUILTINS.iter().find(|b| b.name.eq_ignore_ascii_case(name))
}

/// Evaluate a builtin after checking its arity.
pub fn call(name: &str, args: &[Value]) -> Result<Value, EvalError> {
    let builtin =
        lookup(name).ok_or_else(|| EvalError::UnknownFunction(name.to_ascii_uppercase()))?;
    builtin.arity.check(builtin.name, args.len())?;
    if let Some((index, Value::Error(tag))) = args.iter().enumerate().find(|(_, v)| v.is_error()) {
        return Err(EvalError::Propagated {
            reference: format!("{} argument {}", builtin.name, index + 1),
            tag: tag.clone(),
        });
    }
    dispatch(builtin.name, args)
}

/// Register the formula dispatcher with a Rhai engine.
pub fn register_builtins(engine: &mut Engine) {
    engine.register_fn(
        DISPATCH_FN,
        |name: ImmutableString, args: Array| -> Result<Dynamic, Box<EvalAltResult>> {
            let values = args
                .into_iter()
                .map(Value::from_dynamic)
                .collect::<Result<Vec<_>, _>>()
                .map_err(runtime_error)?;
            call(&name, &values)
                .map(|value| value.to_dynamic())
                .map_err(runtime_error)
        },
    );
}

fn runtime_error(err: EvalError) -> Box<EvalAltResult> {
    EvalAltResult::ErrorRuntime(Dynamic::from(err), Position::NONE).into()
}

fn dispatch(f: &'static str, args: &[Value]) -> Result<Value, EvalError> {
    match f {
        "SIN" => unary(f, args, f64::sin),
        "COS" => unary(f, args, f64::cos),
        "TAN" => unary(f, args, f64::tan),
        "CTAN" => reciprocal(f, args, f64::tan),
        "SEC" => reciprocal(f, args, f64::cos),
        "CSEC" => reciprocal(f, args, f64::sin),
        "RAD" => unary(f, args, f64::to_radians),
        "DEG" => unary(f, args, f64::to_degrees),
        "ASIN" => unary(f, args, f64::asin),
        "ACOS" => unary(f, args, f64::acos),
        "ATAN" => unary(f, args, f64::atan),
        "ATAN2" => binary(f, args, f64::atan2),
        "ACTAN" => unary(f, args, |x| FRAC_PI_2 - x.atan()),
        "ASEC" => unary(f, args, |x| (1.0 / x).acos()),
        "ACSC" => unary(f, args, |x| (1.0 / x).asin()),
        "SINH" => unary(f, args, f64::sinh),
        "COSH" => unary(f, args, f64::cosh),
        "TANH" => unary(f, args, f64::tanh),
        "CTANH" => reciprocal(f, args, f64::tanh),
        "SECH" => reciprocal(f, args, f64::cosh),
        "CSCH" => reciprocal(f, args, f64::sinh),
        "ASINH" => unary(f, args, f64::asinh),
        "ACOSH" => unary(f, args, f64::acosh),
        "ATANH" => unary(f, args, f64::atanh),
        "ASECH" => unary(f, args, |x| (1.0 / x).acosh()),
        "ACSCH" => unary(f, args, |x| (1.0 / x).asinh()),
        "ACOTH" => unary(f, args, |x| 0.5 * ((x + 1.0) / (x - 1.0)).ln()),
        "EXP" => unary(f, args, f64::exp),
        "LOG" => unary(f, args, f64::ln),
        "LOG10" => unary(f, args, f64::log10),
        "LOG2" => unary(f, args, f64::log2),
        "SQRT" => unary(f, args, f64::sqrt),
        "CBRT" => unary(f, args, f64::cbrt),
        "POW" => binary(f, args, f64::powf),
        "HYPOT" => binary(f, args, f64::hypot),
        "ABS" => unary(f, args, f64::abs),
        "CEIL" => unary(f, args, f64::ceil),
        "FLOOR" => unary(f, args, f64::floor),
        "ROUND" => {
            let digits = if args.len() > 1 { num(f, args, 1)? } else { 0.0 };
            Ok(Value::Number(round_to(num(f, args, 0)?, digits)))
        }
        "ROUNDTO" => binary(f, args, round_to),
        "TRUNC" => unary(f, args, f64::trunc),
        "SIGN" => unary(f, args, |x| {
            if x > 0.0 {
                1.0
            } else if x < 0.0 {
                -1.0
            } else {
                0.0
            }
        }),
        "CLAMP" => {
            let (x, lo, hi) = (num(f, args, 0)?, num(f, args, 1)?, num(f, args, 2)?);
            if !(lo <= hi) {
                return Err(out_of_range(f, "minimum must not exceed maximum"));
            }
            Ok(Value::Number(x.max(lo).min(hi)))
        }
        "LERP" => {
            let (a, b, t) = (num(f, args, 0)?, num(f, args, 1)?, num(f, args, 2)?);
            Ok(Value::Number(a + (b - a) * t))
        }
        "MOD" => {
            let (x, y) = (num(f, args, 0)?, nonzero(f, num(f, args, 1)?)?);
            Ok(Value::Number(x % y))
        }
        "REMAINDER" => {
            let (x, y) = (num(f, args, 0)?, nonzero(f, num(f, args, 1)?)?);
            Ok(Value::Number(x - (x / y).round_ties_even() * y))
        }
        "MIN" => Ok(Value::Number(numbers(f, args)?.into_iter().fold(f64::INFINITY, f64::min))),
        "MAX" => Ok(Value::Number(
            numbers(f, args)?.into_iter().fold(f64::NEG_INFINITY, f64::max),
        )),
        "SUM" => Ok(Value::Number(numbers(f, args)?.into_iter().sum())),
        "PRODUCT" => Ok(Value::Number(numbers(f, args)?.into_iter().product())),
        "AVG" => {
            let values = numbers(f, args)?;
            Ok(Value::Number(values.iter().sum::<f64>() / values.len() as f64))
        }
        "COUNT" => Ok(Value::Number(
            args.iter().filter(|v| matches!(v, Value::Number(_))).count() as f64,
        )),
        "IF" => Ok(if boolean(f, args, 0)? { args[1].clone() } else { args[2].clone() }),
        "IFS" => ifs(args),
        "AND" => Ok(Value::Boolean(booleans(f, args)?.into_iter().all(|b| b))),
        "OR" => Ok(Value::Boolean(booleans(f, args)?.into_iter().any(|b| b))),
        "NOT" => Ok(Value::Boolean(!boolean(f, args, 0)?)),
        "XOR" => Ok(Value::Boolean(
            booleans(f, args)?.into_iter().filter(|b| *b).count() % 2 == 1,
        )),
        "CHOOSE" => {
            let index = int(f, args, 0)?;
            if index < 1 || index as usize >= args.len() {
                return Err(out_of_range(f, "index out of range"));
            }
            Ok(args[index as usize].clone())
        }
        "LEFT" => {
            let n = count(f, args, 1)?;
            Ok(Value::Text(args[0].to_string().chars().take(n).collect()))
        }
        "RIGHT" => {
            let text = args[0].to_string();
            let n = count(f, args, 1)?;
            let len = text.chars().count();
            Ok(Value::Text(text.chars().skip(len.saturating_sub(n)).collect()))
        }
        "MID" => {
            let start = int(f, args, 1)?.max(1) as usize;
            let n = count(f, args, 2)?;
            Ok(Value::Text(
                args[0].to_string().chars().skip(start - 1).take(n).collect(),
            ))
        }
        "UPPER" => Ok(Value::Text(args[0].to_string().to_uppercase())),
        "LOWER" => Ok(Value::Text(args[0].to_string().to_lowercase())),
        "PROPER" => Ok(Value::Text(proper_case(&args[0].to_string()))),
        "TRIM" => Ok(Value::Text(args[0].to_string().trim().to_string())),
        "FIND" => find(args),
        "SUBSTITUTE" => substitute(args),
        "LEN" => Ok(Value::Number(args[0].to_string().chars().count() as f64)),
        "CONCAT" => Ok(Value::Text(args.iter().map(Value::to_string).collect())),
        "CONTAINS" => Ok(Value::Boolean(
            args[0].to_string().contains(&args[1].to_string()),
        )),
        "NOW" => Ok(Value::DateTime(Local::now().naive_local())),
        "TODAY" => Ok(Value::DateTime(
            Local::now().date_naive().and_time(NaiveTime::MIN),
        )),
        "DATE" => {
            let (y, m, d) = (int(f, args, 0)?, int(f, args, 1)?, int(f, args, 2)?);
            let date = i32::try_from(y)
                .ok()
                .zip(u32::try_from(m).ok())
                .zip(u32::try_from(d).ok())
                .and_then(|((y, m), d)| NaiveDate::from_ymd_opt(y, m, d))
                .ok_or_else(|| out_of_range(f, &format!("invalid date {y}-{m}-{d}")))?;
            Ok(Value::DateTime(date.and_time(NaiveTime::MIN)))
        }
        "TIME" => {
            let h = int(f, args, 0)?;
            let m = int(f, args, 1)?;
            let s = if args.len() > 2 { int(f, args, 2)? } else { 0 };
            let time = u32::try_from(h)
                .ok()
                .zip(u32::try_from(m).ok())
                .zip(u32::try_from(s).ok())
                .and_then(|((h, m), s)| NaiveTime::from_hms_opt(h, m, s))
                .ok_or_else(|| out_of_range(f, &format!("invalid time {h}:{m}:{s}")))?;
            Ok(Value::Text(time.format("%H:%M:%S").to_string()))
        }
        "YEAR" => date_part(f, args, |dt| f64::from(dt.year())),
        "MONTH" => date_part(f, args, |dt| f64::from(dt.month())),
        "DAY" => date_part(f, args, |dt| f64::from(dt.day())),
        "HOUR" => date_part(f, args, |dt| f64::from(dt.hour())),
        "MINUTE" => date_part(f, args, |dt| f64::from(dt.minute())),
        "SECOND" => date_part(f, args, |dt| f64::from(dt.second())),
        "WEEKDAY" => date_part(f, args, |dt| f64::from(dt.weekday().num_days_from_sunday() + 1)),
        "DATEDIFF" => {
            let from = date(f, args, 0)?;
            let to = date(f, args, 1)?;
            Ok(Value::Number((to - from).num_seconds() as f64 / 86_400.0))
        }
        "DATEADD" => {
            let start = date(f, args, 0)?;
            let shifted = Duration::try_days(int(f, args, 1)?)
                .and_then(|days| start.checked_add_signed(days))
                .ok_or_else(|| out_of_range(f, "date out of range"))?;
            Ok(Value::DateTime(shifted))
        }
        "ISNUMBER" => Ok(Value::Boolean(matches!(args[0], Value::Number(_)))),
        "ISTEXT" => Ok(Value::Boolean(matches!(args[0], Value::Text(_)))),
        "ISBLANK" => Ok(Value::Boolean(args[0].is_blank())),
        "BITAND" => Ok(Value::Number((int(f, args, 0)? & int(f, args, 1)?) as f64)),
        "BITOR" => Ok(Value::Number((int(f, args, 0)? | int(f, args, 1)?) as f64)),
        "BITXOR" => Ok(Value::Number((int(f, args, 0)? ^ int(f, args, 1)?) as f64)),
        "BITSHIFTLEFT" => {
            let shifted = int(f, args, 0)?.checked_shl(shift_amount(f, args)?);
            Ok(Value::Number(shifted.unwrap_or(0) as f64))
        }
        "BITSHIFTRIGHT" => {
            let shifted = int(f, args, 0)?.checked_shr(shift_amount(f, args)?);
            Ok(Value::Number(shifted.unwrap_or(0) as f64))
        }
        "FACTORIAL" => {
            let n = int(f, args, 0)?;
            if n < 0 {
                return Err(out_of_range(f, "argument must be non-negative"));
            }
            Ok(Value::Number((2..=n.min(171)).fold(1.0, |acc, k| acc * k as f64)))
        }
        "GCD" => Ok(Value::Number(gcd(int(f, args, 0)?, int(f, args, 1)?) as f64)),
        "LCM" => {
            let (a, b) = (int(f, args, 0)?, int(f, args, 1)?);
            if a == 0 || b == 0 {
                return Ok(Value::Number(0.0));
            }
            let lcm = (a / gcd(a, b))
                .checked_mul(b)
                .ok_or_else(|| out_of_range(f, "result overflows"))?;
            Ok(Value::Number(lcm.unsigned_abs() as f64))
        }
        "ERF" => unary(f, args, libm::erf),
        "ERFC" => unary(f, args, libm::erfc),
        "GAMMA" => unary(f, args, libm::tgamma),
        "J0" => unary(f, args, libm::j0),
        "J1" => unary(f, args, libm::j1),
        "YN" => {
            let order = i32::try_from(int(f, args, 0)?)
                .map_err(|_| out_of_range(f, "order out of range"))?;
            Ok(Value::Number(libm::yn(order, num(f, args, 1)?)))
        }
        "RAND" => Ok(Value::Number(rand::thread_rng().gen_range(0.0..1.0))),
        "RANDBETWEEN" => {
            let (lo, hi) = (int(f, args, 0)?, int(f, args, 1)?);
            if lo > hi {
                return Err(out_of_range(f, "low must not exceed high"));
            }
            Ok(Value::Number(rand::thread_rng().gen_range(lo..=hi) as f64))
        }
        "PI" => Ok(Value::Number(PI)),
        "E" => Ok(Value::Number(E)),
        "PHI" => Ok(Value::Number((1.0 + 5f64.sqrt()) / 2.0)),
        "INF" => Ok(Value::Number(f64::INFINITY)),
        "NAN" => Ok(Value::Number(f64::NAN)),
        other => Err(EvalError::UnknownFunction(other.to_string())),
    }
}

fn num(f: &str, args: &[Value], index: usize) -> Result<f64, EvalError> {
    args[index].to_number().map_err(|e| e.in_function(f))
}

fn int(f: &str, args: &[Value], index: usize) -> Result<i64, EvalError> {
    args[index].to_integer().map_err(|e| e.in_function(f))
}

fn count(f: &str, args: &[Value], index: usize) -> Result<usize, EvalError> {
    usize::try_from(int(f, args, index)?)
        .map_err(|_| out_of_range(f, "count must be non-negative"))
}

fn boolean(f: &str, args: &[Value], index: usize) -> Result<bool, EvalError> {
    args[index].to_bool().map_err(|e| e.in_function(f))
}

fn date(f: &str, args: &[Value], index: usize) -> Result<chrono::NaiveDateTime, EvalError> {
    args[index].to_datetime().map_err(|e| e.in_function(f))
}

fn numbers(f: &str, args: &[Value]) -> Result<Vec<f64>, EvalError> {
    (0..args.len()).map(|i| num(f, args, i)).collect()
}

fn booleans(f: &str, args: &[Value]) -> Result<Vec<bool>, EvalError> {
    (0..args.len()).map(|i| boolean(f, args, i)).collect()
}

fn unary(f: &str, args: &[Value], op: impl Fn(f64) -> f64) -> Result<Value, EvalError> {
    Ok(Value::Number(op(num(f, args, 0)?)))
}

fn binary(f: &str, args: &[Value], op: impl Fn(f64, f64) -> f64) -> Result<Value, EvalError> {
    Ok(Value::Number(op(num(f, args, 0)?, num(f, args, 1)?)))
}

/// `1 / denominator(x)`, failing when the denominator vanishes.
fn reciprocal(f: &str, args: &[Value], denominator: fn(f64) -> f64) -> Result<Value, EvalError> {
    let d = nonzero(f, denominator(num(f, args, 0)?))?;
    Ok(Value::Number(1.0 / d))
}

fn nonzero(f: &str, d: f64) -> Result<f64, EvalError> {
    if d.abs() < DIVISION_EPSILON {
        Err(EvalError::Division {
            function: f.to_string(),
            sentinel: if d.is_sign_negative() {
                f64::NEG_INFINITY
            } else {
                f64::INFINITY
            },
        })
    } else {
        Ok(d)
    }
}

fn out_of_range(f: &str, message: &str) -> EvalError {
    EvalError::OutOfRange {
        function: f.to_string(),
        message: message.to_string(),
    }
}

fn round_to(x: f64, digits: f64) -> f64 {
    let scale = 10f64.powi(digits.trunc() as i32);
    (x * scale).round() / scale
}

fn shift_amount(f: &str, args: &[Value]) -> Result<u32, EvalError> {
    u32::try_from(int(f, args, 1)?)
        .ok()
        .filter(|n| *n < 64)
        .ok_or_else(|| out_of_range(f, "shift must be between 0 and 63"))
}

fn gcd(a: i64, b: i64) -> i64 {
    let (mut a, mut b) = (a.unsigned_abs(), b.unsigned_abs());
    while b != 0 {
        (a, b) = (b, a % b);
    }
    i64::try_from(a).unwrap_or(i64::MAX)
}

fn date_part(
    f: &str,
    args: &[Value],
    part: impl Fn(&chrono::NaiveDateTime) -> f64,
) -> Result<Value, EvalError> {
    Ok(Value::Number(part(&date(f, args, 0)?)))
}

/// Condition/value pairs; an odd trailing argument is the fallback.
fn ifs(args: &[Value]) -> Result<Value, EvalError> {
    for pair in args.chunks_exact(2) {
        if pair[0].to_bool().map_err(|e| e.in_function("IFS"))? {
            return Ok(pair[1].clone());
        }
    }
    if args.len() % 2 == 1 {
        return Ok(args[args.len() - 1].clone());
    }
    Err(EvalError::NoMatch {
        function: "IFS".to_string(),
    })
}

fn find(args: &[Value]) -> Result<Value, EvalError> {
    let needle = args[0].to_string();
    let haystack: Vec<char> = args[1].to_string().chars().collect();
    let start = if args.len() > 2 { int("FIND", args, 2)? } else { 1 };
    if start < 1 {
        return Err(out_of_range("FIND", "start position must be >= 1"));
    }
    let start = start as usize - 1;
    if start > haystack.len() {
        return Ok(Value::Number(-1.0));
    }
    let rest: String = haystack[start..].iter().collect();
    Ok(Value::Number(match rest.find(&needle) {
        Some(byte_pos) => (start + rest[..byte_pos].chars().count() + 1) as f64,
        None => -1.0,
    }))
}

fn substitute(args: &[Value]) -> Result<Value, EvalError> {
    let text = args[0].to_string();
    let old = args[1].to_string();
    let new = args[2].to_string();
    if old.is_empty() {
        return Ok(Value::Text(text));
    }
    if args.len() < 4 {
        return Ok(Value::Text(text.replace(&old, &new)));
    }
    let instance = int("SUBSTITUTE", args, 3)?;
    if instance < 1 {
        return Err(out_of_range("SUBSTITUTE", "instance must be >= 1"));
    }
    Ok(Value::Text(
        match text.match_indices(&old).nth(instance as usize - 1) {
            Some((pos, _)) => format!("{}{}{}", &text[..pos], new, &text[pos + old.len()..]),
            None => text,
        },
    ))
}

fn proper_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for c in text.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = !c.is_alphanumeric();
        }
    }
    out
}
