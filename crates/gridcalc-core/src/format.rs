use chrono::NaiveDateTime;
use chrono::format::{Item, StrftimeItems};

use gridcalc_engine::engine::{Value, format_number};

use crate::cell::{CellFormat, NumberFormat, StyleFlags};

/// Render a computed value under a cell's formatting.
pub fn display_value(value: &Value, format: &CellFormat) -> String {
    let text = match value {
        Value::Number(n) if n.is_finite() => match format.number_format {
            NumberFormat::Number => fixed(*n, format),
            NumberFormat::Financial => {
                let body = fixed(n.abs(), format);
                if *n < 0.0 {
                    format!("-{}{}", format.currency_sign, body)
                } else {
                    format!("{}{}", format.currency_sign, body)
                }
            }
            NumberFormat::General | NumberFormat::DateTime => format_number(*n),
        },
        Value::DateTime(dt) if format.datetime_pattern != "auto" => {
            pattern(dt, &format.datetime_pattern).unwrap_or_else(|| value.to_string())
        }
        other => other.to_string(),
    };
    if format.flags.contains(StyleFlags::ALL_CAPS) {
        text.to_uppercase()
    } else {
        text
    }
}

fn pattern(dt: &NaiveDateTime, pattern: &str) -> Option<String> {
    let items: Vec<Item> = StrftimeItems::new(pattern).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return None;
    }
    Some(dt.format_with_items(items.into_iter()).to_string())
}

/// Fixed decimals with digit grouping and the cell's separators.
fn fixed(n: f64, format: &CellFormat) -> String {
    let rendered = format!("{:.*}", usize::from(format.decimal_places), n);
    let (sign, unsigned) = match rendered.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", rendered.as_str()),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(format.thousands_separator);
        }
        grouped.push(c);
    }

    match frac_part {
        Some(frac) => format!("{sign}{grouped}{}{frac}", format.decimal_separator),
        None => format!("{sign}{grouped}"),
    }
}
