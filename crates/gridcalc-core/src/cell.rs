//! Cell data structures.
//!
//! - [`Cell`] - raw input, computed value and display text, formatting,
//!   validation rule, note and the cell's own dependency list
//! - [`CellFormat`] - everything that controls how a value is displayed
//! - [`StyleFlags`] - bold/italic/underline/... bits, plus the formula marker

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use gridcalc_engine::engine::{CellRef, Value, ValueKind};

use crate::format::display_value;
use crate::validation::ValidationRule;

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct StyleFlags: u8 {
        const BOLD = 1;
        const ITALIC = 1 << 1;
        const UNDERLINE = 1 << 2;
        const STRIKETHROUGH = 1 << 3;
        const ALL_CAPS = 1 << 4;
        /// Set while the raw input is a formula.
        const FORMULA = 1 << 5;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const WHITE: Rgb = Rgb(255, 255, 255);
    pub const BLACK: Rgb = Rgb(0, 0, 0);
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NumberFormat {
    #[default]
    General,
    Number,
    Financial,
    DateTime,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CellFormat {
    pub align: Alignment,
    pub number_format: NumberFormat,
    pub decimal_places: u8,
    pub thousands_separator: char,
    pub decimal_separator: char,
    pub currency_sign: char,
    /// strftime pattern, or `auto` for the value's natural rendering.
    pub datetime_pattern: String,
    pub foreground: Rgb,
    pub background: Rgb,
    pub flags: StyleFlags,
}

impl Default for CellFormat {
    fn default() -> Self {
        CellFormat {
            align: Alignment::Left,
            number_format: NumberFormat::General,
            decimal_places: 2,
            thousands_separator: ',',
            decimal_separator: '.',
            currency_sign: '$',
            datetime_pattern: "auto".to_string(),
            foreground: Rgb::WHITE,
            background: Rgb::BLACK,
            flags: StyleFlags::empty(),
        }
    }
}

impl CellFormat {
    pub fn has_default_colors(&self) -> bool {
        self.foreground == Rgb::WHITE && self.background == Rgb::BLACK
    }

    /// Strip grouping and currency characters so `$1,234.5` parses as a number.
    pub fn normalize_numeric_input(&self, input: &str) -> String {
        input
            .trim()
            .chars()
            .filter(|c| *c != self.thousands_separator && *c != self.currency_sign)
            .map(|c| if c == self.decimal_separator { '.' } else { c })
            .collect()
    }

    /// Interpret literal input under this format.
    ///
    /// Number and financial cells accept grouped or currency-marked input.
    pub fn parse_literal(&self, input: &str) -> Value {
        if matches!(
            self.number_format,
            NumberFormat::Number | NumberFormat::Financial
        ) && let Ok(n) = self.normalize_numeric_input(input).parse::<f64>()
        {
            return Value::Number(n);
        }
        Value::from_literal(input)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    pub row: u32,
    pub col: u32,
    raw: Option<String>,
    pub value: Value,
    pub display: String,
    pub format: CellFormat,
    pub validation: Option<ValidationRule>,
    pub note: Option<String>,
    /// Cells referenced by this cell's formula, row-major and deduplicated.
    pub depends_on: Vec<CellRef>,
}

impl Cell {
    pub fn new(cell: CellRef) -> Cell {
        Cell {
            row: cell.row,
            col: cell.col,
            raw: None,
            value: Value::default(),
            display: String::new(),
            format: CellFormat::default(),
            validation: None,
            note: None,
            depends_on: Vec::new(),
        }
    }

    /// A cell holding `raw` input with default formatting.
    pub fn with_raw(cell: CellRef, raw: &str) -> Cell {
        let mut c = Cell::new(cell);
        c.set_raw(raw);
        c
    }

    pub fn cell_ref(&self) -> CellRef {
        CellRef::new(self.row, self.col)
    }

    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }

    /// Replace the raw input, keeping the formula marker in sync.
    /// Whitespace-only input clears the cell's content.
    pub fn set_raw(&mut self, raw: &str) {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            self.raw = None;
        } else {
            self.raw = Some(trimmed.to_string());
        }
        self.format.flags.set(StyleFlags::FORMULA, self.is_formula());
    }

    pub fn is_formula(&self) -> bool {
        self.raw.as_deref().is_some_and(|r| r.starts_with('='))
    }

    /// Formula text after the leading `=`.
    pub fn formula(&self) -> Option<&str> {
        self.raw.as_deref()?.strip_prefix('=')
    }

    /// Recompute value and display text from literal raw input.
    pub fn refresh_literal(&mut self) {
        self.value = self
            .raw
            .as_deref()
            .map(|raw| self.format.parse_literal(raw))
            .unwrap_or_default();
        self.display = display_value(&self.value, &self.format);
    }

    pub fn kind(&self) -> ValueKind {
        self.value.kind()
    }

    /// True when nothing about the cell differs from an untouched position.
    /// Only such cells may be evicted.
    pub fn is_empty(&self) -> bool {
        self.raw.is_none()
            && !self.is_formula()
            && self.note.is_none()
            && self.validation.is_none()
            && self.format.flags.is_empty()
            && self.format.has_default_colors()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_raw_tracks_formula_flag() {
        let mut cell = Cell::new(CellRef::new(1, 1));
        cell.set_raw("=A2+1");
        assert!(cell.is_formula());
        assert!(cell.format.flags.contains(StyleFlags::FORMULA));
        assert_eq!(cell.formula(), Some("A2+1"));

        cell.set_raw("  ");
        assert_eq!(cell.raw(), None);
        assert!(!cell.format.flags.contains(StyleFlags::FORMULA));
        assert!(cell.is_empty());
    }

    #[test]
    fn test_is_empty_considers_every_attribute() {
        let at = CellRef::new(3, 4);
        let mut cell = Cell::new(at);
        assert!(cell.is_empty());

        cell.note = Some("remember".into());
        assert!(!cell.is_empty());

        let mut cell = Cell::new(at);
        cell.format.flags.insert(StyleFlags::BOLD);
        assert!(!cell.is_empty());

        let mut cell = Cell::new(at);
        cell.format.background = Rgb(10, 10, 10);
        assert!(!cell.is_empty());

        let mut cell = Cell::new(at);
        cell.format.align = Alignment::Right;
        assert!(cell.is_empty());
    }

    #[test]
    fn test_parse_literal_honours_number_formats() {
        let mut format = CellFormat {
            number_format: NumberFormat::Financial,
            ..CellFormat::default()
        };
        assert_eq!(format.parse_literal("$1,234.50"), Value::Number(1234.5));

        format.number_format = NumberFormat::General;
        assert_eq!(
            format.parse_literal("$1,234.50"),
            Value::Text("$1,234.50".into())
        );
    }
}
