//! Cell reference parsing and formatting.
//!
//! Provides bidirectional conversion between spreadsheet-style cell references
//! (e.g., "A1", "B2", "AA100") and 1-based row/column coordinates. Row and
//! column 0 are reserved for headers and never address a cell.
//!
//! # Examples
//!
//! ```
//! use gridcalc_engine::engine::CellRef;
//!
//! let cell = CellRef::from_str("B3").unwrap();
//! assert_eq!(cell.col, 2);
//! assert_eq!(cell.row, 3);
//! assert_eq!(cell.to_string(), "B3");
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// A reference to a cell by row and column (both 1-based).
///
/// Ordering is row-major, which is the order snapshots and reports use.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct CellRef {
    pub row: u32,
    pub col: u32,
}

fn a1_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?<letters>[A-Za-z]+)(?<numbers>[0-9]+)$").expect("valid A1 regex")
    })
}

impl CellRef {
    pub fn new(row: u32, col: u32) -> CellRef {
        CellRef { row, col }
    }

    /// Parse a cell reference from spreadsheet notation (e.g., "A1", "b2", "AA10").
    /// Returns None if the input is invalid, including row 0 ("A0").
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(name: &str) -> Option<CellRef> {
        Self::parse_a1(name)
    }

    fn parse_a1(name: &str) -> Option<CellRef> {
        let caps = a1_re().captures(name.trim())?;
        let col = Self::letters_to_col(&caps["letters"])?;
        let row = caps["numbers"].parse::<u32>().ok()?;
        if row == 0 {
            return None;
        }
        Some(CellRef::new(row, col))
    }

    /// Convert spreadsheet-style letters to a 1-based column (A -> 1, AA -> 27).
    pub fn letters_to_col(letters: &str) -> Option<u32> {
        if letters.is_empty() {
            return None;
        }
        let mut acc = 0u32;
        for c in letters.to_ascii_uppercase().bytes() {
            if !c.is_ascii_uppercase() {
                return None;
            }
            let digit = u32::from(c - b'A') + 1;
            acc = acc.checked_mul(26)?.checked_add(digit)?;
        }
        Some(acc)
    }

    /// Convert a 1-based column to spreadsheet-style letters (1 -> A, 26 -> Z, 27 -> AA).
    /// Column 0 (the header column) has no letters.
    pub fn col_to_letters(col: u32) -> String {
        let mut result = String::new();
        let mut n = u64::from(col);
        while n > 0 {
            n -= 1;
            result.insert(0, (b'A' + (n % 26) as u8) as char);
            n /= 26;
        }
        result
    }

    /// True when both coordinates name a real cell rather than a header.
    pub fn is_valid(&self) -> bool {
        self.row >= 1 && self.col >= 1
    }
}

impl std::str::FromStr for CellRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_a1(s).ok_or_else(|| format!("Invalid cell reference: {}", s))
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", CellRef::col_to_letters(self.col), self.row)
    }
}

#[cfg(test)]
mod tests {
    use super::CellRef;

    #[test]
    fn test_parse_basic_refs() {
        assert_eq!(CellRef::from_str("A1"), Some(CellRef::new(1, 1)));
        assert_eq!(CellRef::from_str("b12"), Some(CellRef::new(12, 2)));
        assert_eq!(CellRef::from_str("AA100"), Some(CellRef::new(100, 27)));
        assert_eq!(CellRef::from_str("ZZ1"), Some(CellRef::new(1, 702)));
    }

    #[test]
    fn test_row_zero_is_not_a_cell() {
        assert!(CellRef::from_str("A0").is_none());
        assert!(CellRef::from_str("1A").is_none());
        assert!(CellRef::from_str("").is_none());
    }

    #[test]
    fn test_parse_a1_overflow_returns_none() {
        let huge = format!("{}1", "Z".repeat(40));
        assert!(CellRef::from_str(&huge).is_none());
        assert!(CellRef::from_str("A99999999999").is_none());
    }

    #[test]
    fn test_col_to_letters() {
        assert_eq!(CellRef::col_to_letters(1), "A");
        assert_eq!(CellRef::col_to_letters(26), "Z");
        assert_eq!(CellRef::col_to_letters(27), "AA");
        assert_eq!(CellRef::col_to_letters(702), "ZZ");
        assert_eq!(CellRef::col_to_letters(703), "AAA");
        assert_eq!(CellRef::col_to_letters(0), "");
    }

    #[test]
    fn test_col_to_letters_handles_max() {
        let letters = CellRef::col_to_letters(u32::MAX);
        assert!(!letters.is_empty());
        assert_eq!(CellRef::letters_to_col(&letters), Some(u32::MAX));
    }

    #[test]
    fn test_display_and_ordering() {
        let mut refs = vec![CellRef::new(2, 1), CellRef::new(1, 3), CellRef::new(1, 2)];
        refs.sort();
        let names: Vec<String> = refs.iter().map(|r| r.to_string()).collect();
        assert_eq!(names, vec!["B1", "C1", "A2"]);
    }
}
