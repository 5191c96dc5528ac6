//! Formula preprocessing and reference transformation.
//!
//! Formula text is evaluated by Rhai, but spreadsheet syntax differs in a few
//! places. This module handles:
//!
//! - **Preprocessing**: `SUM(A1, 2)` → `call_builtin("SUM", [A1, 2.0])`, integer
//!   literals become floats, `TRUE`/`FALSE` become Rhai booleans
//! - **Reference shifting**: adjusting references when rows/columns are
//!   inserted or deleted

use super::cell_ref::CellRef;
use super::deps::{reference_spans, split_segments};

/// Name of the Rhai function every spreadsheet call is routed through.
pub(crate) const DISPATCH_FN: &str = "call_builtin";

/// Marker left in formula text where a reference was deleted.
pub const REF_ERROR: &str = "#REF!";

/// Operation for shifting cell references in formulas. Indices are 1-based.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShiftOperation {
    InsertRow(u32),
    DeleteRow(u32),
    InsertColumn(u32),
    DeleteColumn(u32),
}

/// Where `cell` ends up after `op`, or `None` if its row/column is deleted.
///
/// Rules:
/// - Insert row at R: row >= R becomes row + 1
/// - Delete row at R: row > R becomes row - 1; row == R is removed
/// - Same logic for columns
pub fn shift_cell(cell: CellRef, op: ShiftOperation) -> Option<CellRef> {
    match op {
        ShiftOperation::InsertRow(at) if cell.row >= at => {
            Some(CellRef::new(cell.row.checked_add(1)?, cell.col))
        }
        ShiftOperation::DeleteRow(at) if cell.row == at => None,
        ShiftOperation::DeleteRow(at) if cell.row > at => Some(CellRef::new(cell.row - 1, cell.col)),
        ShiftOperation::InsertColumn(at) if cell.col >= at => {
            Some(CellRef::new(cell.row, cell.col.checked_add(1)?))
        }
        ShiftOperation::DeleteColumn(at) if cell.col == at => None,
        ShiftOperation::DeleteColumn(at) if cell.col > at => {
            Some(CellRef::new(cell.row, cell.col - 1))
        }
        _ => Some(cell),
    }
}

/// Shift cell references in a formula when rows/cols are inserted/deleted.
/// References into a deleted row or column become `#REF!`; references inside
/// string literals and function names are left alone.
pub fn shift_formula_references(formula: &str, op: ShiftOperation) -> String {
    let mut out = String::with_capacity(formula.len());
    let mut last = 0usize;
    for span in reference_spans(formula) {
        out.push_str(&formula[last..span.start]);
        let token = &formula[span.clone()];
        match CellRef::from_str(token) {
            Some(cell) => match shift_cell(cell, op) {
                Some(moved) => out.push_str(&moved.to_string()),
                None => out.push_str(REF_ERROR),
            },
            None => out.push_str(token),
        }
        last = span.end;
    }
    out.push_str(&formula[last..]);
    out
}

/// True if `formula` contains a `#REF!` marker outside string literals.
pub(crate) fn contains_ref_error(formula: &str) -> bool {
    split_segments(formula)
        .into_iter()
        .any(|seg| !seg.is_string && formula[seg.range].contains(REF_ERROR))
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Paren {
    Call,
    Group,
}

/// Translate spreadsheet formula text into a Rhai expression.
///
/// Function calls are routed through a single dispatcher so builtin names stay
/// case-insensitive and arity is checked in one place. String literals are
/// copied through untouched.
pub fn preprocess_formula(formula: &str) -> String {
    let mut out = String::with_capacity(formula.len() + 16);
    let mut parens: Vec<Paren> = Vec::new();
    for segment in split_segments(formula) {
        let text = &formula[segment.range.clone()];
        if segment.is_string {
            out.push_str(text);
        } else {
            translate_code(text, &mut out, &mut parens);
        }
    }
    out
}

fn translate_code(code: &str, out: &mut String, parens: &mut Vec<Paren>) {
    let chars: Vec<char> = code.chars().collect();
    let mut i = 0usize;
    while i < chars.len() {
        let c = chars[i];
        if c.is_ascii_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            let ident: String = chars[start..i].iter().collect();
            let mut j = i;
            while j < chars.len() && chars[j].is_whitespace() {
                j += 1;
            }
            if j < chars.len() && chars[j] == '(' {
                out.push_str(DISPATCH_FN);
                out.push_str("(\"");
                out.push_str(&ident.to_ascii_uppercase());
                out.push_str("\", [");
                parens.push(Paren::Call);
                i = j + 1;
            } else if ident.eq_ignore_ascii_case("true") {
                out.push_str("true");
            } else if ident.eq_ignore_ascii_case("false") {
                out.push_str("false");
            } else {
                out.push_str(&ident);
            }
            continue;
        }
        if c.is_ascii_digit() {
            i = translate_number(&chars, i, out);
            continue;
        }
        let after_word = i > 0 && (chars[i - 1].is_ascii_alphanumeric() || chars[i - 1] == '_');
        if c == '.' && !after_word && chars.get(i + 1).is_some_and(|n| n.is_ascii_digit()) {
            // ".5" is not a Rhai literal
            out.push('0');
            out.push('.');
            i += 1;
            while i < chars.len() && chars[i].is_ascii_digit() {
                out.push(chars[i]);
                i += 1;
            }
            continue;
        }
        match c {
            '(' => {
                parens.push(Paren::Group);
                out.push('(');
            }
            ')' => match parens.pop() {
                Some(Paren::Call) => out.push_str("])"),
                _ => out.push(')'),
            },
            _ => out.push(c),
        }
        i += 1;
    }
}

/// Copy a numeric literal starting at `start`, forcing it to a float literal.
/// Returns the index just past the literal.
fn translate_number(chars: &[char], start: usize, out: &mut String) -> usize {
    let mut i = start;
    while i < chars.len() && chars[i].is_ascii_digit() {
        i += 1;
    }
    let int_part: String = chars[start..i].iter().collect();
    out.push_str(&int_part);

    let mut has_fraction = false;
    if i + 1 < chars.len() && chars[i] == '.' && chars[i + 1].is_ascii_digit() {
        has_fraction = true;
        out.push('.');
        i += 1;
        while i < chars.len() && chars[i].is_ascii_digit() {
            out.push(chars[i]);
            i += 1;
        }
    }
    if !has_fraction {
        out.push_str(".0");
    }

    if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
        let mut j = i + 1;
        if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
            j += 1;
        }
        if j < chars.len() && chars[j].is_ascii_digit() {
            out.push('e');
            for &ch in &chars[i + 1..j] {
                out.push(ch);
            }
            i = j;
            while i < chars.len() && chars[i].is_ascii_digit() {
                out.push(chars[i]);
                i += 1;
            }
        }
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_preprocess_routes_calls_through_dispatcher() {
        assert_eq!(
            preprocess_formula("pow(B2, 2)"),
            "call_builtin(\"POW\", [B2, 2.0])"
        );
        assert_eq!(
            preprocess_formula("SUM(1, MAX(A1, 3)) / 2"),
            "call_builtin(\"SUM\", [1.0, call_builtin(\"MAX\", [A1, 3.0])]) / 2.0"
        );
        assert_eq!(preprocess_formula("PI()"), "call_builtin(\"PI\", [])");
    }

    #[test]
    fn test_preprocess_keeps_groups_and_strings() {
        assert_eq!(preprocess_formula("(A1 + 1) * 2"), "(A1 + 1.0) * 2.0");
        assert_eq!(
            preprocess_formula("LEN(\"SUM(1)\")"),
            "call_builtin(\"LEN\", [\"SUM(1)\"])"
        );
    }

    #[test]
    fn test_preprocess_numbers_and_booleans() {
        assert_eq!(preprocess_formula("1.5 + 2e3 + 10"), "1.5 + 2.0e3 + 10.0");
        assert_eq!(preprocess_formula("IF(TRUE, 1, 0)"), "call_builtin(\"IF\", [true, 1.0, 0.0])");
        assert_eq!(preprocess_formula("A10"), "A10");
    }

    #[test]
    fn test_shift_cell() {
        let c = CellRef::new(3, 3);
        assert_eq!(shift_cell(c, ShiftOperation::InsertRow(3)), Some(CellRef::new(4, 3)));
        assert_eq!(shift_cell(c, ShiftOperation::InsertRow(4)), Some(c));
        assert_eq!(shift_cell(c, ShiftOperation::DeleteColumn(3)), None);
        assert_eq!(shift_cell(c, ShiftOperation::DeleteColumn(1)), Some(CellRef::new(3, 2)));
    }

    #[test]
    fn test_shift_formula_references() {
        assert_eq!(
            shift_formula_references("D1 + A1 * 2", ShiftOperation::InsertColumn(3)),
            "E1 + A1 * 2"
        );
        assert_eq!(
            shift_formula_references("SUM(A2, A3)", ShiftOperation::DeleteRow(2)),
            "SUM(#REF!, A2)"
        );
    }

    #[test]
    fn test_shift_skips_strings_and_function_names() {
        assert_eq!(
            shift_formula_references("CONCAT(\"B1\", B1) + LOG10(B1)", ShiftOperation::InsertColumn(1)),
            "CONCAT(\"B1\", C1) + LOG10(C1)"
        );
    }

    #[test]
    fn test_contains_ref_error() {
        assert!(contains_ref_error("#REF! + 1"));
        assert!(!contains_ref_error("\"#REF!\""));
    }
}
