//! Dependency extraction from formula text.
//!
//! A reference is a run of uppercase letters followed by digits, outside
//! string literals and not immediately followed by `(` (so `LOG10(x)` is a
//! call, not a reference to column LOG row 10).

use regex::Regex;
use std::collections::BTreeSet;
use std::ops::Range;
use std::sync::OnceLock;

use super::cell_ref::CellRef;

fn reference_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b[A-Z]+[0-9]+\b").expect("valid reference regex"))
}

/// A byte range of `formula` that is either code or a string literal
/// (quotes included).
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Segment {
    pub range: Range<usize>,
    pub is_string: bool,
}

/// Split a formula into alternating code and double-quoted string segments.
/// Backslash escapes inside strings are honoured; an unterminated string runs
/// to the end of the input.
pub(crate) fn split_segments(formula: &str) -> Vec<Segment> {
    let bytes = formula.as_bytes();
    let mut segments = Vec::new();
    let mut seg_start = 0usize;
    let mut in_string = false;
    let mut backslashes = 0usize;

    for (i, &b) in bytes.iter().enumerate() {
        if in_string {
            if b == b'\\' {
                backslashes += 1;
                continue;
            }
            if b == b'"' && backslashes.is_multiple_of(2) {
                segments.push(Segment {
                    range: seg_start..i + 1,
                    is_string: true,
                });
                in_string = false;
                seg_start = i + 1;
            }
            backslashes = 0;
            continue;
        }
        if b == b'"' {
            if seg_start < i {
                segments.push(Segment {
                    range: seg_start..i,
                    is_string: false,
                });
            }
            in_string = true;
            seg_start = i;
            backslashes = 0;
        }
    }

    if seg_start < formula.len() {
        segments.push(Segment {
            range: seg_start..formula.len(),
            is_string: in_string,
        });
    }
    segments
}

/// Byte ranges of every reference-shaped token in `formula`, in order.
/// Tokens that look like references but name no cell (`A0`) are included.
pub(crate) fn reference_spans(formula: &str) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    for segment in split_segments(formula) {
        if segment.is_string {
            continue;
        }
        let code = &formula[segment.range.clone()];
        for m in reference_re().find_iter(code) {
            if code[m.end()..].trim_start().starts_with('(') {
                continue;
            }
            spans.push(segment.range.start + m.start()..segment.range.start + m.end());
        }
    }
    spans
}

/// Cells referenced by `formula`, deduplicated and in row-major order.
pub fn extract_dependencies(formula: &str) -> Vec<CellRef> {
    let refs: BTreeSet<CellRef> = reference_spans(formula)
        .into_iter()
        .filter_map(|span| CellRef::from_str(&formula[span]))
        .collect();
    refs.into_iter().collect()
}

/// Reference-shaped tokens that do not name a cell, such as `A0` or an
/// overflowing column.
pub fn invalid_references(formula: &str) -> Vec<String> {
    reference_spans(formula)
        .into_iter()
        .map(|span| &formula[span])
        .filter(|token| CellRef::from_str(token).is_none())
        .map(str::to_string)
        .collect()
}
