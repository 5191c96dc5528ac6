//! Core formula engine.
//!
//! - [`cell_ref`]: A1-style addresses and 1-based coordinates
//! - [`value`]: the closed set of evaluated values and their coercions
//! - [`deps`]: reference scanning and dependency extraction
//! - [`preprocess`]: formula-to-Rhai translation and reference shifting
//! - [`eval`]: the shared [`Evaluator`] and the [`CellResolver`] seam

mod cell_ref;
mod deps;
mod error;
mod eval;
mod format;
mod preprocess;
mod value;

pub use cell_ref::CellRef;
pub use deps::{extract_dependencies, invalid_references};
pub use error::{Arity, EvalError};
pub use eval::{CellResolver, Evaluator};
pub use format::format_number;
pub(crate) use preprocess::DISPATCH_FN;
pub use preprocess::{REF_ERROR, ShiftOperation, preprocess_formula, shift_cell, shift_formula_references};
pub use value::{Value, ValueKind, parse_datetime};
