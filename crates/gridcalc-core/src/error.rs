//! Error types for gridcalc-core.

use gridcalc_engine::engine::CellRef;
use thiserror::Error;

/// Errors that reject a sheet or workbook operation before it mutates anything.
///
/// Formula evaluation failures are not listed here: they are rendered into the
/// failing cell as an error value and reported through a recalculation report.
#[derive(Error, Debug)]
pub enum GridcalcError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Circular dependency detected: {}", format_path(.path))]
    CircularDependency { cell: CellRef, path: Vec<CellRef> },

    #[error("Invalid reference {reference} in {cell}: {reason}")]
    Reference {
        cell: CellRef,
        reference: String,
        reason: &'static str,
    },

    #[error("Invalid cell position (row {row}, column {col}): rows and columns start at 1")]
    InvalidPosition { row: u32, col: u32 },

    #[error("{cell}: {message}")]
    Validation { cell: CellRef, message: String },

    #[error("Invalid validation rule {rule:?}: {message}")]
    InvalidValidationRule { rule: String, message: String },

    #[error("{0}")]
    Structural(String),

    #[error("Cannot delete the last remaining sheet")]
    LastSheet,

    #[error("Sheet name cannot be empty")]
    EmptySheetName,

    #[error("A sheet named {0:?} already exists")]
    DuplicateSheetName(String),

    #[error("Sheet index {index} out of range ({count} sheets)")]
    SheetIndex { index: usize, count: usize },

    #[error("Invalid snapshot entry {address:?}: {message}")]
    Snapshot { address: String, message: String },

    #[error("Invalid workbook snapshot: {0}")]
    InvalidSnapshot(String),
}

fn format_path(path: &[CellRef]) -> String {
    path.iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Result type alias for gridcalc-core operations.
pub type Result<T> = std::result::Result<T, GridcalcError>;
