//! gridcalc - spreadsheet engine.
//!
//! Re-exports the sheet model from `gridcalc_core` and the formula engine from
//! `gridcalc_engine`, and adds the TOML [`config`] layer.
//!
//! ```
//! use gridcalc::Workbook;
//!
//! let mut wb = Workbook::new();
//! wb.set_cell_value(0, 1, 1, "20").unwrap();
//! wb.set_cell_value(0, 1, 2, "=A1*2 + 2").unwrap();
//! assert_eq!(wb.active_sheet().display(1, 2), "42");
//! ```

pub mod config;
pub mod error;

pub use config::Config;
pub use error::ConfigError;

pub use gridcalc_core::{
    Alignment, Axis, Cell, CellEntry, CellFormat, CellStore, DependencyGraph, EvictionPolicy,
    GridcalcError, MAX_VIEWPORT_COLS, MAX_VIEWPORT_ROWS, NumberFormat, RecalcReport, RenderedCell, RetainedBounds, Rgb, SNAPSHOT_VERSION,
    Sheet, SheetSettings, SheetSnapshot, StyleFlags, TopoOrder, ValidationPreset, ValidationRule,
    Viewport, VisibleGrid, Workbook, WorkbookSnapshot, display_value,
};
pub use gridcalc_engine::builtins;
pub use gridcalc_engine::engine::{CellRef, CellResolver, EvalError, Evaluator, Value, ValueKind};
