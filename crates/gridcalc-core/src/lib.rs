//! gridcalc-core - UI-agnostic sheet model.
//!
//! A [`Workbook`] owns ordered [`Sheet`]s. Each sheet keeps a sparse cell
//! store, a coordinate-keyed dependency graph and a viewport; every mutation
//! synchronises the graph and recalculates the affected cells before
//! returning.

pub mod cell;
pub mod error;
mod eviction;
mod format;
mod graph;
pub mod settings;
pub mod sheet;
pub mod snapshot;
mod store;
pub mod validation;
pub mod viewport;
pub mod workbook;

pub use cell::{Alignment, Cell, CellFormat, NumberFormat, Rgb, StyleFlags};
pub use error::{GridcalcError, Result};
pub use eviction::{EvictionPolicy, RetainedBounds};
pub use format::display_value;
pub use graph::{DependencyGraph, TopoOrder};
pub use settings::{MAX_VIEWPORT_COLS, MAX_VIEWPORT_ROWS, SheetSettings};
pub use sheet::{Axis, RecalcReport, RenderedCell, Sheet, VisibleGrid};
pub use snapshot::{CellEntry, SNAPSHOT_VERSION, SheetSnapshot, WorkbookSnapshot};
pub use store::CellStore;
pub use validation::{ValidationPreset, ValidationRule};
pub use viewport::Viewport;
pub use workbook::Workbook;
