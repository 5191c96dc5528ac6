//! A single sheet: cell store, dependency graph, viewport and eviction policy.
//!
//! Every mutating operation leaves the graph consistent with the stored
//! formulas and recalculates the affected cells before it returns.

mod eval;
mod ops;
mod render;
mod structure;

use std::sync::Arc;

use gridcalc_engine::engine::{CellRef, Evaluator, Value};

use crate::cell::Cell;
use crate::error::{GridcalcError, Result};
use crate::eviction::EvictionPolicy;
use crate::graph::DependencyGraph;
use crate::settings::SheetSettings;
use crate::store::CellStore;
use crate::viewport::Viewport;

pub use eval::RecalcReport;
pub use render::{RenderedCell, VisibleGrid};
pub use structure::Axis;

#[derive(Clone, Debug)]
pub struct Sheet {
    pub(crate) name: String,
    pub(crate) rows: u32,
    pub(crate) cols: u32,
    pub(crate) store: CellStore,
    pub(crate) graph: DependencyGraph,
    pub viewport: Viewport,
    pub eviction: EvictionPolicy,
    pub(crate) evaluator: Arc<Evaluator>,
}

impl Sheet {
    /// Viewport dimensions in `settings` are clamped to the render limits.
    pub fn new(name: impl Into<String>, settings: &SheetSettings, evaluator: Arc<Evaluator>) -> Self {
        let limited = settings.clone().clamped();
        Sheet {
            name: name.into(),
            rows: settings.rows.max(1),
            cols: settings.cols.max(1),
            store: CellStore::new(),
            graph: DependencyGraph::new(),
            viewport: Viewport::new(1, 1, limited.viewport_rows, limited.viewport_cols),
            eviction: EvictionPolicy::new(settings.retention_margin),
            evaluator,
        }
    }

    /// A standalone sheet with default settings and its own evaluator.
    pub fn with_defaults(name: impl Into<String>) -> Self {
        Sheet::new(name, &SheetSettings::default(), Arc::new(Evaluator::new()))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Nominal (rows, columns) extent.
    pub fn extent(&self) -> (u32, u32) {
        (self.rows, self.cols)
    }

    pub fn cell_count(&self) -> usize {
        self.store.len()
    }

    pub fn get_cell(&self, row: u32, col: u32) -> Option<&Cell> {
        self.store.get(&CellRef::new(row, col))
    }

    /// Computed value at a position; positions without a cell read as blank text.
    pub fn value(&self, row: u32, col: u32) -> Value {
        self.get_cell(row, col)
            .map(|c| c.value.clone())
            .unwrap_or_default()
    }

    pub fn display(&self, row: u32, col: u32) -> String {
        self.get_cell(row, col)
            .map(|c| c.display.clone())
            .unwrap_or_default()
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.store.cells()
    }

    /// Cells whose formulas reference `(row, col)`.
    pub fn dependents_of(&self, row: u32, col: u32) -> Vec<CellRef> {
        self.graph.dependents(CellRef::new(row, col)).collect()
    }

    /// Cells referenced by the formula at `(row, col)`.
    pub fn precedents_of(&self, row: u32, col: u32) -> Vec<CellRef> {
        self.graph.precedents(CellRef::new(row, col)).collect()
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// True when the graph mirrors itself and matches every stored formula.
    pub fn is_graph_consistent(&self) -> bool {
        self.graph.is_consistent()
            && self.store.cells().all(|cell| {
                let mut linked: Vec<CellRef> = self.graph.precedents(cell.cell_ref()).collect();
                linked.sort();
                linked == cell.depends_on
            })
    }

    pub fn evaluator(&self) -> &Arc<Evaluator> {
        &self.evaluator
    }
}

pub(crate) fn checked_position(row: u32, col: u32) -> Result<CellRef> {
    let at = CellRef::new(row, col);
    if at.is_valid() {
        Ok(at)
    } else {
        Err(GridcalcError::InvalidPosition { row, col })
    }
}
