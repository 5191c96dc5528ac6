use log::debug;

use gridcalc_engine::engine::{ShiftOperation, extract_dependencies, shift_cell, shift_formula_references};

use super::{RecalcReport, Sheet};
use crate::error::{GridcalcError, Result};
use crate::graph::DependencyGraph;
use crate::store::CellStore;

/// Which dimension a structural edit works on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    Row,
    Column,
}

impl Axis {
    fn label(self) -> &'static str {
        match self {
            Axis::Row => "row",
            Axis::Column => "column",
        }
    }

    fn insert(self, at: u32) -> ShiftOperation {
        match self {
            Axis::Row => ShiftOperation::InsertRow(at),
            Axis::Column => ShiftOperation::InsertColumn(at),
        }
    }

    fn delete(self, at: u32) -> ShiftOperation {
        match self {
            Axis::Row => ShiftOperation::DeleteRow(at),
            Axis::Column => ShiftOperation::DeleteColumn(at),
        }
    }
}

impl Sheet {
    pub fn insert_row(&mut self, at: u32) -> Result<RecalcReport> {
        self.insert(Axis::Row, at)
    }

    pub fn delete_row(&mut self, at: u32) -> Result<RecalcReport> {
        self.delete(Axis::Row, at)
    }

    pub fn insert_column(&mut self, at: u32) -> Result<RecalcReport> {
        self.insert(Axis::Column, at)
    }

    pub fn delete_column(&mut self, at: u32) -> Result<RecalcReport> {
        self.delete(Axis::Column, at)
    }

    /// Insert an empty row or column before index `at`, moving everything at or
    /// after it by one.
    pub fn insert(&mut self, axis: Axis, at: u32) -> Result<RecalcReport> {
        if at == 0 {
            return Err(GridcalcError::Structural(format!(
                "cannot insert a {} at index 0",
                axis.label()
            )));
        }
        let report = self.apply_shift(axis.insert(at));
        match axis {
            Axis::Row => self.rows = self.rows.saturating_add(1),
            Axis::Column => self.cols = self.cols.saturating_add(1),
        }
        Ok(report)
    }

    /// Delete the row or column at index `at`. References to it become `#REF!`.
    pub fn delete(&mut self, axis: Axis, at: u32) -> Result<RecalcReport> {
        if at == 0 {
            return Err(GridcalcError::Structural(format!(
                "cannot delete {} 0",
                axis.label()
            )));
        }
        let extent = match axis {
            Axis::Row => self.rows,
            Axis::Column => self.cols,
        };
        if extent <= 1 {
            return Err(GridcalcError::Structural(format!(
                "cannot delete the last {}",
                axis.label()
            )));
        }
        let report = self.apply_shift(axis.delete(at));
        match axis {
            Axis::Row => self.rows -= 1,
            Axis::Column => self.cols -= 1,
        }
        Ok(report)
    }

    /// Move every cell and rewrite every formula for `op`, then rebuild the
    /// graph and recalculate. The new store is assembled before it replaces
    /// the old one.
    fn apply_shift(&mut self, op: ShiftOperation) -> RecalcReport {
        let mut moved = CellStore::with_capacity(self.store.len());
        let mut dropped = 0usize;

        for cell in self.store.cells() {
            let Some(target) = shift_cell(cell.cell_ref(), op) else {
                dropped += 1;
                continue;
            };
            let mut cell = cell.clone();
            cell.row = target.row;
            cell.col = target.col;
            if let Some(raw) = cell.raw().filter(|_| cell.is_formula()) {
                let rewritten = shift_formula_references(raw, op);
                cell.set_raw(&rewritten);
                cell.depends_on = cell.formula().map(extract_dependencies).unwrap_or_default();
            }
            moved.insert(cell);
        }

        self.graph = DependencyGraph::from_store(&moved);
        self.store = moved;
        debug!(
            "{:?} on {:?}: {} cell(s) kept, {} removed",
            op,
            self.name,
            self.store.len(),
            dropped
        );
        self.recalculate_all()
    }
}
