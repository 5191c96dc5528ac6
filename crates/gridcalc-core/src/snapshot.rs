//! Serializable sheet and workbook snapshots.
//!
//! Entries are keyed by A1-style address and written in row-major order, so
//! two snapshots of the same content compare equal and serialize identically.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use gridcalc_engine::engine::{CellRef, extract_dependencies};

use crate::cell::{Cell, CellFormat, StyleFlags};
use crate::error::{GridcalcError, Result};
use crate::graph::DependencyGraph;
use crate::sheet::{RecalcReport, Sheet};
use crate::store::CellStore;
use crate::validation::ValidationRule;

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CellEntry {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
    #[serde(default)]
    pub format: CellFormat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SheetSnapshot {
    pub name: String,
    pub rows: u32,
    pub cols: u32,
    pub cells: Vec<CellEntry>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkbookSnapshot {
    pub version: u32,
    pub active_sheet: usize,
    pub sheets: Vec<SheetSnapshot>,
}

impl CellEntry {
    fn from_cell(cell: &Cell) -> Self {
        let mut format = cell.format.clone();
        format.flags.remove(StyleFlags::FORMULA);
        CellEntry {
            address: cell.cell_ref().to_string(),
            raw: cell.raw().map(str::to_owned),
            format,
            validation: cell.validation.clone(),
            note: cell.note.clone(),
        }
    }

    fn to_cell(&self) -> Result<Cell> {
        let at = CellRef::from_str(&self.address).ok_or_else(|| GridcalcError::Snapshot {
            address: self.address.clone(),
            message: "not a cell address".to_string(),
        })?;
        let mut cell = Cell::new(at);
        cell.format = self.format.clone();
        cell.set_raw(self.raw.as_deref().unwrap_or_default());
        cell.validation = self.validation.clone();
        cell.note = self.note.clone();
        Ok(cell)
    }
}

impl Sheet {
    /// Capture every stored cell's inputs. Computed values are not captured;
    /// a restore recalculates them.
    pub fn snapshot(&self) -> SheetSnapshot {
        let mut cells: Vec<&Cell> = self.store.cells().collect();
        cells.sort_by_key(|c| c.cell_ref());
        SheetSnapshot {
            name: self.name.clone(),
            rows: self.rows,
            cols: self.cols,
            cells: cells.into_iter().map(CellEntry::from_cell).collect(),
        }
    }

    /// Replace the sheet's contents and extent with `snapshot`. The sheet
    /// keeps its own name; the workbook owns naming.
    ///
    /// Every entry is decoded before anything is replaced, so a bad or
    /// repeated address leaves the sheet as it was. Formulas that form a
    /// cycle are kept and rendered as cycle errors.
    pub fn restore(&mut self, snapshot: &SheetSnapshot) -> Result<RecalcReport> {
        let mut store = CellStore::with_capacity(snapshot.cells.len());
        let mut seen = HashSet::with_capacity(snapshot.cells.len());
        for entry in &snapshot.cells {
            let mut cell = entry.to_cell()?;
            if !seen.insert(cell.cell_ref()) {
                return Err(GridcalcError::Snapshot {
                    address: entry.address.clone(),
                    message: "address appears more than once".to_string(),
                });
            }
            match cell.formula() {
                Some(formula) => cell.depends_on = extract_dependencies(formula),
                None => cell.refresh_literal(),
            }
            store.insert(cell);
        }

        self.rows = snapshot.rows.max(1);
        self.cols = snapshot.cols.max(1);
        self.graph = DependencyGraph::from_store(&store);
        self.store = store;
        Ok(self.recalculate_all())
    }
}
