use std::collections::HashMap;

use gridcalc_engine::engine::CellRef;

use crate::cell::Cell;

/// Sparse cell storage keyed by coordinate. Iteration order is unspecified.
#[derive(Clone, Debug, Default)]
pub struct CellStore {
    cells: HashMap<CellRef, Cell>,
}

impl CellStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        CellStore {
            cells: HashMap::with_capacity(capacity),
        }
    }

    pub fn get(&self, cell: &CellRef) -> Option<&Cell> {
        self.cells.get(cell)
    }

    pub fn get_mut(&mut self, cell: &CellRef) -> Option<&mut Cell> {
        self.cells.get_mut(cell)
    }

    /// Store `cell` under its own coordinates, returning any cell it replaced.
    pub fn insert(&mut self, cell: Cell) -> Option<Cell> {
        self.cells.insert(cell.cell_ref(), cell)
    }

    pub fn remove(&mut self, cell: &CellRef) -> Option<Cell> {
        self.cells.remove(cell)
    }

    pub fn contains(&self, cell: &CellRef) -> bool {
        self.cells.contains_key(cell)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CellRef, &Cell)> {
        self.cells.iter()
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.values()
    }

    /// Remove every cell for which `keep` returns false; returns how many went.
    pub fn retain(&mut self, mut keep: impl FnMut(&Cell) -> bool) -> usize {
        let before = self.cells.len();
        self.cells.retain(|_, cell| keep(cell));
        before - self.cells.len()
    }
}
