use crate::store::CellStore;
use crate::viewport::Viewport;

/// Drops empty cells that have scrolled far out of view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EvictionPolicy {
    /// Rows/columns kept on every side of the viewport.
    pub retention_margin: u32,
}

impl Default for EvictionPolicy {
    fn default() -> Self {
        EvictionPolicy {
            retention_margin: 100,
        }
    }
}

/// Inclusive coordinate bounds of the retained region.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetainedBounds {
    pub min_row: u32,
    pub max_row: u32,
    pub min_col: u32,
    pub max_col: u32,
}

impl RetainedBounds {
    pub fn contains(&self, row: u32, col: u32) -> bool {
        (self.min_row..=self.max_row).contains(&row) && (self.min_col..=self.max_col).contains(&col)
    }
}

impl EvictionPolicy {
    pub fn new(retention_margin: u32) -> Self {
        EvictionPolicy { retention_margin }
    }

    pub fn retained_bounds(&self, viewport: &Viewport) -> RetainedBounds {
        let m = self.retention_margin;
        RetainedBounds {
            min_row: viewport.top_row.saturating_sub(m).max(1),
            max_row: viewport.bottom_row().saturating_add(m),
            min_col: viewport.left_col.saturating_sub(m).max(1),
            max_col: viewport.right_col().saturating_add(m),
        }
    }

    /// Remove empty cells outside the retained region; returns how many were removed.
    /// Cells with content, a note, a rule or non-default styling are always kept.
    pub fn evict(&self, store: &mut CellStore, viewport: &Viewport) -> usize {
        let bounds = self.retained_bounds(viewport);
        store.retain(|cell| !cell.is_empty() || bounds.contains(cell.row, cell.col))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{Cell, StyleFlags};
    use crate::validation::ValidationRule;
    use gridcalc_engine::engine::CellRef;

    #[test]
    fn test_bounds_clamp_to_first_row() {
        let policy = EvictionPolicy::new(100);
        let bounds = policy.retained_bounds(&Viewport::new(50, 1, 10, 5));
        assert_eq!(bounds.min_row, 1);
        assert_eq!(bounds.max_row, 159);
        assert_eq!(bounds.max_col, 105);
    }

    #[test]
    fn test_evicts_only_distant_empty_cells() {
        let policy = EvictionPolicy::new(5);
        let vp = Viewport::new(1, 1, 10, 10);
        let mut store = CellStore::new();
        let far = CellRef::new(500, 1);
        let near = CellRef::new(12, 1);
        store.insert(Cell::new(far));
        store.insert(Cell::new(near));
        store.insert(Cell::with_raw(CellRef::new(600, 1), "keep"));
        let mut styled = Cell::new(CellRef::new(700, 1));
        styled.format.flags.insert(StyleFlags::ITALIC);
        store.insert(styled);

        assert_eq!(policy.evict(&mut store, &vp), 1);
        assert!(!store.contains(&far));
        assert!(store.contains(&near));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_rule_and_formula_cells_survive_far_away() {
        let policy = EvictionPolicy::new(0);
        let vp = Viewport::new(1, 1, 5, 5);
        let mut store = CellStore::new();
        let ruled = CellRef::new(900, 40);
        let mut cell = Cell::new(ruled);
        cell.validation = Some(ValidationRule::new("THIS > 0"));
        store.insert(cell);
        let formula = CellRef::new(901, 40);
        store.insert(Cell::with_raw(formula, "=1+1"));

        assert_eq!(policy.evict(&mut store, &vp), 0);
        assert!(store.contains(&ruled));
        assert!(store.contains(&formula));
    }
}
