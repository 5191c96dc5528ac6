use log::trace;

use gridcalc_engine::engine::{CellRef, ValueKind};

use super::Sheet;
use crate::cell::CellFormat;

/// Snapshot of one visible position, keyed by its viewport-relative place.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderedCell {
    /// Viewport-relative row (1 = first visible row).
    pub row: u32,
    /// Viewport-relative column (1 = first visible column).
    pub col: u32,
    pub address: CellRef,
    pub display: String,
    pub kind: ValueKind,
    pub format: CellFormat,
    pub has_note: bool,
    pub is_formula: bool,
}

/// What a front end needs to draw the current window.
#[derive(Clone, Debug, PartialEq)]
pub struct VisibleGrid {
    pub column_labels: Vec<String>,
    pub row_labels: Vec<String>,
    pub rows: Vec<Vec<RenderedCell>>,
}

impl VisibleGrid {
    /// Cell at a viewport-relative position (1-based).
    pub fn cell(&self, row: u32, col: u32) -> Option<&RenderedCell> {
        let r = usize::try_from(row.checked_sub(1)?).ok()?;
        let c = usize::try_from(col.checked_sub(1)?).ok()?;
        self.rows.get(r)?.get(c)
    }
}

impl Sheet {
    /// Render the viewport, then evict empty cells outside the retained region.
    pub fn render_visible(&mut self) -> VisibleGrid {
        let vp = self.viewport;
        let column_labels = (vp.left_col..=vp.right_col())
            .map(CellRef::col_to_letters)
            .collect();
        let row_labels = (vp.top_row..=vp.bottom_row())
            .map(|r| r.to_string())
            .collect();

        let rows = (1..=vp.rows)
            .map(|rel_row| {
                (1..=vp.cols)
                    .map(|rel_col| {
                        let (row, col) = vp.to_absolute(rel_row, rel_col);
                        let address = CellRef::new(row, col);
                        match self.store.get(&address) {
                            Some(cell) => RenderedCell {
                                row: rel_row,
                                col: rel_col,
                                address,
                                display: cell.display.clone(),
                                kind: cell.kind(),
                                format: cell.format.clone(),
                                has_note: cell.note.is_some(),
                                is_formula: cell.is_formula(),
                            },
                            None => RenderedCell {
                                row: rel_row,
                                col: rel_col,
                                address,
                                display: String::new(),
                                kind: ValueKind::Text,
                                format: CellFormat::default(),
                                has_note: false,
                                is_formula: false,
                            },
                        }
                    })
                    .collect()
            })
            .collect();

        let evicted = self.eviction.evict(&mut self.store, &vp);
        trace!(
            "rendered {}x{} window of {:?} at {}, evicted {} cell(s)",
            vp.rows,
            vp.cols,
            self.name,
            CellRef::new(vp.top_row, vp.left_col),
            evicted
        );

        VisibleGrid {
            column_labels,
            row_labels,
            rows,
        }
    }
}
