//! The visible window onto a sheet.
//!
//! Viewport-relative positions are 1-based like sheet coordinates; relative
//! row/column 0 maps to the header line.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub top_row: u32,
    pub left_col: u32,
    pub rows: u32,
    pub cols: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Viewport::new(1, 1, 30, 10)
    }
}

impl Viewport {
    /// Origins are clamped to 1 and sizes to at least one row/column.
    pub fn new(top_row: u32, left_col: u32, rows: u32, cols: u32) -> Self {
        Viewport {
            top_row: top_row.max(1),
            left_col: left_col.max(1),
            rows: rows.max(1),
            cols: cols.max(1),
        }
    }

    /// Last visible row (inclusive).
    pub fn bottom_row(&self) -> u32 {
        self.top_row.saturating_add(self.rows.saturating_sub(1))
    }

    /// Last visible column (inclusive).
    pub fn right_col(&self) -> u32 {
        self.left_col.saturating_add(self.cols.saturating_sub(1))
    }

    /// Sheet coordinates for a viewport-relative position. Header positions
    /// (relative 0) stay 0.
    pub fn to_absolute(&self, rel_row: u32, rel_col: u32) -> (u32, u32) {
        let row = if rel_row == 0 { 0 } else { self.top_row.saturating_add(rel_row - 1) };
        let col = if rel_col == 0 { 0 } else { self.left_col.saturating_add(rel_col - 1) };
        (row, col)
    }

    /// Viewport-relative position of a sheet cell, if it is visible.
    pub fn to_relative(&self, row: u32, col: u32) -> Option<(u32, u32)> {
        self.is_visible(row, col)
            .then(|| (row - self.top_row + 1, col - self.left_col + 1))
    }

    pub fn is_visible(&self, row: u32, col: u32) -> bool {
        (self.top_row..=self.bottom_row()).contains(&row)
            && (self.left_col..=self.right_col()).contains(&col)
    }

    /// Move the origin by a signed delta, never past row/column 1.
    pub fn pan(&mut self, delta_rows: i64, delta_cols: i64) {
        self.top_row = shift_clamped(self.top_row, delta_rows);
        self.left_col = shift_clamped(self.left_col, delta_cols);
    }

    /// Move the least distance needed to make `(row, col)` visible.
    pub fn scroll_to(&mut self, row: u32, col: u32) {
        let row = row.max(1);
        let col = col.max(1);
        if row < self.top_row {
            self.top_row = row;
        } else if row > self.bottom_row() {
            self.top_row = row - self.rows.saturating_sub(1);
        }
        if col < self.left_col {
            self.left_col = col;
        } else if col > self.right_col() {
            self.left_col = col - self.cols.saturating_sub(1);
        }
    }

    pub fn resize(&mut self, rows: u32, cols: u32) {
        self.rows = rows.max(1);
        self.cols = cols.max(1);
    }
}

fn shift_clamped(origin: u32, delta: i64) -> u32 {
    let moved = i64::from(origin).saturating_add(delta);
    moved.clamp(1, i64::from(u32::MAX)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translation_round_trips() {
        let vp = Viewport::new(10, 3, 5, 4);
        assert_eq!(vp.to_absolute(1, 1), (10, 3));
        assert_eq!(vp.to_absolute(5, 4), (14, 6));
        assert_eq!(vp.to_absolute(0, 2), (0, 4));
        assert_eq!(vp.to_relative(14, 6), Some((5, 4)));
        assert_eq!(vp.to_relative(15, 6), None);
        assert!(!vp.is_visible(9, 3));
    }

    #[test]
    fn test_pan_clamps_at_origin() {
        let mut vp = Viewport::new(5, 5, 10, 10);
        vp.pan(-20, 3);
        assert_eq!((vp.top_row, vp.left_col), (1, 8));
    }

    #[test]
    fn test_scroll_to_moves_minimally() {
        let mut vp = Viewport::new(1, 1, 10, 5);
        vp.scroll_to(25, 2);
        assert_eq!((vp.top_row, vp.left_col), (16, 1));
        assert!(vp.is_visible(25, 2));
        vp.scroll_to(3, 9);
        assert_eq!((vp.top_row, vp.left_col), (3, 5));
    }

    #[test]
    fn test_new_clamps_degenerate_values() {
        let vp = Viewport::new(0, 0, 0, 0);
        assert_eq!(vp, Viewport::new(1, 1, 1, 1));
    }
}
