use serde::{Deserialize, Serialize};

/// Largest viewport a sheet will render; larger requests are clamped.
pub const MAX_VIEWPORT_ROWS: u32 = 1000;
pub const MAX_VIEWPORT_COLS: u32 = 256;

/// Per-sheet defaults applied when a sheet is created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetSettings {
    /// Nominal row extent of a new sheet.
    pub rows: u32,
    /// Nominal column extent of a new sheet (702 = column ZZ).
    pub cols: u32,
    pub viewport_rows: u32,
    pub viewport_cols: u32,
    /// Rows/columns kept around the viewport before empty cells are evicted.
    pub retention_margin: u32,
}

impl Default for SheetSettings {
    fn default() -> Self {
        SheetSettings {
            rows: 1000,
            cols: 702,
            viewport_rows: 30,
            viewport_cols: 10,
            retention_margin: 100,
        }
    }
}

impl SheetSettings {
    /// These settings with the viewport limited to `1..=MAX_VIEWPORT_*`.
    pub fn clamped(mut self) -> Self {
        self.viewport_rows = self.viewport_rows.clamp(1, MAX_VIEWPORT_ROWS);
        self.viewport_cols = self.viewport_cols.clamp(1, MAX_VIEWPORT_COLS);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamped_limits_viewport_only() {
        let settings = SheetSettings {
            rows: 4_000_000,
            viewport_rows: 4_000_000_000,
            viewport_cols: 0,
            ..SheetSettings::default()
        }
        .clamped();
        assert_eq!(settings.viewport_rows, MAX_VIEWPORT_ROWS);
        assert_eq!(settings.viewport_cols, 1);
        assert_eq!(settings.rows, 4_000_000);
        assert_eq!(SheetSettings::default().clamped(), SheetSettings::default());
    }
}
