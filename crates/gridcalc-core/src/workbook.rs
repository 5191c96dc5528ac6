//! Ordered collection of named sheets with one active sheet.
//!
//! The workbook always holds at least one sheet and its active index is
//! always valid. Sheet names are unique, compared case-insensitively.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::info;

use gridcalc_engine::engine::Evaluator;

use crate::error::{GridcalcError, Result};
use crate::settings::SheetSettings;
use crate::sheet::{RecalcReport, Sheet, VisibleGrid};
use crate::snapshot::{SNAPSHOT_VERSION, SheetSnapshot, WorkbookSnapshot};

const DEFAULT_SHEET_PREFIX: &str = "Sheet";

#[derive(Clone, Debug)]
pub struct Workbook {
    sheets: Vec<Sheet>,
    active: usize,
    file: Option<PathBuf>,
    modified: bool,
    evaluator: Arc<Evaluator>,
    settings: SheetSettings,
}

impl Default for Workbook {
    fn default() -> Self {
        Self::new()
    }
}

impl Workbook {
    pub fn new() -> Self {
        Self::with_settings(SheetSettings::default())
    }

    /// An untitled workbook holding a single empty `Sheet1`.
    pub fn with_settings(settings: SheetSettings) -> Self {
        let evaluator = Arc::new(Evaluator::new());
        let first = Sheet::new(
            format!("{DEFAULT_SHEET_PREFIX}1"),
            &settings,
            Arc::clone(&evaluator),
        );
        Workbook {
            sheets: vec![first],
            active: 0,
            file: None,
            modified: false,
            evaluator,
            settings,
        }
    }

    pub fn settings(&self) -> &SheetSettings {
        &self.settings
    }

    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(Sheet::name).collect()
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sheet(&self, index: usize) -> Option<&Sheet> {
        self.sheets.get(index)
    }

    /// Mutable access to a sheet. The workbook is marked modified.
    pub fn sheet_mut(&mut self, index: usize) -> Option<&mut Sheet> {
        let sheet = self.sheets.get_mut(index)?;
        self.modified = true;
        Some(sheet)
    }

    pub fn sheet_index(&self, name: &str) -> Option<usize> {
        self.sheets
            .iter()
            .position(|s| s.name().eq_ignore_ascii_case(name.trim()))
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active_sheet(&self) -> &Sheet {
        &self.sheets[self.active]
    }

    /// Mutable access to the active sheet. The workbook is marked modified.
    pub fn active_sheet_mut(&mut self) -> &mut Sheet {
        self.modified = true;
        &mut self.sheets[self.active]
    }

    /// Total number of stored cells across all sheets.
    pub fn total_cells(&self) -> usize {
        self.sheets.iter().map(Sheet::cell_count).sum()
    }

    /// Append a sheet named `name` and make it active. Returns its index.
    pub fn add_sheet(&mut self, name: &str) -> Result<usize> {
        let name = self.checked_name(name, None)?;
        let sheet = Sheet::new(name, &self.settings, Arc::clone(&self.evaluator));
        self.sheets.push(sheet);
        self.active = self.sheets.len() - 1;
        self.modified = true;
        info!("added sheet {:?} at index {}", self.active_sheet().name(), self.active);
        Ok(self.active)
    }

    /// Append a sheet with the first free `SheetN` name.
    pub fn add_default_sheet(&mut self) -> usize {
        let mut n = self.sheets.len() + 1;
        while self.sheet_index(&format!("{DEFAULT_SHEET_PREFIX}{n}")).is_some() {
            n += 1;
        }
        let sheet = Sheet::new(
            format!("{DEFAULT_SHEET_PREFIX}{n}"),
            &self.settings,
            Arc::clone(&self.evaluator),
        );
        self.sheets.push(sheet);
        self.active = self.sheets.len() - 1;
        self.modified = true;
        info!("added sheet {:?} at index {}", self.active_sheet().name(), self.active);
        self.active
    }

    pub fn rename_sheet(&mut self, index: usize, name: &str) -> Result<()> {
        self.check_index(index)?;
        let name = self.checked_name(name, Some(index))?;
        info!("renamed sheet {:?} to {:?}", self.sheets[index].name, name);
        self.sheets[index].name = name;
        self.modified = true;
        Ok(())
    }

    /// Remove a sheet. The last remaining sheet cannot be deleted.
    pub fn delete_sheet(&mut self, index: usize) -> Result<()> {
        self.check_index(index)?;
        if self.sheets.len() == 1 {
            return Err(GridcalcError::LastSheet);
        }
        let removed = self.sheets.remove(index);
        if self.active > index || self.active >= self.sheets.len() {
            self.active -= 1;
        }
        self.modified = true;
        info!("deleted sheet {:?}", removed.name());
        Ok(())
    }

    /// Copy a sheet in place after the original and make the copy active.
    pub fn duplicate_sheet(&mut self, index: usize) -> Result<usize> {
        self.check_index(index)?;
        let base = format!("{} Copy", self.sheets[index].name());
        let mut name = base.clone();
        let mut n = 2;
        while self.sheet_index(&name).is_some() {
            name = format!("{base} {n}");
            n += 1;
        }

        let mut copy = self.sheets[index].clone();
        copy.name = name;
        self.sheets.insert(index + 1, copy);
        self.active = index + 1;
        self.modified = true;
        info!("duplicated sheet {:?} as {:?}", self.sheets[index].name(), self.active_sheet().name());
        Ok(self.active)
    }

    /// Move the sheet at `from` to position `to`. The active sheet stays the
    /// same sheet, wherever it ends up.
    pub fn move_sheet(&mut self, from: usize, to: usize) -> Result<()> {
        self.check_index(from)?;
        self.check_index(to)?;
        if from == to {
            return Ok(());
        }
        let sheet = self.sheets.remove(from);
        self.sheets.insert(to, sheet);
        self.active = if self.active == from {
            to
        } else if from < self.active && self.active <= to {
            self.active - 1
        } else if to <= self.active && self.active < from {
            self.active + 1
        } else {
            self.active
        };
        self.modified = true;
        info!("moved sheet {:?} from {from} to {to}", self.sheets[to].name());
        Ok(())
    }

    pub fn switch_active(&mut self, index: usize) -> Result<()> {
        self.check_index(index)?;
        self.active = index;
        Ok(())
    }

    pub fn set_cell_value(&mut self, sheet: usize, row: u32, col: u32, raw: &str) -> Result<RecalcReport> {
        let report = self.sheet_at(sheet)?.set_cell_value(row, col, raw)?;
        self.modified = true;
        Ok(report)
    }

    pub fn insert_row(&mut self, sheet: usize, at: u32) -> Result<RecalcReport> {
        let report = self.sheet_at(sheet)?.insert_row(at)?;
        self.modified = true;
        Ok(report)
    }

    pub fn delete_row(&mut self, sheet: usize, at: u32) -> Result<RecalcReport> {
        let report = self.sheet_at(sheet)?.delete_row(at)?;
        self.modified = true;
        Ok(report)
    }

    pub fn insert_column(&mut self, sheet: usize, at: u32) -> Result<RecalcReport> {
        let report = self.sheet_at(sheet)?.insert_column(at)?;
        self.modified = true;
        Ok(report)
    }

    pub fn delete_column(&mut self, sheet: usize, at: u32) -> Result<RecalcReport> {
        let report = self.sheet_at(sheet)?.delete_column(at)?;
        self.modified = true;
        Ok(report)
    }

    /// Render the active sheet's viewport. Rendering does not mark the
    /// workbook modified.
    pub fn render_active(&mut self) -> VisibleGrid {
        self.sheets[self.active].render_visible()
    }

    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    pub fn set_file(&mut self, path: impl Into<PathBuf>) {
        self.file = Some(path.into());
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn mark_saved(&mut self) {
        self.modified = false;
    }

    /// Window title: `<file> - <active sheet>`, with ` ●` while unsaved.
    pub fn title(&self) -> String {
        let file = self
            .file
            .as_deref()
            .and_then(Path::file_name)
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Untitled".to_string());
        let title = format!("{file} - {}", self.active_sheet().name());
        if self.modified {
            format!("{title} ●")
        } else {
            title
        }
    }

    pub fn snapshot(&self) -> WorkbookSnapshot {
        WorkbookSnapshot {
            version: SNAPSHOT_VERSION,
            active_sheet: self.active,
            sheets: self.sheets.iter().map(Sheet::snapshot).collect(),
        }
    }

    /// Replace every sheet from `snapshot`. Nothing changes unless every
    /// sheet restores; the workbook is left unmodified afterwards.
    pub fn restore(&mut self, snapshot: &WorkbookSnapshot) -> Result<Vec<RecalcReport>> {
        if snapshot.version > SNAPSHOT_VERSION {
            return Err(GridcalcError::InvalidSnapshot(format!(
                "unsupported version {}",
                snapshot.version
            )));
        }
        if snapshot.sheets.is_empty() {
            return Err(GridcalcError::InvalidSnapshot("no sheets".to_string()));
        }
        if snapshot.active_sheet >= snapshot.sheets.len() {
            return Err(GridcalcError::InvalidSnapshot(format!(
                "active sheet {} out of range",
                snapshot.active_sheet
            )));
        }

        let mut sheets: Vec<Sheet> = Vec::with_capacity(snapshot.sheets.len());
        let mut reports = Vec::with_capacity(snapshot.sheets.len());
        for sheet_snapshot in &snapshot.sheets {
            let name = sheet_snapshot.name.trim();
            if name.is_empty() {
                return Err(GridcalcError::EmptySheetName);
            }
            if sheets.iter().any(|s| s.name().eq_ignore_ascii_case(name)) {
                return Err(GridcalcError::DuplicateSheetName(name.to_string()));
            }
            let mut sheet = Sheet::new(name, &self.settings, Arc::clone(&self.evaluator));
            reports.push(sheet.restore(sheet_snapshot)?);
            sheets.push(sheet);
        }

        self.sheets = sheets;
        self.active = snapshot.active_sheet;
        self.modified = false;
        info!("restored workbook with {} sheet(s)", self.sheets.len());
        Ok(reports)
    }

    /// Replace one sheet's contents from `snapshot`, keeping the sheet's name.
    pub fn restore_sheet(&mut self, index: usize, snapshot: &SheetSnapshot) -> Result<RecalcReport> {
        let report = self.sheet_at(index)?.restore(snapshot)?;
        self.modified = true;
        Ok(report)
    }

    fn sheet_at(&mut self, index: usize) -> Result<&mut Sheet> {
        let count = self.sheets.len();
        self.sheets
            .get_mut(index)
            .ok_or(GridcalcError::SheetIndex { index, count })
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.sheets.len() {
            Ok(())
        } else {
            Err(GridcalcError::SheetIndex {
                index,
                count: self.sheets.len(),
            })
        }
    }

    /// Trimmed, non-empty and unique (ignoring the sheet at `except`).
    fn checked_name(&self, name: &str, except: Option<usize>) -> Result<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(GridcalcError::EmptySheetName);
        }
        match self.sheet_index(name) {
            Some(existing) if Some(existing) != except => {
                Err(GridcalcError::DuplicateSheetName(name.to_string()))
            }
            _ => Ok(name.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_new_workbook_has_one_sheet() {
        let wb = Workbook::new();
        assert_eq!(wb.sheet_names(), vec!["Sheet1"]);
        assert_eq!(wb.active_index(), 0);
        assert!(!wb.is_modified());
        assert_eq!(wb.title(), "Untitled - Sheet1");
    }

    #[test]
    fn test_add_and_rename_enforce_unique_names() {
        let mut wb = Workbook::new();
        assert_eq!(wb.add_sheet("Budget").unwrap(), 1);
        assert_eq!(wb.active_index(), 1);
        assert!(matches!(wb.add_sheet("budget"), Err(GridcalcError::DuplicateSheetName(_))));
        assert!(matches!(wb.add_sheet("  "), Err(GridcalcError::EmptySheetName)));
        assert!(wb.rename_sheet(1, "BUDGET").is_ok());
        assert!(matches!(wb.rename_sheet(1, "sheet1"), Err(GridcalcError::DuplicateSheetName(_))));
        assert!(matches!(wb.rename_sheet(5, "x"), Err(GridcalcError::SheetIndex { index: 5, count: 2 })));
        assert_eq!(wb.add_default_sheet(), 2);
        assert_eq!(wb.sheet_names(), vec!["Sheet1", "BUDGET", "Sheet3"]);
    }

    #[test]
    fn test_delete_keeps_active_index_valid() {
        let mut wb = Workbook::new();
        wb.add_sheet("B").unwrap();
        wb.add_sheet("C").unwrap();
        assert_eq!(wb.active_index(), 2);
        wb.delete_sheet(2).unwrap();
        assert_eq!(wb.active_sheet().name(), "B");
        wb.switch_active(0).unwrap();
        wb.delete_sheet(1).unwrap();
        assert_eq!(wb.active_sheet().name(), "Sheet1");
        assert!(matches!(wb.delete_sheet(0), Err(GridcalcError::LastSheet)));
    }

    #[test]
    fn test_duplicate_copies_content_under_fresh_name() {
        let mut wb = Workbook::new();
        wb.set_cell_value(0, 1, 1, "3").unwrap();
        wb.set_cell_value(0, 1, 2, "=A1*2").unwrap();
        assert_eq!(wb.duplicate_sheet(0).unwrap(), 1);
        assert_eq!(wb.duplicate_sheet(0).unwrap(), 1);
        assert_eq!(wb.sheet_names(), vec!["Sheet1", "Sheet1 Copy 2", "Sheet1 Copy"]);

        wb.set_cell_value(2, 1, 1, "10").unwrap();
        assert_eq!(wb.sheet(2).unwrap().display(1, 2), "20");
        assert_eq!(wb.sheet(0).unwrap().display(1, 2), "6");
    }

    #[test]
    fn test_move_sheet_tracks_active_sheet() {
        let mut wb = Workbook::new();
        wb.add_sheet("B").unwrap();
        wb.add_sheet("C").unwrap();
        wb.switch_active(1).unwrap();
        wb.move_sheet(0, 2).unwrap();
        assert_eq!(wb.sheet_names(), vec!["B", "C", "Sheet1"]);
        assert_eq!(wb.active_sheet().name(), "B");
        wb.move_sheet(2, 0).unwrap();
        assert_eq!(wb.active_sheet().name(), "B");
        assert_eq!(wb.active_index(), 1);
        assert!(wb.move_sheet(0, 3).is_err());
    }

    #[test]
    fn test_title_tracks_file_and_modified_flag() {
        let mut wb = Workbook::new();
        wb.set_cell_value(0, 1, 1, "x").unwrap();
        assert_eq!(wb.title(), "Untitled - Sheet1 ●");
        wb.set_file("/tmp/budget.grc");
        wb.mark_saved();
        assert_eq!(wb.title(), "budget.grc - Sheet1");
        assert_eq!(wb.file(), Some(Path::new("/tmp/budget.grc")));
    }

    #[test]
    fn test_restore_round_trips_and_validates() {
        let mut wb = Workbook::new();
        wb.set_cell_value(0, 2, 2, "4").unwrap();
        wb.add_sheet("Calc").unwrap();
        wb.set_cell_value(1, 1, 1, "=1+1").unwrap();
        let snap = wb.snapshot();
        assert_eq!(snap.active_sheet, 1);

        let mut other = Workbook::new();
        let reports = other.restore(&snap).unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(other.sheet_names(), vec!["Sheet1", "Calc"]);
        assert_eq!(other.active_index(), 1);
        assert_eq!(other.active_sheet().display(1, 1), "2");
        assert!(!other.is_modified());
        assert_eq!(other.snapshot(), snap);

        let mut bad = snap.clone();
        bad.sheets[1].name = "SHEET1".into();
        assert!(matches!(other.restore(&bad), Err(GridcalcError::DuplicateSheetName(_))));
        bad.sheets.clear();
        assert!(matches!(other.restore(&bad), Err(GridcalcError::InvalidSnapshot(_))));
        assert_eq!(other.sheet_count(), 2);
    }

    #[test]
    fn test_restoring_one_sheet_into_another_keeps_names_unique() {
        let mut wb = Workbook::new();
        let data = wb.add_sheet("Data").unwrap();
        wb.set_cell_value(data, 1, 1, "7").unwrap();
        let snap = wb.sheet(data).unwrap().snapshot();
        wb.mark_saved();

        wb.restore_sheet(0, &snap).unwrap();
        assert_eq!(wb.sheet_names(), vec!["Sheet1", "Data"]);
        assert_eq!(wb.sheet_index("Data"), Some(1));
        assert_eq!(wb.sheet(0).unwrap().display(1, 1), "7");
        assert!(wb.is_modified());

        let first = wb.sheet(0).unwrap().snapshot();
        wb.sheet_mut(1).unwrap().restore(&first).unwrap();
        assert_eq!(wb.sheet_names(), vec!["Sheet1", "Data"]);
        assert!(matches!(wb.restore_sheet(5, &snap), Err(GridcalcError::SheetIndex { index: 5, .. })));
    }
}
