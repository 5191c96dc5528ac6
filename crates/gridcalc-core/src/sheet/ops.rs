use log::warn;

use gridcalc_engine::engine::{CellRef, extract_dependencies, invalid_references};

use super::{RecalcReport, Sheet, checked_position};
use crate::cell::{Cell, CellFormat, StyleFlags};
use crate::error::{GridcalcError, Result};
use crate::format::display_value;
use crate::validation::ValidationRule;

impl Sheet {
    /// Set a cell from user input and recalculate everything downstream.
    ///
    /// Literal input is checked against the cell's validation rule first.
    /// Formula input is rejected when it references itself, names an
    /// impossible address, or would close a dependency cycle; a rejected
    /// edit leaves the sheet untouched.
    pub fn set_cell_value(&mut self, row: u32, col: u32, raw: &str) -> Result<RecalcReport> {
        let at = checked_position(row, col)?;
        let input = raw.trim();
        let mut cell = self.store.get(&at).cloned().unwrap_or_else(|| Cell::new(at));

        if !input.starts_with('=')
            && let Some(rule) = &cell.validation
        {
            rule.check(at, input, &cell.format, &self.evaluator)?;
        }

        cell.set_raw(input);
        self.write_cell(cell)
    }

    /// Store a complete cell at its own coordinates, keeping the dependency
    /// graph in step with its raw text.
    pub fn set_cell(&mut self, mut cell: Cell) -> Result<RecalcReport> {
        checked_position(cell.row, cell.col)?;
        if let Some(rule) = &cell.validation {
            rule.verify(&self.evaluator)?;
        }
        let raw = cell.raw().map(str::to_owned).unwrap_or_default();
        cell.set_raw(&raw);
        self.write_cell(cell)
    }

    /// Remove the cell entirely: content, formatting, note and rule.
    /// Cells that referenced it now read it as blank.
    pub fn clear_cell(&mut self, row: u32, col: u32) -> Result<RecalcReport> {
        let at = checked_position(row, col)?;
        self.graph.clear_cell(at);
        self.store.remove(&at);
        Ok(self.recalculate_from([at]))
    }

    /// Replace a cell's format. Literal text is re-read under the new number
    /// format, so dependents are recalculated.
    pub fn set_format(&mut self, row: u32, col: u32, mut format: CellFormat) -> Result<RecalcReport> {
        let at = checked_position(row, col)?;
        let mut cell = self.store.get(&at).cloned().unwrap_or_else(|| Cell::new(at));
        format.flags.set(StyleFlags::FORMULA, cell.is_formula());
        cell.format = format;
        if cell.is_formula() {
            cell.display = display_value(&cell.value, &cell.format);
        } else {
            cell.refresh_literal();
        }
        self.put(cell);
        Ok(self.recalculate_from([at]))
    }

    pub fn set_note(&mut self, row: u32, col: u32, note: Option<String>) -> Result<()> {
        let at = checked_position(row, col)?;
        let mut cell = self.store.get(&at).cloned().unwrap_or_else(|| Cell::new(at));
        cell.note = note.filter(|n| !n.trim().is_empty());
        self.put(cell);
        Ok(())
    }

    /// Attach or remove a validation rule. The rule is verified before it is
    /// stored; existing content is not re-checked.
    pub fn set_validation(&mut self, row: u32, col: u32, rule: Option<ValidationRule>) -> Result<()> {
        let at = checked_position(row, col)?;
        if let Some(rule) = &rule {
            rule.verify(&self.evaluator)?;
        }
        let mut cell = self.store.get(&at).cloned().unwrap_or_else(|| Cell::new(at));
        cell.validation = rule;
        self.put(cell);
        Ok(())
    }

    fn write_cell(&mut self, mut cell: Cell) -> Result<RecalcReport> {
        let at = cell.cell_ref();
        let depends_on = match cell.formula() {
            Some(formula) => self.formula_dependencies(at, formula)?,
            None => Vec::new(),
        };

        let previous = self.graph.replace_edges(at, depends_on.iter().copied().collect());
        if let Some(path) = self.graph.cycle_through(at) {
            self.graph.replace_edges(at, previous);
            warn!("rejected edit of {at}: it would close a dependency cycle");
            return Err(GridcalcError::CircularDependency { cell: at, path });
        }

        cell.depends_on = depends_on;
        if !cell.is_formula() {
            cell.refresh_literal();
        }
        self.put(cell);
        Ok(self.recalculate_from([at]))
    }

    fn formula_dependencies(&self, at: CellRef, formula: &str) -> Result<Vec<CellRef>> {
        if let Some(reference) = invalid_references(formula).into_iter().next() {
            return Err(GridcalcError::Reference {
                cell: at,
                reference,
                reason: "not a valid cell address",
            });
        }
        let depends_on = extract_dependencies(formula);
        if depends_on.contains(&at) {
            return Err(GridcalcError::Reference {
                cell: at,
                reference: at.to_string(),
                reason: "cell references itself",
            });
        }
        Ok(depends_on)
    }

    /// Store `cell`, or drop it when it carries nothing worth keeping.
    fn put(&mut self, cell: Cell) {
        if cell.is_empty() && cell.format == CellFormat::default() {
            self.store.remove(&cell.cell_ref());
        } else {
            self.store.insert(cell);
        }
    }
}
