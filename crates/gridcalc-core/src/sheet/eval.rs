use std::collections::BTreeSet;

use log::debug;

use gridcalc_engine::engine::{CellRef, EvalError, Value};

use super::Sheet;
use crate::format::display_value;

/// Display tag for cells that sit on, or downstream of, a dependency cycle.
pub const CYCLE_TAG: &str = "#CYCLE!";

/// Outcome of one recalculation pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecalcReport {
    /// Formula cells evaluated, in evaluation order.
    pub evaluated: Vec<CellRef>,
    /// Cells whose formula failed, with the failure.
    pub errors: Vec<(CellRef, EvalError)>,
    /// Cells left unevaluated because they are on or behind a cycle.
    pub cycle: Vec<CellRef>,
}

impl RecalcReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.cycle.is_empty()
    }
}

impl Sheet {
    /// Re-evaluate `seeds` and everything that transitively depends on them.
    pub(crate) fn recalculate_from(&mut self, seeds: impl IntoIterator<Item = CellRef>) -> RecalcReport {
        let affected = self.graph.closure(seeds);
        self.recalculate(&affected)
    }

    /// Re-evaluate every formula cell on the sheet.
    pub fn recalculate_all(&mut self) -> RecalcReport {
        let formulas: BTreeSet<CellRef> = self
            .store
            .cells()
            .filter(|c| c.is_formula())
            .map(|c| c.cell_ref())
            .collect();
        self.recalculate(&formulas)
    }

    fn recalculate(&mut self, cells: &BTreeSet<CellRef>) -> RecalcReport {
        let topo = self.graph.topo_order(cells);
        let mut report = RecalcReport::default();

        for at in topo.order {
            let Some(formula) = self.store.get(&at).and_then(|c| c.formula()).map(str::to_owned) else {
                continue;
            };
            let outcome = {
                let store = &self.store;
                let resolve = |cell: CellRef| store.get(&cell).map(|c| c.value.clone()).unwrap_or_default();
                self.evaluator.evaluate(&formula, &resolve)
            };
            let value = match outcome {
                Ok(value) => value,
                Err(err) => {
                    let tag = Value::Error(err.tag().to_string());
                    report.errors.push((at, err));
                    tag
                }
            };
            self.store_result(at, value);
            report.evaluated.push(at);
        }

        for at in topo.unordered {
            if self.store.get(&at).is_some_and(|c| c.is_formula()) {
                self.store_result(at, Value::Error(CYCLE_TAG.to_string()));
                report.cycle.push(at);
            }
        }

        debug!(
            "recalculated {} cell(s) on {:?}: {} error(s), {} in cycles",
            report.evaluated.len(),
            self.name,
            report.errors.len(),
            report.cycle.len()
        );
        report
    }

    fn store_result(&mut self, at: CellRef, value: Value) {
        if let Some(cell) = self.store.get_mut(&at) {
            cell.display = display_value(&value, &cell.format);
            cell.value = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn a1(name: &str) -> CellRef {
        CellRef::from_str(name).unwrap()
    }

    #[test]
    fn test_chain_recalculates_only_downstream() {
        let mut sheet = Sheet::with_defaults("S");
        sheet.set_cell_value(1, 1, "1").unwrap();
        sheet.set_cell_value(1, 2, "=A1+1").unwrap();
        sheet.set_cell_value(1, 3, "=B1*10").unwrap();
        sheet.set_cell_value(1, 4, "=7").unwrap();

        let report = sheet.set_cell_value(1, 1, "2").unwrap();
        assert_eq!(report.evaluated, vec![a1("B1"), a1("C1")]);
        assert!(report.is_clean());
        assert_eq!(sheet.display(1, 3), "30");
    }

    #[test]
    fn test_errors_render_tags_and_siblings_continue() {
        let mut sheet = Sheet::with_defaults("S");
        sheet.set_cell_value(1, 1, "0").unwrap();
        sheet.set_cell_value(2, 1, "=CTAN(A1)").unwrap();
        sheet.set_cell_value(2, 2, "=A1+1").unwrap();
        sheet.set_cell_value(3, 1, "=A2*2").unwrap();

        let report = sheet.set_cell_value(1, 1, "0").unwrap();
        assert_eq!(sheet.display(2, 1), "#DIV/0!");
        assert_eq!(sheet.display(3, 1), "#DIV/0!");
        assert_eq!(sheet.display(2, 2), "1");
        assert_eq!(report.errors.len(), 2);
        assert!(sheet.value(2, 1).is_error());
    }

    #[test]
    fn test_empty_reference_is_blank_but_counts_as_zero() {
        let mut sheet = Sheet::with_defaults("S");
        sheet.set_cell_value(1, 2, "=ISBLANK(A1)").unwrap();
        sheet.set_cell_value(1, 3, "=ISNUMBER(A1)").unwrap();
        sheet.set_cell_value(1, 4, "=A1+1").unwrap();
        assert_eq!(sheet.value(1, 2), Value::Boolean(true));
        assert_eq!(sheet.value(1, 3), Value::Boolean(false));
        assert_eq!(sheet.value(1, 4), Value::Number(1.0));

        sheet.set_cell_value(1, 1, "4").unwrap();
        assert_eq!(sheet.value(1, 2), Value::Boolean(false));
        assert_eq!(sheet.value(1, 3), Value::Boolean(true));
        assert_eq!(sheet.value(1, 4), Value::Number(5.0));
    }

    #[test]
    fn test_unknown_function_is_name_error() {
        let mut sheet = Sheet::with_defaults("S");
        let report = sheet.set_cell_value(1, 1, "=NOPE(1)").unwrap();
        assert_eq!(sheet.display(1, 1), "#NAME?");
        assert!(!report.is_clean());
    }

    #[test]
    fn test_pow_operator_is_rejected_but_function_works() {
        let mut sheet = Sheet::with_defaults("S");
        sheet.set_cell_value(2, 2, "5").unwrap();
        sheet.set_cell_value(2, 3, "=B2*2 POW 2").unwrap();
        assert!(sheet.value(2, 3).is_error());
        sheet.set_cell_value(2, 3, "=POW(B2,2)").unwrap();
        assert_eq!(sheet.value(2, 3), Value::Number(25.0));
    }
}
