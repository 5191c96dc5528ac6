// Property-based tests for snapshots, graph bookkeeping and eviction.
// CI: 128 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use std::collections::BTreeMap;

use gridcalc::{Alignment, CellFormat, CellRef, Sheet, StyleFlags, ValidationPreset};
use proptest::prelude::*;

fn config_128() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(128),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

/// Raw input: numbers, words, or a formula referencing a nearby cell.
fn arb_raw() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => r"-?[0-9]{1,5}(\.[0-9]{1,2})?",
        1 => r"[a-z]{1,8}",
        2 => (1..=8u32, 1..=8u32, 0..100u32)
            .prop_map(|(row, col, k)| format!("={} + {k}", CellRef::new(row, col))),
        1 => ((1..=8u32, 1..=8u32), (1..=8u32, 1..=8u32))
            .prop_map(|(a, b)| format!("=MAX({}, {})", CellRef::new(a.0, a.1), CellRef::new(b.0, b.1))),
    ]
}

fn arb_edits() -> impl Strategy<Value = Vec<(u32, u32, String)>> {
    prop::collection::vec((1..=8u32, 1..=8u32, arb_raw()), 0..40)
}

/// Layout kind holding alignment only; the one kind eviction may drop.
const ALIGN_ONLY: u8 = 3;

/// What a position holds: 0 raw text, 1 a note, 2 a style flag, 3 alignment
/// only, 4 a validation rule only, 5 a constant formula.
fn arb_layout() -> impl Strategy<Value = BTreeMap<(u32, u32), u8>> {
    prop::collection::btree_map((1..2000u32, 1..2000u32), 0..6u8, 0..40)
}

fn apply(sheet: &mut Sheet, edits: &[(u32, u32, String)]) {
    for (row, col, raw) in edits {
        // Cyclic and self-referencing edits are rejected; that is fine here.
        let _ = sheet.set_cell_value(*row, *col, raw);
    }
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_128())]

    #[test]
    fn prop_restore_reproduces_snapshot(edits in arb_edits()) {
        let mut sheet = Sheet::with_defaults("P");
        apply(&mut sheet, &edits);
        let snapshot = sheet.snapshot();

        let mut restored = Sheet::with_defaults("P");
        restored.restore(&snapshot).unwrap();
        prop_assert_eq!(restored.snapshot(), snapshot);
        for cell in sheet.cells() {
            prop_assert_eq!(restored.display(cell.row, cell.col), cell.display.clone());
        }
    }

    #[test]
    fn prop_graph_matches_formulas_after_any_edits(edits in arb_edits()) {
        let mut sheet = Sheet::with_defaults("P");
        apply(&mut sheet, &edits);
        prop_assert!(sheet.is_graph_consistent());

        sheet.insert_row(3).unwrap();
        sheet.delete_column(2).unwrap();
        prop_assert!(sheet.is_graph_consistent());
    }

    #[test]
    fn prop_eviction_keeps_meaningful_cells(
        layout in arb_layout(),
        top in 1..2000u32,
        left in 1..2000u32,
        margin in 0..60u32,
    ) {
        let mut sheet = Sheet::with_defaults("P");
        sheet.eviction.retention_margin = margin;
        for (&(row, col), &kind) in &layout {
            match kind {
                0 => {
                    sheet.set_cell_value(row, col, "x").unwrap();
                }
                1 => sheet.set_note(row, col, Some("n".to_string())).unwrap(),
                2 => {
                    let mut format = CellFormat::default();
                    format.flags.insert(StyleFlags::UNDERLINE);
                    sheet.set_format(row, col, format).unwrap();
                }
                ALIGN_ONLY => {
                    let format = CellFormat { align: Alignment::Center, ..CellFormat::default() };
                    sheet.set_format(row, col, format).unwrap();
                }
                4 => sheet.set_validation(row, col, Some(ValidationPreset::NotEmpty.rule())).unwrap(),
                _ => {
                    sheet.set_cell_value(row, col, "=1+1").unwrap();
                }
            }
        }

        sheet.viewport.scroll_to(top, left);
        let bounds = sheet.eviction.retained_bounds(&sheet.viewport);
        sheet.render_visible();

        for (&(row, col), &kind) in &layout {
            let kept = sheet.get_cell(row, col).is_some();
            if kind == ALIGN_ONLY {
                prop_assert_eq!(kept, bounds.contains(row, col));
            } else {
                prop_assert!(kept, "cell at ({}, {}) of kind {} was evicted", row, col, kind);
            }
        }
    }
}
