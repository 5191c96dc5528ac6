//! gridcalc-engine - formula evaluation for gridcalc.
//!
//! Parses cell references, extracts formula dependencies, rewrites references
//! for structural edits and evaluates expressions through an embedded Rhai
//! engine extended with the spreadsheet function library.

pub mod builtins;
pub mod engine;
