//! Dependency graph for formula cells.
//!
//! ```text
//! A → B  means  "B depends on A"  (A is a precedent of B)
//! ```
//!
//! Edges live in two coordinate-keyed maps rather than inside cells, so a
//! formula may reference an address that holds no cell at all.
//!
//! # Invariants
//!
//! 1. If A ∈ precedents[B] then B ∈ dependents[A], and vice versa.
//! 2. Empty sets are removed, not stored.
//! 3. [`DependencyGraph::replace_edges`] is the only mutator touching both maps.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use gridcalc_engine::engine::CellRef;

use crate::store::CellStore;

#[derive(Clone, Debug, Default)]
pub struct DependencyGraph {
    precedents: HashMap<CellRef, BTreeSet<CellRef>>,
    dependents: HashMap<CellRef, BTreeSet<CellRef>>,
}

/// Result of ordering a set of cells for evaluation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TopoOrder {
    /// Cells in an order where every precedent comes first.
    pub order: Vec<CellRef>,
    /// Cells on, or downstream of, a cycle, in row-major order.
    pub unordered: Vec<CellRef>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build edges for every formula cell in `store`.
    pub fn from_store(store: &CellStore) -> Self {
        let mut graph = DependencyGraph::new();
        for cell in store.cells() {
            if cell.is_formula() {
                graph.replace_edges(cell.cell_ref(), cell.depends_on.iter().copied().collect());
            }
        }
        graph
    }

    pub fn precedents(&self, cell: CellRef) -> impl Iterator<Item = CellRef> + '_ {
        self.precedents
            .get(&cell)
            .into_iter()
            .flat_map(|s| s.iter().copied())
    }

    pub fn dependents(&self, cell: CellRef) -> impl Iterator<Item = CellRef> + '_ {
        self.dependents
            .get(&cell)
            .into_iter()
            .flat_map(|s| s.iter().copied())
    }

    /// Number of cells with at least one precedent.
    pub fn formula_cell_count(&self) -> usize {
        self.precedents.len()
    }

    /// Replace all edges for `cell` atomically, returning the previous
    /// precedent set so a rejected edit can be reverted.
    ///
    /// Pass an empty set to clear all edges for this cell.
    pub fn replace_edges(&mut self, cell: CellRef, new_precedents: BTreeSet<CellRef>) -> BTreeSet<CellRef> {
        let old = self.precedents.remove(&cell).unwrap_or_default();
        for precedent in &old {
            if let Some(deps) = self.dependents.get_mut(precedent) {
                deps.remove(&cell);
                if deps.is_empty() {
                    self.dependents.remove(precedent);
                }
            }
        }

        if new_precedents.is_empty() {
            return old;
        }
        for precedent in &new_precedents {
            self.dependents.entry(*precedent).or_default().insert(cell);
        }
        self.precedents.insert(cell, new_precedents);
        old
    }

    pub fn clear_cell(&mut self, cell: CellRef) {
        self.replace_edges(cell, BTreeSet::new());
    }

    /// Every cell reachable from `seeds` along dependent edges, seeds included.
    pub fn closure(&self, seeds: impl IntoIterator<Item = CellRef>) -> BTreeSet<CellRef> {
        let mut seen = BTreeSet::new();
        let mut queue: VecDeque<CellRef> = VecDeque::new();
        for seed in seeds {
            if seen.insert(seed) {
                queue.push_back(seed);
            }
        }
        while let Some(current) = queue.pop_front() {
            for dep in self.dependents(current) {
                if seen.insert(dep) {
                    queue.push_back(dep);
                }
            }
        }
        seen
    }

    /// Kahn's algorithm restricted to `nodes`. Ties are broken in row-major
    /// order so passes are deterministic.
    pub fn topo_order(&self, nodes: &BTreeSet<CellRef>) -> TopoOrder {
        let mut in_degree: HashMap<CellRef, usize> = nodes
            .iter()
            .map(|&cell| {
                let count = self.precedents(cell).filter(|p| nodes.contains(p)).count();
                (cell, count)
            })
            .collect();

        let mut ready: BTreeSet<CellRef> = nodes
            .iter()
            .copied()
            .filter(|cell| in_degree.get(cell) == Some(&0))
            .collect();
        let mut order = Vec::with_capacity(nodes.len());

        while let Some(cell) = ready.pop_first() {
            order.push(cell);
            for dep in self.dependents(cell) {
                if let Some(degree) = in_degree.get_mut(&dep) {
                    *degree = degree.saturating_sub(1);
                    if *degree == 0 {
                        ready.insert(dep);
                    }
                }
            }
        }

        let placed: HashSet<CellRef> = order.iter().copied().collect();
        let unordered = nodes
            .iter()
            .copied()
            .filter(|cell| !placed.contains(cell))
            .collect();
        TopoOrder { order, unordered }
    }

    /// A dependency path from `cell` back to itself, if `cell` sits on a cycle.
    ///
    /// The returned path starts and ends with `cell`.
    pub fn cycle_through(&self, cell: CellRef) -> Option<Vec<CellRef>> {
        let mut parent: HashMap<CellRef, CellRef> = HashMap::new();
        let mut queue = VecDeque::from([cell]);
        let mut seen = HashSet::from([cell]);

        while let Some(current) = queue.pop_front() {
            for next in self.precedents(current) {
                if next == cell {
                    let mut path = vec![cell, current];
                    let mut at = current;
                    while let Some(&prev) = parent.get(&at) {
                        path.push(prev);
                        at = prev;
                    }
                    path.reverse();
                    path.dedup();
                    if path.last() != Some(&cell) {
                        path.push(cell);
                    }
                    return Some(path);
                }
                if seen.insert(next) {
                    parent.insert(next, current);
                    queue.push_back(next);
                }
            }
        }
        None
    }

    /// True when both edge maps mirror each other and hold no empty sets.
    pub fn is_consistent(&self) -> bool {
        let forward = self.precedents.iter().all(|(cell, preds)| {
            !preds.is_empty()
                && preds
                    .iter()
                    .all(|p| self.dependents.get(p).is_some_and(|d| d.contains(cell)))
        });
        let backward = self.dependents.iter().all(|(cell, deps)| {
            !deps.is_empty()
                && deps
                    .iter()
                    .all(|d| self.precedents.get(d).is_some_and(|p| p.contains(cell)))
        });
        forward && backward
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn c(name: &str) -> CellRef {
        CellRef::from_str(name).unwrap()
    }

    fn set(names: &[&str]) -> BTreeSet<CellRef> {
        names.iter().map(|n| c(n)).collect()
    }

    #[test]
    fn test_replace_edges_keeps_both_directions() {
        let mut g = DependencyGraph::new();
        g.replace_edges(c("C1"), set(&["A1", "B1"]));
        assert_eq!(g.dependents(c("A1")).collect::<Vec<_>>(), vec![c("C1")]);
        assert!(g.is_consistent());

        let old = g.replace_edges(c("C1"), set(&["B1"]));
        assert_eq!(old, set(&["A1", "B1"]));
        assert_eq!(g.dependents(c("A1")).count(), 0);
        assert!(g.is_consistent());

        g.clear_cell(c("C1"));
        assert_eq!(g.formula_cell_count(), 0);
        assert!(g.is_consistent());
    }

    #[test]
    fn test_closure_follows_dependents() {
        let mut g = DependencyGraph::new();
        g.replace_edges(c("B1"), set(&["A1"]));
        g.replace_edges(c("C1"), set(&["B1"]));
        g.replace_edges(c("E1"), set(&["D1"]));
        assert_eq!(g.closure([c("A1")]), set(&["A1", "B1", "C1"]));
    }

    #[test]
    fn test_topo_order_diamond() {
        let mut g = DependencyGraph::new();
        g.replace_edges(c("B1"), set(&["A1"]));
        g.replace_edges(c("B2"), set(&["A1"]));
        g.replace_edges(c("C1"), set(&["B1", "B2"]));
        let topo = g.topo_order(&g.closure([c("A1")]));
        assert_eq!(topo.order, vec![c("A1"), c("B1"), c("B2"), c("C1")]);
        assert!(topo.unordered.is_empty());
    }

    #[test]
    fn test_topo_order_reports_cycle_and_downstream() {
        let mut g = DependencyGraph::new();
        g.replace_edges(c("A1"), set(&["B1"]));
        g.replace_edges(c("B1"), set(&["A1"]));
        g.replace_edges(c("C1"), set(&["B1"]));
        let topo = g.topo_order(&g.closure([c("A1")]));
        assert!(topo.order.is_empty());
        assert_eq!(topo.unordered, vec![c("A1"), c("B1"), c("C1")]);
    }

    #[test]
    fn test_cycle_through() {
        let mut g = DependencyGraph::new();
        g.replace_edges(c("A1"), set(&["B1"]));
        g.replace_edges(c("B1"), set(&["C1"]));
        assert!(g.cycle_through(c("A1")).is_none());

        g.replace_edges(c("C1"), set(&["A1"]));
        let path = g.cycle_through(c("A1")).unwrap();
        assert_eq!(path.first(), Some(&c("A1")));
        assert_eq!(path.last(), Some(&c("A1")));
        assert_eq!(path.len(), 4);
    }
}
