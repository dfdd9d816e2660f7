//! Closed-subset computation over a candidate list of templates.
//!
//! A candidate is kept only if every template downstream of it (anywhere in
//! the graph) is itself a candidate. Acting on the kept set as a unit, e.g.
//! retracting it, cannot orphan a consumer outside the set.

use crate::graph::{DependencyGraph, Direction};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// A candidate that was excluded from the closed subset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DroppedCandidate {
    pub template: String,
    /// Transitive dependents outside the candidate list, in BFS order.
    pub blocked_by: Vec<String>,
}

/// Outcome of a closure computation with explanations for dropped candidates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClosureReport {
    pub kept: Vec<String>,
    pub dropped: Vec<DroppedCandidate>,
}

impl DependencyGraph {
    /// The candidates whose full transitive-dependents closure lies within
    /// the candidate list, in input order.
    pub fn closed_subset<S: AsRef<str>>(&self, candidates: &[S]) -> Vec<String> {
        self.closure_report(candidates).kept
    }

    /// Like [`closed_subset`](Self::closed_subset), but also reports which
    /// outside dependents blocked each dropped candidate.
    pub fn closure_report<S: AsRef<str>>(&self, candidates: &[S]) -> ClosureReport {
        let members: HashSet<&str> = candidates.iter().map(AsRef::as_ref).collect();
        let mut outside_cache: HashMap<&str, Vec<String>> = HashMap::new();
        let mut report = ClosureReport::default();

        for candidate in candidates {
            let candidate = candidate.as_ref();
            let outside = outside_cache.entry(candidate).or_insert_with(|| {
                self.reachable(candidate, Direction::Downstream)
                    .into_iter()
                    .filter(|t| !members.contains(t))
                    .map(str::to_string)
                    .collect()
            });

            if outside.is_empty() {
                report.kept.push(candidate.to_string());
            } else {
                tracing::debug!(
                    template = candidate,
                    blocked_by = ?outside,
                    "dropping candidate with dependents outside the set"
                );
                report.dropped.push(DroppedCandidate {
                    template: candidate.to_string(),
                    blocked_by: outside.clone(),
                });
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_test_graph() -> DependencyGraph {
        // A -> B and an unrelated C -> D
        let mut graph = DependencyGraph::new();
        graph.link("A", "B");
        graph.link("C", "D");
        graph
    }

    #[test]
    fn test_drops_candidate_with_outside_dependent() {
        let graph = make_test_graph();
        assert_eq!(graph.closed_subset(&["C", "B"]), vec!["B"]);
    }

    #[test]
    fn test_keeps_all_when_closed() {
        let graph = make_test_graph();
        assert_eq!(graph.closed_subset(&["D", "C", "B"]), vec!["D", "C", "B"]);
    }

    #[test]
    fn test_report_explains_drop() {
        let graph = make_test_graph();
        let report = graph.closure_report(&["A", "C", "D"]);
        assert_eq!(report.kept, vec!["C", "D"]);
        assert_eq!(report.dropped.len(), 1);
        assert_eq!(report.dropped[0].template, "A");
        assert_eq!(report.dropped[0].blocked_by, vec!["B"]);
    }

    #[test]
    fn test_unknown_template_always_kept() {
        let graph = make_test_graph();
        assert_eq!(graph.closed_subset(&["ghost.yaml"]), vec!["ghost.yaml"]);
    }

    #[test]
    fn test_duplicates_preserved() {
        let graph = make_test_graph();
        assert_eq!(graph.closed_subset(&["B", "B", "A"]), vec!["B", "B", "A"]);
    }

    #[test]
    fn test_transitive_dependents_count() {
        // A -> B -> C: retracting A and B alone would orphan C.
        let mut graph = DependencyGraph::new();
        graph.provide("A", "x");
        graph.require("B", "x");
        graph.link("B", "C");

        assert_eq!(graph.closed_subset(&["A", "B"]), Vec::<String>::new());
        assert_eq!(graph.closed_subset(&["A", "B", "C"]), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_cycle_does_not_hang() {
        let mut graph = DependencyGraph::new();
        graph.link("a", "b");
        graph.link("b", "a");
        graph.link("b", "c");

        assert_eq!(graph.closed_subset(&["a", "b"]), Vec::<String>::new());
        assert_eq!(graph.closed_subset(&["a", "b", "c"]), vec!["a", "b", "c"]);
    }
}
