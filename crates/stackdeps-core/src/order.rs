//! Deploy and retract ordering, cycle detection and plans.
//!
//! Deploy order puts every provider before its consumers (Kahn's algorithm,
//! ties broken by first-seen order). Retract order is its reverse.

use crate::closure::DroppedCandidate;
use crate::error::GraphError;
use crate::graph::{DependencyGraph, Direction};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Color states for cycle detection using DFS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    /// Not visited yet.
    White,
    /// On the current DFS stack.
    Gray,
    /// Fully explored.
    Black,
}

/// A retraction plan: what can be removed safely, in removal order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RetractPlan {
    /// Closed subset of the candidates, consumers before providers.
    pub order: Vec<String>,
    /// Candidates that would orphan an outside dependent.
    pub dropped: Vec<DroppedCandidate>,
}

/// Find the first dependency cycle among all known templates.
///
/// The returned path follows edges from provider to consumer and repeats its
/// first element at the end (`a → b → a`). A self-link yields `[a, a]`.
pub fn find_cycle(graph: &DependencyGraph) -> Option<Vec<String>> {
    let nodes: Vec<&str> = graph.templates().iter().map(String::as_str).collect();
    find_cycle_within(graph, &nodes)
}

/// Order all known templates so that providers come before consumers.
pub fn deploy_order(graph: &DependencyGraph) -> Result<Vec<String>, GraphError> {
    let nodes: Vec<&str> = graph.templates().iter().map(String::as_str).collect();
    order_within(graph, &nodes)
}

/// Deploy order restricted to `scope`. Edges leaving the scope are ignored.
pub fn deploy_order_within<S: AsRef<str>>(
    graph: &DependencyGraph,
    scope: &[S],
) -> Result<Vec<String>, GraphError> {
    let nodes = scoped_nodes(graph, scope.iter().map(AsRef::as_ref));
    order_within(graph, &nodes)
}

/// Reverse of [`deploy_order`]: consumers before providers.
pub fn retract_order(graph: &DependencyGraph) -> Result<Vec<String>, GraphError> {
    let mut order = deploy_order(graph)?;
    order.reverse();
    Ok(order)
}

/// Reverse of [`deploy_order_within`].
pub fn retract_order_within<S: AsRef<str>>(
    graph: &DependencyGraph,
    scope: &[S],
) -> Result<Vec<String>, GraphError> {
    let mut order = deploy_order_within(graph, scope)?;
    order.reverse();
    Ok(order)
}

/// The targets plus everything they transitively depend on, in deploy order.
pub fn deploy_plan<S: AsRef<str>>(
    graph: &DependencyGraph,
    targets: &[S],
) -> Result<Vec<String>, GraphError> {
    let mut wanted: Vec<&str> = Vec::new();
    for target in targets {
        let target = target.as_ref();
        wanted.push(target);
        wanted.extend(graph.reachable(target, Direction::Upstream));
    }
    let nodes = scoped_nodes(graph, wanted);
    tracing::debug!(targets = targets.len(), planned = nodes.len(), "deploy plan scope");
    order_within(graph, &nodes)
}

/// The closed subset of `candidates` in retract order, plus the candidates
/// that had to be left out.
pub fn retract_plan<S: AsRef<str>>(
    graph: &DependencyGraph,
    candidates: &[S],
) -> Result<RetractPlan, GraphError> {
    let report = graph.closure_report(candidates);
    let order = retract_order_within(graph, &report.kept)?;
    Ok(RetractPlan {
        order,
        dropped: report.dropped,
    })
}

/// Distinct scope members sorted by first-seen position; unknown templates
/// keep their input order at the end.
fn scoped_nodes<'a>(
    graph: &DependencyGraph,
    scope: impl IntoIterator<Item = &'a str>,
) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    let mut nodes: Vec<&str> = scope.into_iter().filter(|t| seen.insert(*t)).collect();
    nodes.sort_by_key(|t| graph.position(t).unwrap_or(usize::MAX));
    nodes
}

fn order_within(graph: &DependencyGraph, nodes: &[&str]) -> Result<Vec<String>, GraphError> {
    let position: HashMap<&str, usize> = nodes.iter().enumerate().map(|(i, n)| (*n, i)).collect();

    let mut in_degree: Vec<usize> = nodes
        .iter()
        .map(|node| {
            graph
                .neighbors(node, Direction::Upstream)
                .into_iter()
                .filter(|dep| position.contains_key(dep))
                .count()
        })
        .collect();

    let mut ready: BTreeSet<usize> = (0..nodes.len()).filter(|&i| in_degree[i] == 0).collect();
    let mut order = Vec::with_capacity(nodes.len());

    while let Some(i) = ready.pop_first() {
        order.push(nodes[i].to_string());
        for dependent in graph.neighbors(nodes[i], Direction::Downstream) {
            if let Some(&j) = position.get(dependent) {
                in_degree[j] -= 1;
                if in_degree[j] == 0 {
                    ready.insert(j);
                }
            }
        }
    }

    if order.len() < nodes.len() {
        let path = find_cycle_within(graph, nodes).unwrap_or_else(|| {
            nodes
                .iter()
                .enumerate()
                .filter(|(i, _)| in_degree[*i] > 0)
                .map(|(_, n)| (*n).to_string())
                .collect()
        });
        tracing::warn!(cycle = %path.join(" → "), "cannot order templates");
        return Err(GraphError::Cycle { path });
    }

    Ok(order)
}

fn find_cycle_within(graph: &DependencyGraph, nodes: &[&str]) -> Option<Vec<String>> {
    let in_scope: HashSet<&str> = nodes.iter().copied().collect();
    let mut colors: HashMap<&str, Color> = HashMap::new();

    for &root in nodes {
        if colors.get(root).copied().unwrap_or(Color::White) != Color::White {
            continue;
        }

        // Each frame is a node on the current path and its remaining consumers.
        colors.insert(root, Color::Gray);
        let mut stack = vec![(root, scoped_neighbors(graph, root, &in_scope))];

        while let Some(frame) = stack.last_mut() {
            let node = frame.0;
            let Some(next) = frame.1.next() else {
                colors.insert(node, Color::Black);
                stack.pop();
                continue;
            };
            match colors.get(next).copied().unwrap_or(Color::White) {
                Color::Gray => {
                    let start = stack.iter().position(|(n, _)| *n == next).unwrap_or(0);
                    let mut cycle: Vec<String> =
                        stack[start..].iter().map(|(n, _)| (*n).to_string()).collect();
                    cycle.push(next.to_string());
                    return Some(cycle);
                }
                Color::White => {
                    colors.insert(next, Color::Gray);
                    stack.push((next, scoped_neighbors(graph, next, &in_scope)));
                }
                Color::Black => {}
            }
        }
    }
    None
}

fn scoped_neighbors<'a>(
    graph: &'a DependencyGraph,
    node: &str,
    in_scope: &HashSet<&str>,
) -> std::vec::IntoIter<&'a str> {
    let mut next = graph.neighbors(node, Direction::Downstream);
    next.retain(|n| in_scope.contains(n));
    next.into_iter()
}
