//! Errors raised by graph operations that cannot report their way around a
//! malformed graph.

/// Errors from ordering and planning over a [`DependencyGraph`](crate::graph::DependencyGraph).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("dependency cycle detected: {}", path.join(" → "))]
    Cycle { path: Vec<String> },
}
