//! Dependency graph and closure engine for infrastructure templates.
//!
//! Templates provide and require named variables; the graph ([`graph::DependencyGraph`])
//! resolves those into dependency edges, answers one-hop and transitive queries,
//! computes closed subsets for safe retraction, orders templates for deploy, and
//! validates that every requirement has a provider.

pub mod closure;
pub mod config;
pub mod error;
pub mod export;
pub mod graph;
pub mod order;
pub mod validate;

pub use error::GraphError;
pub use graph::DependencyGraph;
