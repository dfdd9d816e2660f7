//! Template discovery and dependency extraction for stackdeps.
//!
//! Walks a template root, reads each YAML/JSON template, extracts the
//! variables it provides (`Outputs`) and requires (`Parameters` without a
//! `Default`), plus explicit `Metadata.DependsOn` links, and registers them
//! into a [`DependencyGraph`](stackdeps_core::DependencyGraph).

pub mod discover;
pub mod error;
pub mod project;
pub mod template;

pub use error::ScanError;
