//! Pre-deploy validation: unmet requirements, duplicate providers, cycles.
//!
//! Problems are reported as data. Whether they are fatal is decided by
//! [`ValidationConfig`] through [`ValidationReport::is_ok`].

use crate::config::ValidationConfig;
use crate::graph::{DependencyGraph, DuplicateProvider};
use crate::order::find_cycle;
use serde::Serialize;

/// A required variable with no provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UndefinedVariable {
    pub variable: String,
    pub required_by: Vec<String>,
    /// Closest provided variable name, if any is similar enough.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

/// Everything a deploy needs to know before it runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub undefined: Vec<UndefinedVariable>,
    pub duplicate_providers: Vec<DuplicateProvider>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cycle: Option<Vec<String>>,
    pub strict_providers: bool,
    pub allow_undefined: bool,
}

impl ValidationReport {
    /// Whether the graph is fit to act on under the configured strictness.
    pub fn is_ok(&self) -> bool {
        (self.undefined.is_empty() || self.allow_undefined)
            && self.cycle.is_none()
            && (self.duplicate_providers.is_empty() || !self.strict_providers)
    }

    /// Total number of problems found, fatal or not.
    pub fn issue_count(&self) -> usize {
        self.undefined.len() + self.duplicate_providers.len() + usize::from(self.cycle.is_some())
    }
}

/// Validate a populated graph.
pub fn validate(graph: &DependencyGraph, config: &ValidationConfig) -> ValidationReport {
    let provided: Vec<String> = graph
        .templates()
        .iter()
        .flat_map(|t| graph.provided_by(t))
        .collect();

    let undefined = graph
        .undefined_variables()
        .into_iter()
        .map(|variable| {
            let suggestion = suggest(&variable, &provided, config.suggestion_threshold);
            UndefinedVariable {
                required_by: graph.requirers_of(&variable).to_vec(),
                suggestion,
                variable,
            }
        })
        .collect();

    let report = ValidationReport {
        undefined,
        duplicate_providers: graph.duplicate_providers(),
        cycle: find_cycle(graph),
        strict_providers: config.strict_providers,
        allow_undefined: config.allow_undefined,
    };
    tracing::debug!(
        issues = report.issue_count(),
        ok = report.is_ok(),
        "validated dependency graph"
    );
    report
}

/// Closest candidate by normalized Levenshtein similarity, at or above `threshold`.
fn suggest(variable: &str, candidates: &[String], threshold: f64) -> Option<String> {
    candidates
        .iter()
        .map(|c| (c, strsim::normalized_levenshtein(variable, c)))
        .filter(|(_, sim)| *sim >= threshold)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(c, _)| c.clone())
}
