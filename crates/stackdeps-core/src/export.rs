//! Export the template graph as DOT (Graphviz) or Mermaid flowchart.

use crate::graph::{DependencyGraph, EdgeOrigin};
use std::collections::HashMap;
use std::fmt::Write;

/// Export format for graph visualization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Dot,
    Mermaid,
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dot" | "graphviz" => Ok(Self::Dot),
            "mermaid" | "mmd" => Ok(Self::Mermaid),
            other => Err(format!("unknown export format: {other} (expected dot or mermaid)")),
        }
    }
}

/// Render the graph in the requested format.
pub fn export(graph: &DependencyGraph, format: ExportFormat) -> String {
    match format {
        ExportFormat::Dot => export_dot(graph),
        ExportFormat::Mermaid => export_mermaid(graph),
    }
}

/// Export the graph as a DOT (Graphviz) string.
pub fn export_dot(graph: &DependencyGraph) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "digraph stackdeps {{");
    let _ = writeln!(out, "  rankdir=LR;");
    let _ = writeln!(out, "  node [shape=box, fontsize=10];");
    let _ = writeln!(out);

    for template in graph.templates() {
        let _ = writeln!(out, "  \"{}\";", escape_dot(template));
    }

    let _ = writeln!(out);

    for edge in graph.edges() {
        let attrs = match &edge.origin {
            EdgeOrigin::Variable(variable) => format!("label=\"{}\"", escape_dot(variable)),
            EdgeOrigin::Link => "style=dashed".to_string(),
        };
        let _ = writeln!(
            out,
            "  \"{}\" -> \"{}\" [{}];",
            escape_dot(&edge.provider),
            escape_dot(&edge.consumer),
            attrs
        );
    }

    let _ = writeln!(out, "}}");
    out
}

/// Export the graph as a Mermaid flowchart string.
pub fn export_mermaid(graph: &DependencyGraph) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "flowchart LR");

    // Template IDs are paths; Mermaid node IDs must be plain identifiers.
    let ids: HashMap<&str, String> = graph
        .templates()
        .iter()
        .enumerate()
        .map(|(i, t)| (t.as_str(), format!("t{i}")))
        .collect();

    for template in graph.templates() {
        let _ = writeln!(
            out,
            "  {}[\"{}\"]",
            ids[template.as_str()],
            escape_mermaid(template)
        );
    }

    for edge in graph.edges() {
        let (Some(from), Some(to)) = (ids.get(edge.provider.as_str()), ids.get(edge.consumer.as_str()))
        else {
            continue;
        };
        match &edge.origin {
            EdgeOrigin::Variable(variable) => {
                let _ = writeln!(out, "  {} -->|{}| {}", from, escape_mermaid(variable), to);
            }
            EdgeOrigin::Link => {
                let _ = writeln!(out, "  {} -.-> {}", from, to);
            }
        }
    }

    out
}

fn escape_dot(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

fn escape_mermaid(s: &str) -> String {
    s.replace('"', "#quot;").replace('|', "#124;")
}
