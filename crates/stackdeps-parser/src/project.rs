//! Load a project: config, template discovery, parallel parsing, registration.
//!
//! Parsing runs on the rayon pool; each worker returns an owned
//! [`TemplateSpec`]. Registration into the graph then happens on the calling
//! thread, in sorted identifier order, so the graph has a single writer.

use crate::discover::{discover_templates, template_id};
use crate::error::ScanError;
use crate::template::{TemplateSpec, extract_template};
use anyhow::{Context, Result};
use rayon::prelude::*;
use stackdeps_core::config::{LinkConfig, StackdepsConfig, TemplatesConfig};
use stackdeps_core::graph::DependencyGraph;
use std::path::{Path, PathBuf};

/// A loaded project: its configuration, parsed templates and the graph.
#[derive(Debug, Clone)]
pub struct Project {
    pub template_root: PathBuf,
    pub config: StackdepsConfig,
    pub templates: Vec<TemplateSpec>,
    pub graph: DependencyGraph,
}

/// Load `.stackdeps/config.toml` (or defaults) and build the project graph.
pub fn load_project(project_root: &Path) -> Result<Project> {
    let config = StackdepsConfig::load(project_root)?;
    load_project_with(project_root, config)
}

/// Build the project graph with an already-loaded config.
pub fn load_project_with(project_root: &Path, config: StackdepsConfig) -> Result<Project> {
    let template_root = config.template_root(project_root);
    let templates = scan_templates(&template_root, &config.templates)
        .with_context(|| format!("failed to scan templates in {}", template_root.display()))?;

    let mut graph = DependencyGraph::new();
    for spec in &templates {
        register(&mut graph, spec);
    }
    apply_links(&mut graph, &config.links);
    warn_unknown_links(&graph, &templates, &config.links);

    tracing::info!(
        templates = graph.template_count(),
        variables = graph.variable_count(),
        edges = graph.edge_count(),
        "loaded project"
    );

    Ok(Project {
        template_root,
        config,
        templates,
        graph,
    })
}

/// Discover and parse every template under `root`.
pub fn scan_templates(
    root: &Path,
    templates: &TemplatesConfig,
) -> Result<Vec<TemplateSpec>, ScanError> {
    let paths = discover_templates(root, &templates.include, &templates.exclude)?;
    paths
        .par_iter()
        .map(|rel| {
            let path = root.join(rel);
            let source = std::fs::read_to_string(&path).map_err(|source| ScanError::Read {
                path: path.clone(),
                source,
            })?;
            extract_template(&template_id(rel), &source)
                .map_err(|source| ScanError::Yaml { path, source })
        })
        .collect()
}

/// Register one template's declarations into the graph.
pub fn register(graph: &mut DependencyGraph, spec: &TemplateSpec) {
    graph.add_template(&spec.id);
    for variable in &spec.provides {
        graph.provide(&spec.id, variable);
    }
    for variable in &spec.requires {
        graph.require(&spec.id, variable);
    }
    for provider in &spec.depends_on {
        graph.link(provider, &spec.id);
    }
}

/// Register explicit links from config.
pub fn apply_links(graph: &mut DependencyGraph, links: &[LinkConfig]) {
    for link in links {
        graph.link(&link.provider, &link.consumer);
    }
}

fn warn_unknown_links(graph: &DependencyGraph, templates: &[TemplateSpec], links: &[LinkConfig]) {
    let discovered = |id: &str| templates.iter().any(|t| t.id == id);
    for template in graph.templates() {
        if !discovered(template) {
            let origin = if links
                .iter()
                .any(|l| l.provider == *template || l.consumer == *template)
            {
                "config"
            } else {
                "DependsOn"
            };
            tracing::warn!(
                template = %template,
                origin,
                "link references a template that was not discovered"
            );
        }
    }
}
