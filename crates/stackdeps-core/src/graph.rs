//! Dependency graph model: variable registry, edge store and one-hop queries.
//!
//! Variable-mediated edges are never stored. Each template keeps an ordered
//! list of inbound and outbound ports; a port is either a variable (resolved
//! through the provider/requirer indexes when queried) or a direct link to
//! another template. This keeps the final graph independent of the order in
//! which `provide` and `require` are called.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

/// Traversal direction along dependency edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Towards providers: what a template depends on.
    Upstream,
    /// Towards consumers: what depends on a template.
    Downstream,
}

/// How a dependency edge came to exist.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "variable")]
pub enum EdgeOrigin {
    /// The consumer requires a variable the provider provides.
    Variable(String),
    /// An explicit link with no variable involved.
    Link,
}

/// A materialized edge: `consumer` depends on `provider`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DependencyEdge {
    pub provider: String,
    pub consumer: String,
    pub origin: EdgeOrigin,
}

/// A variable provided by more than one distinct template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateProvider {
    pub variable: String,
    pub providers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Port {
    Variable(String),
    Template(String),
}

/// In-memory relationship model between templates.
///
/// Built once per project load through [`provide`](Self::provide),
/// [`require`](Self::require) and [`link`](Self::link), then queried.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// Every template named by a registration call, in first-seen order.
    templates: Vec<String>,
    template_index: HashMap<String, usize>,
    /// variable → providing templates, in registration order.
    providers: HashMap<String, Vec<String>>,
    /// variable → requiring templates, in registration order.
    requirers: HashMap<String, Vec<String>>,
    /// template → required variables and linked providers.
    inbound: HashMap<String, Vec<Port>>,
    /// template → provided variables and linked consumers.
    outbound: HashMap<String, Vec<Port>>,
}

impl DependencyGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a template with no relationships (an isolated node).
    pub fn add_template(&mut self, template: &str) {
        if !self.template_index.contains_key(template) {
            self.template_index
                .insert(template.to_string(), self.templates.len());
            self.templates.push(template.to_string());
        }
    }

    /// Record that `template` supplies `variable`.
    pub fn provide(&mut self, template: &str, variable: &str) {
        tracing::trace!(template, variable, "provide");
        self.add_template(template);
        push_unique(
            self.providers.entry(variable.to_string()).or_default(),
            template,
        );
        push_port(
            self.outbound.entry(template.to_string()).or_default(),
            Port::Variable(variable.to_string()),
        );
    }

    /// Record that `template` consumes `variable`.
    ///
    /// Every template that provides `variable`, now or later, becomes a
    /// dependency of `template`.
    pub fn require(&mut self, template: &str, variable: &str) {
        tracing::trace!(template, variable, "require");
        self.add_template(template);
        push_unique(
            self.requirers.entry(variable.to_string()).or_default(),
            template,
        );
        push_port(
            self.inbound.entry(template.to_string()).or_default(),
            Port::Variable(variable.to_string()),
        );
    }

    /// Record a direct edge: `consumer` depends on `provider`.
    pub fn link(&mut self, provider: &str, consumer: &str) {
        tracing::trace!(provider, consumer, "link");
        self.add_template(provider);
        self.add_template(consumer);
        push_port(
            self.outbound.entry(provider.to_string()).or_default(),
            Port::Template(consumer.to_string()),
        );
        push_port(
            self.inbound.entry(consumer.to_string()).or_default(),
            Port::Template(provider.to_string()),
        );
    }

    /// Variables with at least one requirer and no provider, sorted by name.
    pub fn undefined_variables(&self) -> BTreeSet<String> {
        self.requirers
            .keys()
            .filter(|variable| self.providers.get(*variable).is_none_or(Vec::is_empty))
            .cloned()
            .collect()
    }

    /// Distinct templates providing `variable`, in registration order.
    pub fn providers_of(&self, variable: &str) -> &[String] {
        self.providers.get(variable).map_or(&[], Vec::as_slice)
    }

    /// Distinct templates requiring `variable`, in registration order.
    pub fn requirers_of(&self, variable: &str) -> &[String] {
        self.requirers.get(variable).map_or(&[], Vec::as_slice)
    }

    /// Variables provided by more than one template, sorted by variable name.
    pub fn duplicate_providers(&self) -> Vec<DuplicateProvider> {
        let sorted: BTreeMap<&String, &Vec<String>> = self
            .providers
            .iter()
            .filter(|(_, templates)| templates.len() > 1)
            .collect();
        sorted
            .into_iter()
            .map(|(variable, providers)| DuplicateProvider {
                variable: variable.clone(),
                providers: providers.clone(),
            })
            .collect()
    }

    /// Variables `template` provides, in registration order.
    pub fn provided_by(&self, template: &str) -> Vec<String> {
        variables_in(self.outbound.get(template))
    }

    /// Variables `template` requires, in registration order.
    pub fn required_by(&self, template: &str) -> Vec<String> {
        variables_in(self.inbound.get(template))
    }

    /// Distinct templates `template` directly depends on, in discovery order.
    pub fn dependencies_for(&self, template: &str) -> Vec<String> {
        self.neighbors(template, Direction::Upstream)
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Distinct templates that directly depend on `template`, in discovery order.
    pub fn dependents_for(&self, template: &str) -> Vec<String> {
        self.neighbors(template, Direction::Downstream)
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Everything `template` depends on, directly or indirectly (BFS order).
    pub fn transitive_dependencies(&self, template: &str) -> Vec<String> {
        self.reachable(template, Direction::Upstream)
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Everything that depends on `template`, directly or indirectly (BFS order).
    pub fn transitive_dependents(&self, template: &str) -> Vec<String> {
        self.reachable(template, Direction::Downstream)
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// One-hop neighbors, deduplicated, in port order.
    pub(crate) fn neighbors(&self, template: &str, direction: Direction) -> Vec<&str> {
        let (ports, index) = match direction {
            Direction::Upstream => (self.inbound.get(template), &self.providers),
            Direction::Downstream => (self.outbound.get(template), &self.requirers),
        };
        let Some(ports) = ports else {
            return Vec::new();
        };

        let mut seen: HashSet<&str> = HashSet::new();
        let mut out = Vec::new();
        for port in ports {
            match port {
                Port::Variable(variable) => {
                    for other in index.get(variable).into_iter().flatten() {
                        if seen.insert(other.as_str()) {
                            out.push(other.as_str());
                        }
                    }
                }
                Port::Template(other) => {
                    if seen.insert(other.as_str()) {
                        out.push(other.as_str());
                    }
                }
            }
        }
        out
    }

    /// Breadth-first closure over the whole graph. The start template is only
    /// included when a cycle leads back to it.
    pub(crate) fn reachable<'a>(&'a self, template: &'a str, direction: Direction) -> Vec<&'a str> {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut order = Vec::new();
        let mut queue: VecDeque<&str> = VecDeque::new();
        queue.push_back(template);

        while let Some(current) = queue.pop_front() {
            for next in self.neighbors(current, direction) {
                if visited.insert(next) {
                    order.push(next);
                    queue.push_back(next);
                }
            }
        }
        order
    }

    /// Every materialized edge, deduplicated, grouped by consumer in
    /// first-seen order.
    pub fn edges(&self) -> Vec<DependencyEdge> {
        let mut seen = HashSet::new();
        let mut edges = Vec::new();
        for consumer in &self.templates {
            let Some(ports) = self.inbound.get(consumer) else {
                continue;
            };
            for port in ports {
                match port {
                    Port::Variable(variable) => {
                        for provider in self.providers_of(variable) {
                            let edge = DependencyEdge {
                                provider: provider.clone(),
                                consumer: consumer.clone(),
                                origin: EdgeOrigin::Variable(variable.clone()),
                            };
                            if seen.insert(edge.clone()) {
                                edges.push(edge);
                            }
                        }
                    }
                    Port::Template(provider) => {
                        let edge = DependencyEdge {
                            provider: provider.clone(),
                            consumer: consumer.clone(),
                            origin: EdgeOrigin::Link,
                        };
                        if seen.insert(edge.clone()) {
                            edges.push(edge);
                        }
                    }
                }
            }
        }
        edges
    }

    /// Known templates in first-seen order.
    pub fn templates(&self) -> &[String] {
        &self.templates
    }

    /// First-seen position of a template, if known.
    pub fn position(&self, template: &str) -> Option<usize> {
        self.template_index.get(template).copied()
    }

    pub fn contains(&self, template: &str) -> bool {
        self.template_index.contains_key(template)
    }

    pub fn template_count(&self) -> usize {
        self.templates.len()
    }

    /// Number of distinct variable names that are provided or required.
    pub fn variable_count(&self) -> usize {
        self.providers
            .keys()
            .chain(self.requirers.keys())
            .collect::<HashSet<_>>()
            .len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges().len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

fn push_unique(list: &mut Vec<String>, template: &str) {
    if !list.iter().any(|t| t == template) {
        list.push(template.to_string());
    }
}

fn push_port(ports: &mut Vec<Port>, port: Port) {
    if !ports.contains(&port) {
        ports.push(port);
    }
}

fn variables_in(ports: Option<&Vec<Port>>) -> Vec<String> {
    ports
        .into_iter()
        .flatten()
        .filter_map(|port| match port {
            Port::Variable(variable) => Some(variable.clone()),
            Port::Template(_) => None,
        })
        .collect()
}
