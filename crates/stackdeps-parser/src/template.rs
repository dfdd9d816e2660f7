//! Extract provides/requires/links from a single template document.

use serde_yaml::Value;

/// What one template contributes to the dependency graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateSpec {
    /// Template identifier: `/`-separated path relative to the template root.
    pub id: String,
    /// Variables this template produces.
    pub provides: Vec<String>,
    /// Variables this template consumes.
    pub requires: Vec<String>,
    /// Templates this one directly depends on.
    pub depends_on: Vec<String>,
}

impl TemplateSpec {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }
}

/// Parse a template and extract its dependency declarations.
///
/// - every key under `Outputs` is provided, and so is `Export.Name` when it
///   is a plain string;
/// - every key under `Parameters` without a `Default` is required;
/// - `Metadata.DependsOn` (string or list) names direct dependencies.
///
/// An output that re-exports one of the template's own required parameters
/// is not provided: the value still originates upstream.
///
/// Documents that are not a mapping (including empty files) yield an empty spec.
/// Short-form intrinsic tags such as `!Ref` parse as tagged values and are ignored.
pub fn extract_template(id: &str, source: &str) -> Result<TemplateSpec, serde_yaml::Error> {
    let doc: Value = serde_yaml::from_str(source)?;
    let mut spec = TemplateSpec::new(id);
    if !doc.is_mapping() {
        return Ok(spec);
    }

    if let Some(outputs) = doc.get("Outputs").and_then(Value::as_mapping) {
        for (key, output) in outputs {
            if let Some(name) = key.as_str() {
                push_unique(&mut spec.provides, name);
            }
            // Tagged names (`!Sub ...`) are only known after rendering.
            if let Some(Value::String(export)) = output.get("Export").and_then(|e| e.get("Name")) {
                push_unique(&mut spec.provides, export);
            }
        }
    }

    if let Some(parameters) = doc.get("Parameters").and_then(Value::as_mapping) {
        for (key, parameter) in parameters {
            let Some(name) = key.as_str() else {
                continue;
            };
            if parameter.get("Default").is_none() {
                push_unique(&mut spec.requires, name);
            }
        }
    }

    spec.provides.retain(|name| !spec.requires.contains(name));

    if let Some(depends_on) = doc.get("Metadata").and_then(|m| m.get("DependsOn")) {
        match depends_on {
            Value::String(single) => push_unique(&mut spec.depends_on, single),
            Value::Sequence(items) => {
                for item in items.iter().filter_map(Value::as_str) {
                    push_unique(&mut spec.depends_on, item);
                }
            }
            _ => {}
        }
    }

    Ok(spec)
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|v| v == value) {
        list.push(value.to_string());
    }
}
