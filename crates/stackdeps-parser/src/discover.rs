//! Find template files under a template root.

use crate::error::ScanError;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Component, Path, PathBuf};

const IGNORE_FILE: &str = ".stackdepsignore";

fn build_globset(patterns: &[String]) -> Result<Option<GlobSet>, ScanError> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(Some(builder.build()?))
}

/// Collect template files under `root` matching `include` and not `exclude`.
///
/// Honours `.gitignore` and `.stackdepsignore`. Returns paths relative to
/// `root`, sorted so that registration order is stable across runs.
pub fn discover_templates(
    root: &Path,
    include: &[String],
    exclude: &[String],
) -> Result<Vec<PathBuf>, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::MissingRoot(root.to_path_buf()));
    }
    let include_set = build_globset(include)?;
    let exclude_set = build_globset(exclude)?;

    let walker = ignore::WalkBuilder::new(root)
        .hidden(true)
        .git_ignore(true)
        .add_custom_ignore_filename(IGNORE_FILE)
        .build();

    let mut found = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!(error = %err, "skipping unreadable entry");
                continue;
            }
        };
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let rel = path.strip_prefix(root).unwrap_or(path);
        if let Some(ref inc) = include_set
            && !inc.is_match(rel)
        {
            continue;
        }
        if let Some(ref exc) = exclude_set
            && exc.is_match(rel)
        {
            continue;
        }
        found.push(rel.to_path_buf());
    }

    found.sort();
    tracing::debug!(root = %root.display(), count = found.len(), "discovered templates");
    Ok(found)
}

/// Template identifier for a root-relative path: components joined with `/`.
pub fn template_id(rel: &Path) -> String {
    rel.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_id_uses_forward_slashes() {
        let rel: PathBuf = ["network", "vpc.yaml"].iter().collect();
        assert_eq!(template_id(&rel), "network/vpc.yaml");
        assert_eq!(template_id(Path::new("./app.yaml")), "app.yaml");
    }

    #[test]
    fn test_invalid_glob() {
        let err = build_globset(&["[unclosed".to_string()]).unwrap_err();
        assert!(matches!(err, ScanError::Pattern(_)));
    }

    #[test]
    fn test_missing_root() {
        let err = discover_templates(Path::new("/nonexistent/templates"), &[], &[]).unwrap_err();
        assert!(matches!(err, ScanError::MissingRoot(_)));
    }
}
