//! Configuration for template discovery and validation.
//!
//! Load order: `.stackdeps/config.toml` → environment variables → defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CONFIG_DIR: &str = ".stackdeps";
const CONFIG_FILE: &str = "config.toml";

/// Top-level stackdeps configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StackdepsConfig {
    pub templates: TemplatesConfig,
    pub validation: ValidationConfig,
    /// Explicit ordering constraints that no variable expresses.
    pub links: Vec<LinkConfig>,
}

/// Where templates live and which files count as templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplatesConfig {
    /// Template root, relative to the project root unless absolute.
    pub root: PathBuf,
    /// Glob patterns (relative to the template root) selecting template files.
    pub include: Vec<String>,
    /// Glob patterns excluding files that `include` matched.
    pub exclude: Vec<String>,
}

/// How strictly a project is validated before deploy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Treat a variable provided by more than one template as an error.
    pub strict_providers: bool,
    /// Report undefined variables as warnings instead of failing.
    pub allow_undefined: bool,
    /// Minimum normalized similarity for a "did you mean" suggestion.
    pub suggestion_threshold: f64,
}

/// An explicit `provider → consumer` dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkConfig {
    pub provider: String,
    pub consumer: String,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("templates"),
            include: vec![
                "**/*.yaml".to_string(),
                "**/*.yml".to_string(),
                "**/*.json".to_string(),
                "**/*.template".to_string(),
            ],
            exclude: Vec::new(),
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            strict_providers: false,
            allow_undefined: false,
            suggestion_threshold: 0.8,
        }
    }
}

/// Helper to parse an env var and apply it to a config field.
///
/// Values that fail to parse leave the field unchanged.
fn env_override<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &str,
    target: &mut T,
) {
    let Some(value) = lookup(var) else {
        return;
    };
    match value.parse() {
        Ok(parsed) => *target = parsed,
        Err(_) => tracing::warn!(var, value = %value, "ignoring unparsable environment override"),
    }
}

/// Path of the config file for a given project root.
pub fn config_path(project_root: &Path) -> PathBuf {
    project_root.join(CONFIG_DIR).join(CONFIG_FILE)
}

impl StackdepsConfig {
    /// Load config from `.stackdeps/config.toml` in the project root, with env
    /// var overrides. Falls back to defaults if no config file exists.
    pub fn load(project_root: &Path) -> Result<Self> {
        Self::load_with_env(project_root, &|var| std::env::var(var).ok())
    }

    fn load_with_env(
        project_root: &Path,
        lookup: &impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let path = config_path(project_root);

        let mut config = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config from {}", path.display()))?;
            toml::from_str(&content)
                .with_context(|| format!("failed to parse config {}", path.display()))?
        } else {
            Self::default()
        };

        config.apply_env(lookup);
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self, lookup: &impl Fn(&str) -> Option<String>) {
        env_override(lookup, "STACKDEPS_TEMPLATE_ROOT", &mut self.templates.root);
        env_override(
            lookup,
            "STACKDEPS_STRICT_PROVIDERS",
            &mut self.validation.strict_providers,
        );
        env_override(
            lookup,
            "STACKDEPS_ALLOW_UNDEFINED",
            &mut self.validation.allow_undefined,
        );
        env_override(
            lookup,
            "STACKDEPS_SUGGESTION_THRESHOLD",
            &mut self.validation.suggestion_threshold,
        );
    }

    fn validate(&self) -> Result<()> {
        let threshold = self.validation.suggestion_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            anyhow::bail!("suggestion_threshold ({threshold}) must be between 0.0 and 1.0");
        }
        if self.templates.include.is_empty() {
            anyhow::bail!("templates.include must list at least one glob pattern");
        }
        Ok(())
    }

    /// Absolute template root for a project.
    pub fn template_root(&self, project_root: &Path) -> PathBuf {
        if self.templates.root.is_absolute() {
            self.templates.root.clone()
        } else {
            project_root.join(&self.templates.root)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StackdepsConfig::default();
        assert_eq!(config.templates.root, PathBuf::from("templates"));
        assert_eq!(config.templates.include.len(), 4);
        assert!(config.templates.exclude.is_empty());
        assert!(!config.validation.strict_providers);
        assert!(!config.validation.allow_undefined);
        assert_eq!(config.validation.suggestion_threshold, 0.8);
        assert!(config.links.is_empty());
    }

    #[test]
    fn test_config_from_toml() {
        let toml_str = r#"
[templates]
root = "cfn"
exclude = ["legacy/**"]

[validation]
strict_providers = true

[[links]]
provider = "vpc/base.yaml"
consumer = "app/service.yaml"
"#;
        let config: StackdepsConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.templates.root, PathBuf::from("cfn"));
        assert_eq!(config.templates.exclude, vec!["legacy/**"]);
        assert!(config.validation.strict_providers);
        assert_eq!(
            config.links,
            vec![LinkConfig {
                provider: "vpc/base.yaml".to_string(),
                consumer: "app/service.yaml".to_string(),
            }]
        );
        // Defaults for unspecified fields
        assert_eq!(config.templates.include.len(), 4);
        assert_eq!(config.validation.suggestion_threshold, 0.8);
    }

    #[test]
    fn test_config_load_nonexistent() {
        let config = StackdepsConfig::load(Path::new("/nonexistent/path")).unwrap();
        assert_eq!(config.templates.root, PathBuf::from("templates"));
    }

    #[test]
    fn test_load_rejects_bad_threshold() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join(".stackdeps");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("config.toml"),
            "[validation]\nsuggestion_threshold = 1.5\n",
        )
        .unwrap();

        let err = StackdepsConfig::load(tmp.path()).unwrap_err();
        assert!(err.to_string().contains("suggestion_threshold"));
    }

    #[test]
    fn test_load_rejects_empty_include() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join(".stackdeps");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("config.toml"), "[templates]\ninclude = []\n").unwrap();

        assert!(StackdepsConfig::load(tmp.path()).is_err());
    }

    #[test]
    fn test_template_root_resolution() {
        let mut config = StackdepsConfig::default();
        assert_eq!(
            config.template_root(Path::new("/proj")),
            PathBuf::from("/proj/templates")
        );
        config.templates.root = PathBuf::from("/abs/cfn");
        assert_eq!(
            config.template_root(Path::new("/proj")),
            PathBuf::from("/abs/cfn")
        );
    }

    fn write_config(content: &str) -> tempfile::TempDir {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join(".stackdeps");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("config.toml"), content).unwrap();
        tmp
    }

    fn env_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: Vec<(String, String)> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |var| {
            vars.iter()
                .find(|(k, _)| k == var)
                .map(|(_, v)| v.clone())
        }
    }

    #[test]
    fn test_env_overrides_replace_file_values() {
        let tmp = write_config(
            "[templates]\nroot = \"cfn\"\n\n[validation]\nsuggestion_threshold = 0.5\n",
        );
        let env = env_from(&[
            ("STACKDEPS_TEMPLATE_ROOT", "infra"),
            ("STACKDEPS_STRICT_PROVIDERS", "true"),
            ("STACKDEPS_ALLOW_UNDEFINED", "true"),
            ("STACKDEPS_SUGGESTION_THRESHOLD", "0.9"),
        ]);

        let config = StackdepsConfig::load_with_env(tmp.path(), &env).unwrap();
        assert_eq!(config.templates.root, PathBuf::from("infra"));
        assert!(config.validation.strict_providers);
        assert!(config.validation.allow_undefined);
        assert_eq!(config.validation.suggestion_threshold, 0.9);
    }

    #[test]
    fn test_env_threshold_out_of_range_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let env = env_from(&[("STACKDEPS_SUGGESTION_THRESHOLD", "2.0")]);

        let err = StackdepsConfig::load_with_env(tmp.path(), &env).unwrap_err();
        assert!(err.to_string().contains("suggestion_threshold"));
    }

    #[test]
    fn test_unparsable_env_value_is_ignored() {
        let tmp = write_config("[validation]\nstrict_providers = true\n");
        let env = env_from(&[
            ("STACKDEPS_STRICT_PROVIDERS", "1"),
            ("STACKDEPS_SUGGESTION_THRESHOLD", "high"),
        ]);

        let config = StackdepsConfig::load_with_env(tmp.path(), &env).unwrap();
        assert!(config.validation.strict_providers);
        assert_eq!(config.validation.suggestion_threshold, 0.8);
    }
}
