use crate::core::error::{ConfigError, ReleaseError, ReleaseResult, ResultExt};
use crate::version::{DEFAULT_CLASS_PREFIX, DEFAULT_FORMULA_NAME};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration for dbt-release
/// Searched in order: release.toml, .release.toml, .config/release.toml
///
/// Every section is optional; a missing file means all defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReleaseConfig {
  #[serde(default)]
  pub product: ProductConfig,
  #[serde(default)]
  pub tools: ToolsConfig,
  #[serde(default)]
  pub index: IndexConfig,
  #[serde(default)]
  pub homebrew: HomebrewConfig,
}

/// What gets released
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductConfig {
  /// Distribution name on the package index and formula base name
  #[serde(default = "default_product_name")]
  pub name: String,

  /// Class name prefix for formulas (`Dbt` renders `DbtAT0152`)
  #[serde(default = "default_class_prefix")]
  pub formula_class_prefix: String,

  /// Subpackage directories relative to the source root, built in order
  #[serde(default = "default_subpackages")]
  pub subpackages: Vec<PathBuf>,

  /// File patterns recognised as build artifacts
  #[serde(default = "default_artifact_patterns")]
  pub artifact_patterns: Vec<String>,
}

fn default_product_name() -> String {
  DEFAULT_FORMULA_NAME.to_string()
}

fn default_class_prefix() -> String {
  DEFAULT_CLASS_PREFIX.to_string()
}

fn default_subpackages() -> Vec<PathBuf> {
  [
    "core",
    "plugins/postgres",
    "plugins/redshift",
    "plugins/bigquery",
    "plugins/snowflake",
  ]
  .into_iter()
  .map(PathBuf::from)
  .collect()
}

fn default_artifact_patterns() -> Vec<String> {
  vec!["*.tar.gz".to_string(), "*.whl".to_string()]
}

impl Default for ProductConfig {
  fn default() -> Self {
    Self {
      name: default_product_name(),
      formula_class_prefix: default_class_prefix(),
      subpackages: default_subpackages(),
      artifact_patterns: default_artifact_patterns(),
    }
  }
}

/// Program names for external tools
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
  #[serde(default = "default_bumpversion")]
  pub bumpversion: String,
  #[serde(default = "default_python")]
  pub python: String,
  #[serde(default = "default_twine")]
  pub twine: String,
  #[serde(default = "default_brew")]
  pub brew: String,
  #[serde(default = "default_git")]
  pub git: String,
}

fn default_bumpversion() -> String {
  "bumpversion".to_string()
}

fn default_python() -> String {
  "python".to_string()
}

fn default_twine() -> String {
  "twine".to_string()
}

fn default_brew() -> String {
  "brew".to_string()
}

fn default_git() -> String {
  "git".to_string()
}

impl Default for ToolsConfig {
  fn default() -> Self {
    Self {
      bumpversion: default_bumpversion(),
      python: default_python(),
      twine: default_twine(),
      brew: default_brew(),
      git: default_git(),
    }
  }
}

/// Package index targets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
  /// twine `--repository` name for the staging index (from ~/.pypirc)
  #[serde(default = "default_staging_repository")]
  pub staging_repository: String,

  /// Page to check before promoting to production; `{version}` is substituted
  #[serde(default = "default_staging_url")]
  pub staging_url: String,
}

fn default_staging_repository() -> String {
  "pypitest".to_string()
}

fn default_staging_url() -> String {
  "https://test.pypi.org/project/dbt/{version}/".to_string()
}

impl Default for IndexConfig {
  fn default() -> Self {
    Self {
      staging_repository: default_staging_repository(),
      staging_url: default_staging_url(),
    }
  }
}

impl IndexConfig {
  pub fn staging_url_for(&self, version: &str) -> String {
    self.staging_url.replace("{version}", version)
  }
}

/// Homebrew formula generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HomebrewConfig {
  /// Helper installed into the sandbox to introspect the released package
  #[serde(default = "default_helper_package")]
  pub helper_package: String,

  /// Interpreter `MAJOR.MINOR` Homebrew builds with
  #[serde(default = "default_required_python")]
  pub required_python: String,
}

fn default_helper_package() -> String {
  "homebrew-pypi-poet".to_string()
}

fn default_required_python() -> String {
  "3.7".to_string()
}

impl Default for HomebrewConfig {
  fn default() -> Self {
    Self {
      helper_package: default_helper_package(),
      required_python: default_required_python(),
    }
  }
}

impl HomebrewConfig {
  /// Parse `required_python` into (major, minor)
  pub fn required_python_version(&self) -> Option<(u64, u64)> {
    let (major, minor) = self.required_python.trim().split_once('.')?;
    Some((major.parse().ok()?, minor.parse().ok()?))
  }
}

impl ReleaseConfig {
  /// Find config file in search order: release.toml, .release.toml, .config/release.toml
  pub fn find_config_path(path: &Path) -> Option<PathBuf> {
    let candidates = vec![
      path.join("release.toml"),
      path.join(".release.toml"),
      path.join(".config").join("release.toml"),
    ];

    candidates.into_iter().find(|p| p.exists())
  }

  /// Load config from the source root, falling back to defaults when absent
  pub fn load(path: &Path) -> ReleaseResult<Self> {
    let Some(config_path) = Self::find_config_path(path) else {
      tracing::debug!(root = %path.display(), "no release.toml found, using defaults");
      return Ok(Self::default());
    };

    let content = fs::read_to_string(&config_path)
      .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
    let config: ReleaseConfig = toml_edit::de::from_str(&content).map_err(|e| {
      ReleaseError::Config(ConfigError::Invalid {
        path: config_path.clone(),
        reason: e.to_string(),
      })
    })?;

    config.validate(&config_path)?;
    tracing::debug!(path = %config_path.display(), "loaded release config");

    Ok(config)
  }

  /// Validate values that serde accepts but the release cannot use
  pub fn validate(&self, config_path: &Path) -> ReleaseResult<()> {
    if self.product.name.trim().is_empty() {
      return Err(ReleaseError::Config(ConfigError::MissingField {
        field: "product.name".to_string(),
      }));
    }

    if self.product.artifact_patterns.is_empty() {
      return Err(ReleaseError::Config(ConfigError::MissingField {
        field: "product.artifact_patterns".to_string(),
      }));
    }

    if self.product.subpackages.is_empty() {
      return Err(ReleaseError::Config(ConfigError::MissingField {
        field: "product.subpackages".to_string(),
      }));
    }

    if let Some(bad) = self
      .product
      .subpackages
      .iter()
      .find(|p| p.is_absolute() || p.as_os_str().is_empty())
    {
      return Err(ReleaseError::Config(ConfigError::Invalid {
        path: config_path.to_path_buf(),
        reason: format!(
          "subpackage '{}' must be a non-empty path relative to the source root",
          bad.display()
        ),
      }));
    }

    if self.homebrew.required_python_version().is_none() {
      return Err(ReleaseError::Config(ConfigError::Invalid {
        path: config_path.to_path_buf(),
        reason: format!(
          "required_python '{}' must be MAJOR.MINOR (e.g. '3.7')",
          self.homebrew.required_python
        ),
      }));
    }

    Ok(())
  }
}
