use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

use pathaction_rules::rule::DEFAULT_TAG;

/// CLI configuration loaded from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CliConfig {
    /// Tag used when `--tag` is not given
    #[serde(default = "default_tag")]
    pub default_tag: String,

    /// Allow-list file (default: ~/.config/pathaction/permissions.yml)
    #[serde(default)]
    pub permissions_file: Option<PathBuf>,

    /// Log filter used when `RUST_LOG` is unset (e.g. "info", "pathaction_rules=debug")
    #[serde(default)]
    pub log_level: Option<String>,
}

fn default_tag() -> String {
    DEFAULT_TAG.to_string()
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            default_tag: default_tag(),
            permissions_file: None,
            log_level: None,
        }
    }
}

impl CliConfig {
    /// Return the default config directory path: ~/.config/pathaction/
    pub fn default_config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("could not determine user config directory")?
            .join("pathaction");
        Ok(config_dir)
    }

    /// Return the default config file path.
    pub fn default_config_path() -> Result<PathBuf> {
        Ok(Self::default_config_dir()?.join("config.toml"))
    }

    /// Load config from the given path, or the default path.
    /// Returns default config if the file does not exist.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let config_path = match path {
            Some(p) => PathBuf::from(p),
            None => match Self::default_config_path() {
                Ok(p) => p,
                Err(e) => {
                    debug!(error = %e, "No config directory, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        if config_path.exists() {
            debug!(?config_path, "Loading config");
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("failed to read config: {}", config_path.display()))?;
            let config: Self = toml::from_str(&content)
                .with_context(|| format!("failed to parse config: {}", config_path.display()))?;
            Ok(config)
        } else {
            debug!(?config_path, "Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Resolve the allow-list file path.
    /// Priority: config file > ~/.config/pathaction/permissions.yml.
    pub fn permissions_path(&self) -> Result<PathBuf> {
        match &self.permissions_file {
            Some(path) => Ok(PathBuf::from(pathaction_rules::paths::expand_user(
                &path.to_string_lossy(),
            ))),
            None => Ok(Self::default_config_dir()?.join("permissions.yml")),
        }
    }

    /// Resolve the tag to run.
    /// Priority: cli_override > config file > "main".
    pub fn resolve_tag(&self, cli_override: Option<&str>) -> String {
        match cli_override {
            Some(tag) => tag.to_string(),
            None => self.default_tag.clone(),
        }
    }
}
