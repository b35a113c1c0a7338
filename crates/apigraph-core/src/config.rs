//! Engine configuration.
//!
//! Loaded with the following priority:
//! 1. Environment variables (highest priority)
//! 2. An explicit TOML file, or `./apigraph.toml` when present
//! 3. Built-in defaults (lowest priority)

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::errors::{ApiGraphError, Result};
use crate::model::HttpMethod;

/// Project-local config file name picked up by [`EngineConfig::load`].
pub const CONFIG_FILE_NAME: &str = "apigraph.toml";

/// Default recursion bound for schema normalization.
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Top-level configuration for graph construction and analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    pub normalizer: NormalizerConfig,
    pub diff: DiffConfig,
    pub drift: DriftConfig,
    pub dependency: DependencyConfig,
}

/// Schema normalizer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Nesting depth beyond which definitions collapse to `Unknown`.
    pub max_depth: usize,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Structural diff settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffConfig {
    /// Keep informational records (comparisons against `Unknown`) in output.
    pub include_informational: bool,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            include_informational: true,
        }
    }
}

/// Drift classification settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriftConfig {
    /// Statuses meaning "access denied"; endpoints seeing only these are unresolved.
    pub auth_failure_statuses: Vec<u16>,
    /// Statuses that count as evidence the endpoint is not implemented.
    pub not_found_statuses: Vec<u16>,
    /// Whether a declared endpoint with no observation at all is reported missing.
    pub unobserved_is_missing: bool,
}

impl Default for DriftConfig {
    fn default() -> Self {
        Self {
            auth_failure_statuses: vec![401, 403],
            not_found_statuses: vec![404, 405, 501],
            unobserved_is_missing: true,
        }
    }
}

/// Dependency inference settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DependencyConfig {
    /// Methods treated as resource-creation verbs.
    pub creation_methods: Vec<HttpMethod>,
}

impl Default for DependencyConfig {
    fn default() -> Self {
        Self {
            creation_methods: vec![HttpMethod::Post],
        }
    }
}

impl EngineConfig {
    /// Load configuration from `./apigraph.toml` if it exists, otherwise defaults.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the file exists but cannot be read, parsed or validated.
    pub fn load() -> Result<Self> {
        if Path::new(CONFIG_FILE_NAME).exists() {
            return Self::from_file(CONFIG_FILE_NAME);
        }
        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific TOML file.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` on read, parse or validation failure.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ApiGraphError::InvalidConfig {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;
        let mut config = Self::from_toml_str(&content)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML text without environment overrides.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` on parse or validation failure.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: EngineConfig =
            toml::from_str(content).map_err(|e| ApiGraphError::InvalidConfig {
                reason: format!("failed to parse config: {}", e),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(depth) = std::env::var("APIGRAPH_MAX_DEPTH") {
            if let Ok(n) = depth.parse() {
                self.normalizer.max_depth = n;
            }
        }
        if let Ok(flag) = std::env::var("APIGRAPH_INCLUDE_INFORMATIONAL") {
            if let Ok(b) = flag.parse() {
                self.diff.include_informational = b;
            }
        }
    }

    /// Reject settings that would make analysis meaningless.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` describing the first offending setting.
    pub fn validate(&self) -> Result<()> {
        if self.normalizer.max_depth == 0 {
            return Err(ApiGraphError::InvalidConfig {
                reason: "normalizer.max_depth must be at least 1".to_string(),
            });
        }
        if self.dependency.creation_methods.is_empty() {
            return Err(ApiGraphError::InvalidConfig {
                reason: "dependency.creation_methods must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Render the defaults as a TOML document.
    pub fn default_config_string() -> String {
        toml::to_string_pretty(&EngineConfig::default()).unwrap_or_default()
    }
}
