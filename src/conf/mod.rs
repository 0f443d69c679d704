//! Write-path configuration: chunking and rollup rules.
//!
//! Loaded from TOML, e.g.:
//!
//! ```toml
//! chunk_span = 600
//!
//! [[rollups]]
//! name = "default"
//! pattern = "*"
//! spans = [600, 7200]
//! methods = ["avg", "min", "max"]
//! ```

use crate::pattern::glob_match;
use serde::Deserialize;
use std::fmt;
use std::path::Path;

/// Rollup function requested for a metric. `avg` is derived at read time
/// from the sum and count series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggMethod {
    Avg,
    Sum,
    Min,
    Max,
    Lst,
}

/// One rollup rule: series whose name matches `pattern` get, for each span,
/// the derived series the methods require.
#[derive(Debug, Clone, Deserialize)]
pub struct RollupRule {
    pub name: String,
    pub pattern: String,
    /// Window widths in seconds, one aggregator per span.
    pub spans: Vec<u32>,
    pub methods: Vec<AggMethod>,
}

impl RollupRule {
    pub fn matches(&self, metric_name: &str) -> bool {
        glob_match(&self.pattern, metric_name)
    }
}

fn default_chunk_span() -> u32 {
    600
}

/// Top-level configuration for the write path.
#[derive(Debug, Clone, Deserialize)]
pub struct WritePathConfig {
    /// Width in seconds of one in-memory chunk.
    #[serde(default = "default_chunk_span")]
    pub chunk_span: u32,
    #[serde(default)]
    pub rollups: Vec<RollupRule>,
}

impl Default for WritePathConfig {
    fn default() -> Self {
        WritePathConfig {
            chunk_span: default_chunk_span(),
            rollups: Vec::new(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {}", e),
            ConfigError::Parse(e) => write!(f, "config parse error: {}", e),
            ConfigError::Invalid(msg) => write!(f, "invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::Parse(e)
    }
}

impl WritePathConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: WritePathConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_span == 0 {
            return Err(ConfigError::Invalid("chunk_span must be > 0".to_string()));
        }
        for rule in &self.rollups {
            if rule.pattern.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "rollup rule {:?} has an empty pattern",
                    rule.name
                )));
            }
            if rule.spans.is_empty() || rule.spans.contains(&0) {
                return Err(ConfigError::Invalid(format!(
                    "rollup rule {:?} needs spans > 0",
                    rule.name
                )));
            }
            if rule.methods.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "rollup rule {:?} has no aggregation methods",
                    rule.name
                )));
            }
        }
        Ok(())
    }

    /// First rule matching `metric_name`, if any. Rule order is precedence.
    pub fn rule_for(&self, metric_name: &str) -> Option<&RollupRule> {
        self.rollups.iter().find(|rule| rule.matches(metric_name))
    }
}
