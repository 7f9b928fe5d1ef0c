use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ConfigFile {
    pub version: u32,
    #[serde(default)]
    pub normalize: NormalizeConfig,
    #[serde(default)]
    pub wire: WireConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NormalizeConfig {
    /// Deepest allowed nesting of object fields (default: 32).
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// What to do when one collection level declares a field name twice.
    #[serde(default)]
    pub duplicate_fields: DuplicatePolicy,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self { max_depth: default_max_depth(), duplicate_fields: DuplicatePolicy::default() }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct WireConfig {
    /// Prefix of generated definition names (default: `_ref_`).
    #[serde(default = "default_ref_prefix")]
    pub ref_prefix: String,
}

impl Default for WireConfig {
    fn default() -> Self {
        Self { ref_prefix: default_ref_prefix() }
    }
}

/// Resolution of a field name declared more than once in one collection level,
/// e.g. under both `required` and `optional`.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// Fail with a malformed-schema error.
    #[default]
    Reject,
    /// The later declaration replaces the earlier one.
    LastWins,
}

impl DuplicatePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reject => "reject",
            Self::LastWins => "last-wins",
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub file_level: Option<String>,
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level(), file_level: None, file: None }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_depth() -> usize {
    32
}

fn default_ref_prefix() -> String {
    "_ref_".to_string()
}

/// Knobs consumed by the normalizer and the generators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub max_depth: usize,
    pub duplicate_fields: DuplicatePolicy,
    pub ref_prefix: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            duplicate_fields: DuplicatePolicy::default(),
            ref_prefix: default_ref_prefix(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// File the configuration was read from, if any.
    pub source: Option<PathBuf>,
    pub settings: Settings,
    pub logging: LoggingConfig,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self { source: None, settings: Settings::default(), logging: LoggingConfig::default() }
    }
}
