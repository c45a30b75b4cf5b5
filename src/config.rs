//! Configuration for persona-engine
//!
//! Supports multiple configuration sources with the following precedence (highest to lowest):
//! 1. CLI arguments
//! 2. Environment variables (PERSONA_ENGINE_* prefix)
//! 3. Configuration file (TOML)
//! 4. Default values

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Prefix shared by every environment override
pub const ENV_PREFIX: &str = "PERSONA_ENGINE_";

/// Main engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Thresholds and scoring constants
    pub analysis: AnalysisSettings,

    /// Rule table location
    pub rules: RulesSettings,

    /// Input limits
    pub input: InputSettings,

    /// Output formatting
    pub output: OutputSettings,

    /// Logging configuration
    pub logging: LoggingSettings,
}

/// Analysis thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Contributing items a label needs before it is reported
    pub min_evidence: usize,

    /// Claims kept per trait dimension
    pub top_k: usize,

    /// Claims kept for the behavior dimension
    pub behavior_top_k: usize,

    /// Evidence ids kept per claim
    pub citation_cap: usize,

    /// Strength added when an item's category matches a hint
    pub category_hint_strength: f64,

    /// Strength of a single keyword or marker hit before weighting
    pub base_hit: f64,

    /// Lowest reported scale position
    pub scale_floor: f64,

    /// Highest reported scale position
    pub scale_ceiling: f64,

    /// Classify dimensions on a thread pool
    pub parallel: bool,
}

/// Rule table settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesSettings {
    /// Custom rule table (bundled table when unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Input document settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputSettings {
    /// Posts kept from the input, in document order
    pub posts_limit: usize,

    /// Comments kept from the input, in document order
    pub comments_limit: usize,
}

/// Output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Pretty-print the persona JSON
    pub pretty: bool,
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level: trace, debug, info, warn, error
    pub level: String,

    /// Log file path (empty = no file logging)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// Number of rotated log files to keep
    pub max_files: u32,

    /// Enable JSON formatted logging
    pub json_format: bool,
}

// Default implementations

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            min_evidence: 2,
            top_k: 3,
            behavior_top_k: 5,
            citation_cap: 5,
            category_hint_strength: 1.0,
            base_hit: 1.0,
            scale_floor: 0.1,
            scale_ceiling: 0.9,
            parallel: false,
        }
    }
}

impl Default for InputSettings {
    fn default() -> Self {
        Self {
            posts_limit: 100,
            comments_limit: 100,
        }
    }
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self { pretty: true }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            file: None,
            max_files: 5,
            json_format: false,
        }
    }
}

impl AnalysisSettings {
    /// Check thresholds and scoring constants
    pub fn validate(&self) -> Result<()> {
        if self.min_evidence < 1 {
            return Err(Error::config_field_invalid(
                "analysis.min_evidence",
                "min_evidence must be at least 1",
            ));
        }
        if self.top_k < 1 || self.behavior_top_k < 1 {
            return Err(Error::config_field_invalid(
                "analysis.top_k",
                "top_k and behavior_top_k must be at least 1",
            ));
        }
        if self.citation_cap < 1 {
            return Err(Error::config_field_invalid(
                "analysis.citation_cap",
                "citation_cap must be at least 1",
            ));
        }
        if !(self.base_hit.is_finite() && self.base_hit > 0.0) {
            return Err(Error::config_field_invalid(
                "analysis.base_hit",
                "base_hit must be a positive number",
            ));
        }
        if !(self.category_hint_strength.is_finite() && self.category_hint_strength >= 0.0) {
            return Err(Error::config_field_invalid(
                "analysis.category_hint_strength",
                "category_hint_strength must not be negative",
            ));
        }
        if !(0.0..=1.0).contains(&self.scale_floor)
            || !(0.0..=1.0).contains(&self.scale_ceiling)
            || self.scale_floor >= self.scale_ceiling
        {
            return Err(Error::config_field_invalid(
                "analysis.scale_floor",
                "scale bounds must satisfy 0 <= scale_floor < scale_ceiling <= 1",
            ));
        }
        Ok(())
    }
}

impl EngineConfig {
    /// Load configuration from file with environment variable overrides
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut config = Self::default();

        // 1. Load from config file if it exists
        if let Some(path) = Self::find_config_file(config_path)? {
            config = Self::from_file(&path)?;
            info!(path = %path.display(), "Configuration loaded from file");
        }

        // 2. Apply environment variable overrides
        config.apply_env_overrides();

        // 3. Expand paths
        config.expand_paths();

        // 4. Validate
        config.validate()?;

        Ok(config)
    }

    /// Parse a configuration file without overrides or validation
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "Loading configuration file");
        let content = fs::read_to_string(path).map_err(|e| Error::IoRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| Error::ConfigParse {
            message: format!("{}: {}", path.display(), e),
            source: Some(e),
        })
    }

    /// Find the configuration file to use
    pub fn find_config_file(explicit_path: Option<&str>) -> Result<Option<PathBuf>> {
        // An explicit path must exist
        if let Some(path) = explicit_path {
            let path = PathBuf::from(expand_path(path));
            if path.exists() {
                return Ok(Some(path));
            }
            return Err(Error::config_not_found(path));
        }

        for path in Self::search_paths() {
            if path.exists() {
                debug!(path = %path.display(), "Found configuration file");
                return Ok(Some(path));
            }
        }

        debug!("No configuration file found, using defaults");
        Ok(None)
    }

    /// Standard locations, in search order
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            // Current directory
            PathBuf::from("persona-engine.toml"),
            PathBuf::from("config.toml"),
        ];
        // User config directory
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("persona-engine").join("config.toml"));
        }
        // Home directory
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".persona-engine").join("config.toml"));
        }
        paths
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // Analysis settings
        if let Some(n) = env_parse("MIN_EVIDENCE") {
            self.analysis.min_evidence = n;
        }
        if let Some(n) = env_parse("TOP_K") {
            self.analysis.top_k = n;
        }
        if let Some(n) = env_parse("BEHAVIOR_TOP_K") {
            self.analysis.behavior_top_k = n;
        }
        if let Some(n) = env_parse("CITATION_CAP") {
            self.analysis.citation_cap = n;
        }
        if let Some(flag) = env_flag("PARALLEL") {
            self.analysis.parallel = flag;
        }

        // Rules, input and output
        if let Some(val) = env_var("RULES") {
            self.rules.path = Some(val);
        }
        if let Some(n) = env_parse("POSTS_LIMIT") {
            self.input.posts_limit = n;
        }
        if let Some(n) = env_parse("COMMENTS_LIMIT") {
            self.input.comments_limit = n;
        }
        if let Some(flag) = env_flag("PRETTY") {
            self.output.pretty = flag;
        }

        // Logging settings
        if let Some(val) = env_var("LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Some(val) = env_var("LOG_FILE") {
            self.logging.file = Some(val);
        }
        if let Some(flag) = env_flag("LOG_JSON") {
            self.logging.json_format = flag;
        }
    }

    /// Expand ~ and other path variables
    fn expand_paths(&mut self) {
        if let Some(ref path) = self.rules.path {
            self.rules.path = Some(expand_path(path));
        }
        if let Some(ref file) = self.logging.file {
            self.logging.file = Some(expand_path(file));
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.analysis.validate()?;

        if self.input.posts_limit == 0 && self.input.comments_limit == 0 {
            return Err(Error::config_field_invalid(
                "input",
                "posts_limit and comments_limit cannot both be 0",
            ));
        }

        // Validate log level
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(Error::config_field_invalid(
                "logging.level",
                format!(
                    "Invalid log level '{}'. Must be one of: {}",
                    self.logging.level,
                    valid_levels.join(", ")
                ),
            ));
        }

        Ok(())
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(format!("{}{}", ENV_PREFIX, name)).ok()
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env_var(name).and_then(|val| val.trim().parse().ok())
}

fn env_flag(name: &str) -> Option<bool> {
    env_var(name).map(|val| val.eq_ignore_ascii_case("true") || val == "1")
}

/// Expand ~ and environment variables in paths
fn expand_path(path: &str) -> String {
    shellexpand::full(path)
        .unwrap_or(std::borrow::Cow::Borrowed(path))
        .into_owned()
}

/// Default location for `config init`
pub fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".persona-engine")
        .join("config.toml")
}

/// Write a commented default configuration file
pub fn init_config(path: Option<&str>, force: bool) -> Result<PathBuf> {
    let config_path = path
        .map(|p| PathBuf::from(expand_path(p)))
        .unwrap_or_else(default_config_path);

    if config_path.exists() && !force {
        return Err(Error::ConfigValidation {
            message: format!(
                "Configuration file already exists: {}. Use --force to overwrite.",
                config_path.display()
            ),
            field: None,
        });
    }

    if let Some(parent) = config_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| Error::IoWrite {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
    }

    fs::write(&config_path, generate_default_config()).map_err(|e| Error::IoWrite {
        path: config_path.clone(),
        source: e,
    })?;

    info!(path = %config_path.display(), "Configuration file created");
    Ok(config_path)
}

/// Default configuration content with comments
pub fn generate_default_config() -> String {
    r#"# persona-engine configuration

[analysis]
# Contributing items a label needs before it is reported
min_evidence = 2

# Claims kept per trait dimension
top_k = 3

# Claims kept for the behavior dimension
behavior_top_k = 5

# Evidence ids cited per claim
citation_cap = 5

# Strength added when an item's category matches a rule hint
category_hint_strength = 1.0

# Strength of one keyword or marker hit before score weighting
base_hit = 1.0

# Scale positions are clamped to [scale_floor, scale_ceiling]
scale_floor = 0.1
scale_ceiling = 0.9

# Classify dimensions on a thread pool
parallel = false

[rules]
# Custom rule table (uses the bundled table when unset)
# path = "~/.persona-engine/rules.toml"

[input]
# Items kept per kind, in document order
posts_limit = 100
comments_limit = 100

[output]
# Pretty-print the persona JSON
pretty = true

[logging]
# Log level: trace, debug, info, warn, error
level = "warn"

# Log file path (comment out to disable file logging)
# file = "~/.persona-engine/logs/persona-engine.log"

# Number of rotated log files to keep
max_files = 5

# Enable JSON formatted logging
json_format = false
"#
    .to_string()
}
