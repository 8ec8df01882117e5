//! Configuration loading, validation, and management for QA Copilot.
//!
//! Loads configuration from `~/.qacopilot/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use qacopilot_core::skill::SkillPaths;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.qacopilot/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Anthropic API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Override for the Messages API base URL (proxies, testing)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// Model used for chat and schema generation
    #[serde(default = "default_model")]
    pub model: String,

    /// Max tokens per LLM response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Number of trailing chat messages sent per turn
    #[serde(default = "default_max_history")]
    pub max_history: usize,

    /// Schema, skill and context locations
    #[serde(default)]
    pub paths: PathsConfig,
}

fn default_model() -> String {
    "claude-haiku-4-5-20251001".into()
}
fn default_max_tokens() -> u32 {
    4096
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_history() -> usize {
    qacopilot_core::message::DEFAULT_HISTORY_WINDOW
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("max_history", &self.max_history)
            .field("paths", &self.paths)
            .finish()
    }
}

/// Filesystem locations, relative paths resolve against the working directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory of table schema YAML files
    #[serde(default = "default_tables_dir")]
    pub tables_dir: PathBuf,

    /// Directory holding the SQL mentor SKILL.md and REFERENCE.md
    #[serde(default = "default_skills_dir")]
    pub skills_dir: PathBuf,

    /// The schema generator's SKILL.md
    #[serde(default = "default_schema_gen_skill")]
    pub schema_gen_skill: PathBuf,

    /// Root of `{project}/PROJECT.md` context documents
    #[serde(default = "default_context_dir")]
    pub context_dir: PathBuf,
}

fn default_tables_dir() -> PathBuf {
    PathBuf::from("tables")
}
fn default_skills_dir() -> PathBuf {
    PathBuf::from(".claude/skills/qa-sql-mentor")
}
fn default_schema_gen_skill() -> PathBuf {
    PathBuf::from(".claude/skills/schema-generator/SKILL.md")
}
fn default_context_dir() -> PathBuf {
    PathBuf::from("context")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            tables_dir: default_tables_dir(),
            skills_dir: default_skills_dir(),
            schema_gen_skill: default_schema_gen_skill(),
            context_dir: default_context_dir(),
        }
    }
}

impl PathsConfig {
    /// The skill document locations.
    pub fn skill_paths(&self) -> SkillPaths {
        SkillPaths {
            skills_dir: self.skills_dir.clone(),
            schema_gen_skill: self.schema_gen_skill.clone(),
            context_dir: self.context_dir.clone(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.qacopilot/config.toml).
    ///
    /// Environment variables:
    /// - `QACOPILOT_API_KEY` (highest priority), then `ANTHROPIC_API_KEY`
    /// - `QACOPILOT_MODEL`
    /// - `QACOPILOT_TABLES_DIR`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through a lookup function.
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup("QACOPILOT_API_KEY") {
            self.api_key = Some(key);
        } else if self.api_key.is_none() {
            self.api_key = lookup("ANTHROPIC_API_KEY");
        }

        if let Some(model) = lookup("QACOPILOT_MODEL") {
            self.model = model;
        }

        if let Some(dir) = lookup("QACOPILOT_TABLES_DIR") {
            self.paths.tables_dir = PathBuf::from(dir);
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".qacopilot")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.temperature < 0.0 || self.temperature > 1.0 {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 1.0".into(),
            ));
        }

        if self.max_tokens == 0 {
            return Err(ConfigError::ValidationError("max_tokens must be > 0".into()));
        }

        if self.max_history == 0 {
            return Err(ConfigError::ValidationError("max_history must be > 0".into()));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: None,
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            max_history: default_max_history(),
            paths: PathsConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
