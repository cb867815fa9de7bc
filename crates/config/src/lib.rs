//! Configuration loading, validation, and management for toolweave.
//!
//! Loads configuration from `~/.toolweave/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.toolweave/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the completion endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Endpoint provider name ("openai", "openrouter", "ollama")
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Custom endpoint base URL (overrides the provider default)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Model to request
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Max tokens per completion (None = endpoint default)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Maximum loop rounds before the run is abandoned
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// How the loop recognizes a final answer ("final_tool" or "structured_reply")
    #[serde(default = "default_termination_mode")]
    pub termination_mode: String,

    /// What to do with undecodable tool arguments ("fail" or "report")
    #[serde(default = "default_argument_policy")]
    pub argument_policy: String,

    /// Override the built-in system prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,

    /// Transcript persistence
    #[serde(default)]
    pub transcript: TranscriptConfig,
}

fn default_provider() -> String {
    "openai".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_iterations() -> u32 {
    20
}
fn default_termination_mode() -> String {
    "final_tool".into()
}
fn default_argument_policy() -> String {
    "fail".into()
}

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
            .field("provider", &self.provider)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_iterations", &self.max_iterations)
            .field("termination_mode", &self.termination_mode)
            .field("argument_policy", &self.argument_policy)
            .field("system_prompt", &self.system_prompt)
            .field("transcript", &self.transcript)
            .finish()
    }
}

/// Where (and whether) session transcripts are written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptConfig {
    /// Backend: "memory" or "jsonl"
    #[serde(default = "default_transcript_backend")]
    pub backend: String,

    /// Directory for JSONL transcripts (default: ~/.toolweave/sessions)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
}

fn default_transcript_backend() -> String {
    "memory".into()
}

impl Default for TranscriptConfig {
    fn default() -> Self {
        Self {
            backend: default_transcript_backend(),
            dir: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.toolweave/config.toml).
    ///
    /// Also checks environment variables for API keys:
    /// - `TOOLWEAVE_API_KEY` (highest priority)
    /// - `OPENROUTER_API_KEY`
    /// - `OPENAI_API_KEY`
    pub fn load() -> Result<Self, ConfigError> {
        let config_dir = Self::config_dir();
        let config_path = config_dir.join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        // Environment variable overrides (highest priority)
        if config.api_key.is_none() {
            config.api_key = std::env::var("TOOLWEAVE_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENROUTER_API_KEY").ok())
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }

        if let Ok(provider) = std::env::var("TOOLWEAVE_PROVIDER") {
            config.provider = provider;
        }

        if let Ok(model) = std::env::var("TOOLWEAVE_MODEL") {
            config.model = model;
        }

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

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".toolweave")
    }

    /// Directory where JSONL transcripts land unless overridden.
    pub fn sessions_dir(&self) -> PathBuf {
        match &self.transcript.dir {
            Some(dir) => PathBuf::from(dir),
            None => Self::config_dir().join("sessions"),
        }
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.temperature < 0.0 || self.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "max_iterations must be at least 1".into(),
            ));
        }

        match self.termination_mode.as_str() {
            "final_tool" | "structured_reply" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "unknown termination_mode '{other}' (expected 'final_tool' or 'structured_reply')"
                )));
            }
        }

        match self.argument_policy.as_str() {
            "fail" | "report" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "unknown argument_policy '{other}' (expected 'fail' or 'report')"
                )));
            }
        }

        match self.transcript.backend.as_str() {
            "memory" | "jsonl" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "unknown transcript backend '{other}' (expected 'memory' or 'jsonl')"
                )));
            }
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
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
            provider: default_provider(),
            base_url: None,
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: None,
            max_iterations: default_max_iterations(),
            termination_mode: default_termination_mode(),
            argument_policy: default_argument_policy(),
            system_prompt: None,
            transcript: TranscriptConfig::default(),
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
