//! Assistant configuration.
//!
//! Config file: ~/.config/flowassist/config.toml. Missing file or missing
//! keys fall back to documented defaults; the file is only read at session
//! start and written at session end. A `ProviderConfig` snapshot is passed
//! into every generation call, so edits never affect in-flight requests.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Default local provider endpoint (Ollama).
pub const DEFAULT_HOST: &str = "http://localhost:11434";
/// Default local model.
pub const DEFAULT_MODEL: &str = "qwen2.5:7b";
/// Default remote fallback model.
pub const DEFAULT_FALLBACK_MODEL: &str = "gpt-4o-mini";
/// Default remote fallback endpoint (OpenAI-compatible).
pub const DEFAULT_FALLBACK_URL: &str = "https://api.openai.com/v1";
/// Env var holding the remote bearer token.
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_fallback_model() -> String {
    DEFAULT_FALLBACK_MODEL.to_string()
}

fn default_fallback_url() -> String {
    DEFAULT_FALLBACK_URL.to_string()
}

fn default_api_key_env() -> String {
    DEFAULT_API_KEY_ENV.to_string()
}

fn default_temperature() -> f64 {
    0.7
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_true() -> bool {
    true
}

/// Immutable provider snapshot passed into the generation fallback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Local provider host (Ollama-style API).
    #[serde(default = "default_host")]
    pub host: String,

    /// Local model name.
    #[serde(default = "default_model")]
    pub model: String,

    /// Remote model used after a local failure.
    #[serde(default = "default_fallback_model")]
    pub fallback_model: String,

    /// Remote OpenAI-compatible base URL.
    #[serde(default = "default_fallback_url")]
    pub fallback_url: String,

    /// Env var name holding the remote API key. Never the key itself.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Stream local responses chunk by chunk.
    #[serde(default = "default_true")]
    pub streaming: bool,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            model: default_model(),
            fallback_model: default_fallback_model(),
            fallback_url: default_fallback_url(),
            api_key_env: default_api_key_env(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            streaming: true,
        }
    }
}

/// Voice flags. The engine never touches speech APIs; it only gates whether
/// speak requests are emitted on the outbound event stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VoiceConfig {
    #[serde(default)]
    pub enabled: bool,
}

fn default_history_window() -> usize {
    6
}

fn default_max_messages() -> usize {
    200
}

/// Top-level assistant configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantConfig {
    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub voice: VoiceConfig,

    /// How many trailing messages are sent as conversation context.
    #[serde(default = "default_history_window")]
    pub history_window: usize,

    /// Ring-buffer cap on the in-memory message log.
    #[serde(default = "default_max_messages")]
    pub max_messages: usize,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            voice: VoiceConfig::default(),
            history_window: default_history_window(),
            max_messages: default_max_messages(),
        }
    }
}

impl AssistantConfig {
    /// Default config file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("/etc"))
            .join("flowassist")
            .join("config.toml")
    }

    /// Load from the default path, falling back to defaults when absent.
    pub fn load() -> Self {
        Self::load_from(&Self::default_path())
    }

    /// Load from an explicit path. A missing file yields defaults; a present
    /// but unparsable file logs a warning and also yields defaults, so a
    /// config typo never prevents startup.
    pub fn load_from(path: &std::path::Path) -> Self {
        match fs::read_to_string(path) {
            Ok(raw) => match toml::from_str(&raw) {
                Ok(cfg) => cfg,
                Err(e) => {
                    tracing::warn!("invalid config at {}: {} - using defaults", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    /// Persist to an explicit path, creating parent directories.
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating config dir {}", parent.display()))?;
        }
        let raw = toml::to_string_pretty(self).context("serializing config")?;
        fs::write(path, raw).with_context(|| format!("writing config {}", path.display()))?;
        Ok(())
    }
}
