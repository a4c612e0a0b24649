//! Configuration loading, validation, and management for docbot.
//!
//! Loads configuration from `~/.docbot/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.docbot/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Provider used for chat completions
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Completion model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Default max tokens per LLM response
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// Query embedding settings
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Embedded corpus location
    #[serde(default)]
    pub corpus: CorpusConfig,

    /// Context fusion settings
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Bot persona and prompt template
    #[serde(default)]
    pub bot: BotConfig,

    /// Per-thread transcript cache
    #[serde(default)]
    pub transcripts: TranscriptConfig,

    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
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
fn default_max_tokens() -> u32 {
    1024
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
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("embedding", &self.embedding)
            .field("corpus", &self.corpus)
            .field("retrieval", &self.retrieval)
            .field("bot", &self.bot)
            .field("transcripts", &self.transcripts)
            .field("gateway", &self.gateway)
            .field("providers", &self.providers)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Provider used for query embeddings (must match the one that built the corpus)
    #[serde(default = "default_provider")]
    pub provider: String,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Dimensionality D shared by every corpus and query vector
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,
}

fn default_embedding_model() -> String {
    "text-embedding-ada-002".into()
}
fn default_dimensions() -> usize {
    1536
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_embedding_model(),
            dimensions: default_dimensions(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusConfig {
    /// Precomputed corpus artifact (JSON array, or JSON Lines for `.jsonl`)
    #[serde(default = "default_corpus_path")]
    pub path: PathBuf,

    /// Origin prepended to relative passage URLs in logs and API output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docs_origin: Option<String>,
}

fn default_corpus_path() -> PathBuf {
    PathBuf::from("knowledge/embeddings.json")
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            path: default_corpus_path(),
            docs_origin: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Assembled context is always strictly shorter than this many characters
    #[serde(default = "default_context_budget")]
    pub context_budget: usize,

    /// Placed between accepted passages
    #[serde(default = "default_separator")]
    pub separator: String,

    /// Which ranking wins when both surface competing passages
    #[serde(default)]
    pub merge_order: MergeOrderConfig,
}

fn default_context_budget() -> usize {
    8000
}
fn default_separator() -> String {
    "\n\n".into()
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            context_budget: default_context_budget(),
            separator: default_separator(),
            merge_order: MergeOrderConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeOrderConfig {
    #[default]
    LatestMessageFirst,
    TranscriptFirst,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    #[serde(default = "default_bot_name")]
    pub name: String,

    /// Phrase the bot uses when the docs don't cover a question
    #[serde(default = "default_escape_word")]
    pub escape_word: String,

    /// Greeting posted when a thread starts (the bot never answers it)
    #[serde(default = "default_first_message")]
    pub first_message: String,

    /// Prompt template file, must contain `BOT_CONTEXT` once
    #[serde(default = "default_prompt_path")]
    pub prompt_path: PathBuf,

    /// Inline template; skips file loading when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_override: Option<String>,
}

fn default_bot_name() -> String {
    "Docbot".into()
}
fn default_escape_word() -> String {
    "Well, you've got me stumped!".into()
}
fn default_first_message() -> String {
    format!("Hi! I'm {}. How may I help?", default_bot_name())
}
fn default_prompt_path() -> PathBuf {
    PathBuf::from("knowledge/prompt.txt")
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: default_bot_name(),
            escape_word: default_escape_word(),
            first_message: default_first_message(),
            prompt_path: default_prompt_path(),
            prompt_override: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptConfig {
    /// Max threads kept; least recently used is evicted beyond this
    #[serde(default = "default_transcript_capacity")]
    pub capacity: usize,

    /// Idle threads older than this are dropped
    #[serde(default = "default_transcript_ttl")]
    pub ttl_secs: u64,
}

fn default_transcript_capacity() -> usize {
    1_000
}
fn default_transcript_ttl() -> u64 {
    24 * 60 * 60
}

impl Default for TranscriptConfig {
    fn default() -> Self {
        Self {
            capacity: default_transcript_capacity(),
            ttl_secs: default_transcript_ttl(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_body_limit_kb")]
    pub body_limit_kb: usize,

    /// Upper bound for one chat turn, embedding and completion calls included
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_port() -> u16 {
    4000
}
fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_body_limit_kb() -> usize {
    100
}
fn default_request_timeout() -> u64 {
    60
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            body_limit_kb: default_body_limit_kb(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
}

impl AppConfig {
    /// Load configuration from the default path (~/.docbot/config.toml).
    ///
    /// Environment overrides:
    /// - `DOCBOT_API_KEY`, then `OPENAI_API_KEY`, then `OPENAI_API_SECRET`
    /// - `DOCBOT_MODEL` or `OPENAI_API_MODEL`
    /// - `DOCBOT_CORPUS`, `DOCBOT_PORT`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
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
    fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if self.api_key.is_none() {
            self.api_key = lookup("DOCBOT_API_KEY")
                .or_else(|| lookup("OPENAI_API_KEY"))
                .or_else(|| lookup("OPENAI_API_SECRET"));
        }

        if let Some(model) = lookup("DOCBOT_MODEL").or_else(|| lookup("OPENAI_API_MODEL")) {
            self.default_model = model;
        }

        if let Some(path) = lookup("DOCBOT_CORPUS") {
            self.corpus.path = PathBuf::from(path);
        }

        if let Some(port) = lookup("DOCBOT_PORT") {
            self.gateway.port = port.parse().map_err(|_| {
                ConfigError::ValidationError(format!("DOCBOT_PORT is not a valid port: {port}"))
            })?;
        }

        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".docbot")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_temperature < 0.0 || self.default_temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.embedding.dimensions == 0 {
            return Err(ConfigError::ValidationError(
                "embedding.dimensions must be > 0".into(),
            ));
        }

        if self.retrieval.context_budget == 0 {
            return Err(ConfigError::ValidationError(
                "retrieval.context_budget must be > 0".into(),
            ));
        }

        if self.transcripts.capacity == 0 {
            return Err(ConfigError::ValidationError(
                "transcripts.capacity must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some() || self.providers.values().any(|p| p.api_key.is_some())
    }

    /// Generate a default config TOML string (for `config init`).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            default_max_tokens: default_max_tokens(),
            embedding: EmbeddingConfig::default(),
            corpus: CorpusConfig::default(),
            retrieval: RetrievalConfig::default(),
            bot: BotConfig::default(),
            transcripts: TranscriptConfig::default(),
            gateway: GatewayConfig::default(),
            providers: HashMap::new(),
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
