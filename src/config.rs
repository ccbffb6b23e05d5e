//! Explicit session configuration.
//!
//! Everything the generation side needs (provider, credentials, model,
//! dummy mode) is gathered here once and handed to [`crate::ai::SynapseAI`]
//! at construction instead of living in module-level globals.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const PLACEHOLDER_API_KEY: &str = "Your API Key";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";
const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-5-sonnet-20241022";
const DEFAULT_OLLAMA_MODEL: &str = "llama3.1:latest";
const DEFAULT_DUMMY_DELAY_MS: u64 = 1000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown provider '{0}' (expected gemini, openai, anthropic, ollama or dummy)")]
    UnknownProvider(String),

    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ProviderKind {
    #[default]
    Gemini,
    OpenAI,
    Anthropic,
    Ollama,
    Dummy,
}

impl ProviderKind {
    /// Conventional environment key holding this provider's credential.
    fn key_var(self) -> Option<&'static str> {
        match self {
            ProviderKind::Gemini => Some("GEMINI_API_KEY"),
            ProviderKind::OpenAI => Some("OPENAI_API_KEY"),
            ProviderKind::Anthropic => Some("ANTHROPIC_API_KEY"),
            ProviderKind::Ollama | ProviderKind::Dummy => None,
        }
    }

    fn default_model(self) -> &'static str {
        match self {
            ProviderKind::Gemini | ProviderKind::Dummy => DEFAULT_GEMINI_MODEL,
            ProviderKind::OpenAI => DEFAULT_OPENAI_MODEL,
            ProviderKind::Anthropic => DEFAULT_ANTHROPIC_MODEL,
            ProviderKind::Ollama => DEFAULT_OLLAMA_MODEL,
        }
    }
}

impl FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "openai" => Ok(Self::OpenAI),
            "anthropic" | "claude" => Ok(Self::Anthropic),
            "ollama" | "local" => Ok(Self::Ollama),
            "dummy" => Ok(Self::Dummy),
            other => Err(ConfigError::UnknownProvider(other.to_string())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatConfig {
    pub provider: ProviderKind,
    pub endpoint_key: Option<String>,
    pub model_id: String,
    pub dummy_mode: bool,
    pub dummy_delay: Duration,
    /// Transport timeout for outbound requests. `None` leaves it to reqwest.
    pub request_timeout: Option<Duration>,
    pub gemini_base_url: String,
    pub pdfium_library_dir: Option<PathBuf>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Gemini,
            endpoint_key: None,
            model_id: DEFAULT_GEMINI_MODEL.to_string(),
            dummy_mode: true,
            dummy_delay: Duration::from_millis(DEFAULT_DUMMY_DELAY_MS),
            request_timeout: None,
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            pdfium_library_dir: None,
        }
    }
}

impl ChatConfig {
    /// Create configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Create configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let provider = match get("SYNAPSE_PROVIDER") {
            Some(raw) => raw.parse()?,
            None => ProviderKind::default(),
        };

        let endpoint_key = get("SYNAPSE_API_KEY")
            .or_else(|| provider.key_var().and_then(|var| get(var)));

        let model_id = get("SYNAPSE_MODEL").unwrap_or_else(|| provider.default_model().to_string());

        let explicit_dummy = get("SYNAPSE_DUMMY").is_some_and(|raw| is_truthy(&raw));
        let missing_key = provider.key_var().is_some()
            && endpoint_key
                .as_deref()
                .is_none_or(|key| key == PLACEHOLDER_API_KEY);
        let dummy_mode = explicit_dummy || missing_key || provider == ProviderKind::Dummy;

        let dummy_delay = match get("SYNAPSE_DUMMY_DELAY_MS") {
            Some(raw) => Duration::from_millis(parse_number("SYNAPSE_DUMMY_DELAY_MS", &raw)?),
            None => Duration::from_millis(DEFAULT_DUMMY_DELAY_MS),
        };

        let request_timeout = get("SYNAPSE_REQUEST_TIMEOUT_SECS")
            .map(|raw| parse_number("SYNAPSE_REQUEST_TIMEOUT_SECS", &raw))
            .transpose()?
            .map(Duration::from_secs);

        let gemini_base_url = get("SYNAPSE_GEMINI_BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string());

        Ok(Self {
            provider,
            endpoint_key,
            model_id,
            dummy_mode,
            dummy_delay,
            request_timeout,
            gemini_base_url,
            pdfium_library_dir: get("PDFIUM_LIB_DIR").map(PathBuf::from),
        })
    }

    pub fn dummy() -> Self {
        Self {
            provider: ProviderKind::Dummy,
            ..Self::default()
        }
    }
}

fn is_truthy(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_number(key: &'static str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: raw.to_string(),
    })
}
