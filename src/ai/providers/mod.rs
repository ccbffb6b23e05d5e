pub mod dummy;
pub mod gemini;

use crate::config::{ChatConfig, ProviderKind};
use rig::providers;

pub use dummy::{DUMMY_RESPONSES, DummyClient};
pub use gemini::GeminiClient;

use super::client::{GenerationError, GenerationResult};

/// Enum to hold different provider clients
pub enum ProviderClient {
    Gemini(GeminiClient),
    OpenAI(providers::openai::Client),
    Anthropic(providers::anthropic::Client),
    Ollama(providers::ollama::Client),
    Dummy(DummyClient),
}

impl ProviderClient {
    /// Build the configured provider client.
    ///
    /// Dummy mode takes priority over the selected provider, so a missing or
    /// placeholder key never produces a network call.
    pub fn from_config(config: &ChatConfig) -> GenerationResult<Self> {
        if config.dummy_mode || config.provider == ProviderKind::Dummy {
            return Ok(Self::Dummy(DummyClient::new(config.dummy_delay)));
        }

        let key = || {
            config
                .endpoint_key
                .clone()
                .ok_or(GenerationError::MissingCredentials(config.provider))
        };

        match config.provider {
            ProviderKind::Gemini => Ok(Self::Gemini(GeminiClient::new(
                config.gemini_base_url.clone(),
                config.model_id.clone(),
                key()?,
                config.request_timeout,
            )?)),
            ProviderKind::OpenAI => Ok(Self::OpenAI(providers::openai::Client::new(&key()?))),
            ProviderKind::Anthropic => {
                Ok(Self::Anthropic(providers::anthropic::Client::new(&key()?)))
            }
            // Ollama endpoint is configured via OLLAMA_HOST; the Rig client
            // reads it itself (defaults to http://localhost:11434)
            ProviderKind::Ollama => Ok(Self::Ollama(providers::ollama::Client::new())),
            ProviderKind::Dummy => Ok(Self::Dummy(DummyClient::new(config.dummy_delay))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ProviderClient::Gemini(_) => "gemini",
            ProviderClient::OpenAI(_) => "openai",
            ProviderClient::Anthropic(_) => "anthropic",
            ProviderClient::Ollama(_) => "ollama",
            ProviderClient::Dummy(_) => "dummy",
        }
    }
}
