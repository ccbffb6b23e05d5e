use crate::config::{ChatConfig, ProviderKind};
use async_trait::async_trait;
use rig::client::CompletionClient;
use rig::completion::Prompt;
use thiserror::Error;
use tracing::debug;

use super::providers::ProviderClient;

// ============================================
// Error Types
// ============================================

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("no credentials configured for {0:?}")]
    MissingCredentials(ProviderKind),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("provider error: {0}")]
    Provider(String),
}

pub type GenerationResult<T> = Result<T, GenerationError>;

// ============================================
// Generation Boundary
// ============================================

/// The single outbound dependency of the chat controller.
///
/// `Ok(None)` means the endpoint answered but carried no usable text.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str) -> GenerationResult<Option<String>>;
}

/// Unified AI client wrapper for Synapse
/// Dispatches a prompt to whichever provider the configuration selected
pub struct SynapseAI {
    client: ProviderClient,
    model: String,
}

impl SynapseAI {
    pub fn from_config(config: &ChatConfig) -> GenerationResult<Self> {
        let client = ProviderClient::from_config(config)?;
        debug!(provider = client.name(), model = %config.model_id, "generation client ready");
        Ok(Self {
            client,
            model: config.model_id.clone(),
        })
    }

    pub fn provider_name(&self) -> &'static str {
        self.client.name()
    }

    /// Simple prompt (non-streaming, single-turn)
    pub async fn prompt(&self, message: &str) -> GenerationResult<Option<String>> {
        match &self.client {
            ProviderClient::Gemini(client) => client.complete(message).await,
            ProviderClient::Dummy(client) => Ok(Some(client.complete(message).await)),
            ProviderClient::OpenAI(client) => {
                let agent = client.agent(&self.model).max_tokens(4096).build();

                let reply = agent
                    .prompt(message)
                    .await
                    .map_err(|e| GenerationError::Provider(e.to_string()))?;
                Ok(Some(reply).filter(|text| !text.trim().is_empty()))
            }
            ProviderClient::Anthropic(client) => {
                let agent = client.agent(&self.model).max_tokens(4096).build();

                let reply = agent
                    .prompt(message)
                    .await
                    .map_err(|e| GenerationError::Provider(e.to_string()))?;
                Ok(Some(reply).filter(|text| !text.trim().is_empty()))
            }
            ProviderClient::Ollama(client) => {
                let agent = client.agent(&self.model).build();

                let reply = agent
                    .prompt(message)
                    .await
                    .map_err(|e| GenerationError::Provider(e.to_string()))?;
                Ok(Some(reply).filter(|text| !text.trim().is_empty()))
            }
        }
    }
}

#[async_trait]
impl Generator for SynapseAI {
    async fn generate(&self, prompt: &str) -> GenerationResult<Option<String>> {
        self.prompt(prompt).await
    }
}
