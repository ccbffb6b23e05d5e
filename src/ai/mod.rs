//! AI module for Synapse
//!
//! This module provides the generation boundary used by the chat controller.
//! A prompt string goes in; a reply string (or nothing usable) comes back.
//!
//! # Architecture
//!
//! - `client` - The [`Generator`] trait and `SynapseAI`, which dispatches to
//!   the configured provider
//! - `providers` - Provider-specific implementations (Gemini over HTTP,
//!   Rig-based OpenAI/Anthropic/Ollama, canned dummy replies)
//!
//! # Usage
//!
//! ```rust,no_run
//! use synapse::ai::{Generator, SynapseAI};
//! use synapse::config::ChatConfig;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let ai = SynapseAI::from_config(&ChatConfig::from_env()?)?;
//! let reply = ai.generate("Hello!").await?;
//! # Ok(())
//! # }
//! ```

mod client;
mod providers;

pub use client::{GenerationError, GenerationResult, Generator, SynapseAI};
pub use providers::{DUMMY_RESPONSES, DummyClient, GeminiClient};
