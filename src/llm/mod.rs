//! LLM integration for Health Assist.
//!
//! A single `LlmProvider` trait fronts every oracle use: field extraction,
//! language detection, translation, and chat replies. The one concrete
//! implementation speaks the OpenAI-compatible chat-completions protocol.

pub mod openai;
pub mod provider;

#[cfg(test)]
pub(crate) mod testing;

pub use openai::OpenAiProvider;
pub use provider::{ChatMessage, CompletionRequest, CompletionResponse, LlmProvider, Role};

use std::sync::Arc;

use secrecy::SecretString;

use crate::error::LlmError;

/// Configuration for creating an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: SecretString,
    pub api_url: String,
    pub model: String,
}

/// Create an LLM provider from configuration.
pub fn create_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    let provider = OpenAiProvider::new(config)?;
    tracing::info!(model = %config.model, "Using chat-completion model");
    Ok(Arc::new(provider))
}
