//! LLM Client module
//!
//! Provider clients behind one stateless [`LlmClient`] trait. The router
//! decides which client serves a request; these types only know how to talk
//! to one provider.

use std::sync::Arc;

use tracing::debug;

mod anthropic;
pub mod client;
mod error;
mod http;
mod ollama;
mod openai;
mod types;

pub use anthropic::AnthropicClient;
pub use client::LlmClient;
pub use error::LlmError;
pub use ollama::OllamaClient;
pub use openai::OpenAIClient;
pub use types::{CompletionRequest, CompletionResponse, Message, Role, StopReason, TokenUsage};

use crate::config::{ProviderKind, ResolvedBackendConfig};

/// Create an LLM client for a resolved backend configuration
///
/// Remote providers fail here when their API key is missing, which the
/// registry treats as "backend not available".
pub fn create_client_from_resolved(config: &ResolvedBackendConfig) -> Result<Arc<dyn LlmClient>, LlmError> {
    debug!(
        name = %config.name,
        provider = %config.provider,
        model = %config.model,
        "create_client_from_resolved: called"
    );
    match config.provider {
        ProviderKind::Ollama => {
            debug!("create_client_from_resolved: creating Ollama client");
            Ok(Arc::new(OllamaClient::from_config(config)?))
        }
        ProviderKind::OpenAI => {
            debug!("create_client_from_resolved: creating OpenAI client");
            Ok(Arc::new(OpenAIClient::from_config(config)?))
        }
        ProviderKind::Anthropic => {
            debug!("create_client_from_resolved: creating Anthropic client");
            Ok(Arc::new(AnthropicClient::from_config(config)?))
        }
    }
}
