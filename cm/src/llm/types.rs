//! LLM request/response types
//!
//! Provider-agnostic request and response shapes. Each provider client
//! converts these into its own wire format.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// A completion request - everything needed for one LLM call
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Optional system instruction
    pub system_prompt: Option<String>,

    /// Conversation turns (the router always sends exactly one user turn)
    pub messages: Vec<Message>,

    /// Max tokens for response (capped by the backend's configured limit)
    pub max_tokens: u32,
}

impl CompletionRequest {
    /// A single-turn request: optional system message plus one user message
    pub fn single_turn(prompt: impl Into<String>, system_message: Option<&str>, max_tokens: u32) -> Self {
        debug!(has_system = system_message.is_some(), %max_tokens, "CompletionRequest::single_turn: called");
        Self {
            system_prompt: system_message.map(str::to_string),
            messages: vec![Message::user(prompt)],
            max_tokens,
        }
    }
}

/// A message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Create a user message
    pub fn user(text: impl Into<String>) -> Self {
        debug!("Message::user: called");
        Self {
            role: Role::User,
            content: text.into(),
        }
    }
}

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
        }
    }
}

/// Response from a completion request
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// Text content (if any)
    pub content: Option<String>,

    /// Why the model stopped
    pub stop_reason: StopReason,

    /// Token usage for cost tracking
    pub usage: TokenUsage,
}

impl CompletionResponse {
    /// A plain text response, used by tests and simple providers
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            stop_reason: StopReason::EndTurn,
            usage: TokenUsage::default(),
        }
    }
}

/// Why the model stopped generating
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    EndTurn,
    MaxTokens,
    StopSequence,
}

impl StopReason {
    /// Parse from Anthropic API stop_reason string
    pub fn from_anthropic(s: &str) -> Self {
        debug!(%s, "StopReason::from_anthropic: called");
        match s {
            "max_tokens" => StopReason::MaxTokens,
            "stop_sequence" => StopReason::StopSequence,
            _ => StopReason::EndTurn,
        }
    }

    /// Parse from OpenAI finish_reason / Ollama done_reason string
    pub fn from_finish_reason(s: Option<&str>) -> Self {
        debug!(?s, "StopReason::from_finish_reason: called");
        match s {
            Some("length") => StopReason::MaxTokens,
            _ => StopReason::EndTurn,
        }
    }
}

/// Token usage for cost tracking
#[derive(Debug, Clone, Default)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_user() {
        let msg = Message::user("Hello");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Hello");
    }

    #[test]
    fn test_single_turn_with_system() {
        let req = CompletionRequest::single_turn("Plan this", Some("You are a planner"), 1000);
        assert_eq!(req.system_prompt.as_deref(), Some("You are a planner"));
        assert_eq!(req.messages, vec![Message::user("Plan this")]);
        assert_eq!(req.max_tokens, 1000);
    }

    #[test]
    fn test_single_turn_without_system() {
        let req = CompletionRequest::single_turn("Plan this", None, 1000);
        assert!(req.system_prompt.is_none());
        assert_eq!(req.messages.len(), 1);
    }

    #[test]
    fn test_stop_reason_parsing() {
        assert_eq!(StopReason::from_anthropic("end_turn"), StopReason::EndTurn);
        assert_eq!(StopReason::from_anthropic("max_tokens"), StopReason::MaxTokens);
        assert_eq!(StopReason::from_anthropic("stop_sequence"), StopReason::StopSequence);
        assert_eq!(StopReason::from_anthropic("unknown"), StopReason::EndTurn);
        assert_eq!(StopReason::from_finish_reason(Some("length")), StopReason::MaxTokens);
        assert_eq!(StopReason::from_finish_reason(Some("stop")), StopReason::EndTurn);
        assert_eq!(StopReason::from_finish_reason(None), StopReason::EndTurn);
    }

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_value(Role::User).unwrap(), "user");
    }
}
