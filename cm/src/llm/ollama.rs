//! Ollama client implementation
//!
//! Talks to a local Ollama server through its native `/api/chat` endpoint,
//! non-streaming. No API key is involved.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::http::{build_http_client, post_json};
use super::{CompletionRequest, CompletionResponse, LlmClient, LlmError, StopReason, TokenUsage};
use crate::config::ResolvedBackendConfig;

/// Ollama chat client
pub struct OllamaClient {
    model: String,
    base_url: String,
    http: Client,
    max_tokens: u32,
    timeout: Duration,
}

impl OllamaClient {
    /// Create a new client from resolved configuration
    ///
    /// Construction does not contact the server; an unreachable Ollama shows
    /// up as a network error on the first request.
    pub fn from_config(config: &ResolvedBackendConfig) -> Result<Self, LlmError> {
        debug!(?config, "from_config: called");
        reqwest::Url::parse(&config.base_url)
            .map_err(|e| LlmError::InvalidResponse(format!("Invalid Ollama base URL {}: {}", config.base_url, e)))?;

        let timeout = Duration::from_millis(config.timeout_ms);
        Ok(Self {
            model: config.model.clone(),
            base_url: config.base_url.clone(),
            http: build_http_client(timeout)?,
            max_tokens: config.max_tokens,
            timeout,
        })
    }

    fn build_request_body(&self, request: &CompletionRequest) -> serde_json::Value {
        debug!(%self.model, %request.max_tokens, "build_request_body: called");
        let mut messages = Vec::new();
        if let Some(system) = &request.system_prompt {
            messages.push(serde_json::json!({ "role": "system", "content": system }));
        }
        messages.extend(
            request
                .messages
                .iter()
                .map(|m| serde_json::json!({ "role": m.role.as_str(), "content": m.content })),
        );

        serde_json::json!({
            "model": self.model,
            "messages": messages,
            "stream": false,
            "options": {
                "temperature": 0.1,
                "num_predict": request.max_tokens.min(self.max_tokens),
            },
        })
    }

    fn parse_response(&self, api_response: OllamaChatResponse) -> CompletionResponse {
        debug!(done = api_response.done, "parse_response: called");
        let content = api_response.message.map(|m| m.content).filter(|c| !c.is_empty());
        CompletionResponse {
            content,
            stop_reason: StopReason::from_finish_reason(api_response.done_reason.as_deref()),
            usage: TokenUsage {
                input_tokens: api_response.prompt_eval_count.unwrap_or(0),
                output_tokens: api_response.eval_count.unwrap_or(0),
            },
        }
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        debug!(%self.model, "complete: called");
        let url = format!("{}/api/chat", self.base_url);
        let body = self.build_request_body(&request);

        let api_response: OllamaChatResponse = post_json(&self.http, &url, &[], &body, self.timeout).await?;
        Ok(self.parse_response(api_response))
    }
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: Option<OllamaMessage>,
    #[serde(default)]
    done: bool,
    done_reason: Option<String>,
    prompt_eval_count: Option<u64>,
    eval_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct OllamaMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BackendConfig, ProviderKind};

    fn test_client() -> OllamaClient {
        let resolved = BackendConfig::new("local-gemma3", ProviderKind::Ollama, "gemma3:12b").resolve();
        OllamaClient::from_config(&resolved).unwrap()
    }

    #[test]
    fn test_from_config_rejects_bad_url() {
        let mut backend = BackendConfig::new("local-bad", ProviderKind::Ollama, "llama3");
        backend.base_url = Some("not a url".to_string());
        assert!(OllamaClient::from_config(&backend.resolve()).is_err());
    }

    #[test]
    fn test_build_request_body() {
        let client = test_client();
        let body = client.build_request_body(&CompletionRequest::single_turn("Plan", Some("Be terse"), 1000));

        assert_eq!(body["model"], "gemma3:12b");
        assert_eq!(body["stream"], false);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "Plan");
        assert_eq!(body["options"]["num_predict"], 1000);
    }

    #[test]
    fn test_parse_response() {
        let client = test_client();
        let raw = r#"{
            "model": "gemma3:12b",
            "message": {"role": "assistant", "content": "[{\"id\": \"a\"}]"},
            "done": true,
            "done_reason": "stop",
            "prompt_eval_count": 20,
            "eval_count": 9
        }"#;
        let parsed: OllamaChatResponse = serde_json::from_str(raw).unwrap();
        let resp = client.parse_response(parsed);
        assert_eq!(resp.content.as_deref(), Some("[{\"id\": \"a\"}]"));
        assert_eq!(resp.usage.input_tokens, 20);
    }

    #[test]
    fn test_parse_response_empty_content_is_none() {
        let client = test_client();
        let parsed: OllamaChatResponse =
            serde_json::from_str(r#"{"message": {"role": "assistant", "content": ""}, "done": true}"#).unwrap();
        assert!(client.parse_response(parsed).content.is_none());
    }
}
