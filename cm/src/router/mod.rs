//! Model router - role to backend resolution with a single fallback
//!
//! # Architecture
//!
//! ```text
//! ModelRole ──► RoutingTable ──► first live backend ──► LlmClient::complete
//!                    │                                       │ error
//!                    └── none live ──► default backend ◄─────┘ (once)
//! ```
//!
//! The registry and routing table are built once from [`LlmConfig`] and never
//! change, so the router is shared behind an `Arc` without locking.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

mod error;
mod registry;
mod role;

pub use error::RouterError;
pub use registry::{Backend, BackendRegistry, SkippedBackend};
pub use role::{Locality, ModelRole};

use crate::config::LlmConfig;
use crate::llm::{CompletionRequest, LlmError, StopReason};

/// Role -> backend names in preference order
#[derive(Debug, Clone, Default)]
pub struct RoutingTable {
    routes: BTreeMap<ModelRole, Vec<String>>,
}

impl RoutingTable {
    pub fn new(routes: BTreeMap<ModelRole, Vec<String>>) -> Self {
        Self { routes }
    }

    /// Builder-style helper for a single role
    pub fn with_route(mut self, role: ModelRole, names: &[&str]) -> Self {
        self.routes.insert(role, names.iter().map(|n| n.to_string()).collect());
        self
    }

    pub fn preferences(&self, role: ModelRole) -> &[String] {
        self.routes.get(&role).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Resolves roles to backends and runs generations
pub struct ModelRouter {
    registry: BackendRegistry,
    routing: RoutingTable,
    default_backend: Option<String>,
    max_tokens: u32,
}

impl ModelRouter {
    /// Default max tokens requested per generation
    pub const DEFAULT_MAX_TOKENS: u32 = 8192;

    pub fn new(registry: BackendRegistry, routing: RoutingTable, default_backend: Option<String>) -> Self {
        Self {
            registry,
            routing,
            default_backend,
            max_tokens: Self::DEFAULT_MAX_TOKENS,
        }
    }

    /// Register backends from config and wire the routing table
    pub fn from_config(config: &LlmConfig) -> Self {
        debug!(default = %config.default, "ModelRouter::from_config: called");
        let registry = BackendRegistry::from_config(config);
        let default_backend = Some(config.default.clone()).filter(|d| !d.is_empty());
        if let Some(name) = default_backend.as_deref().filter(|name| registry.get(name).is_none()) {
            warn!(default = %name, "Default backend is not registered; roles without a live preference will fail");
        }
        Self::new(registry, RoutingTable::new(config.routing.clone()), default_backend)
            .with_max_tokens(config.max_tokens)
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn registry(&self) -> &BackendRegistry {
        &self.registry
    }

    pub fn routing(&self) -> &RoutingTable {
        &self.routing
    }

    /// The default backend, if it is configured and registered
    pub fn default_backend(&self) -> Option<&Backend> {
        self.default_backend.as_deref().and_then(|name| self.registry.get(name))
    }

    /// Pick the backend that serves `role`
    ///
    /// First live entry of the role's preference list, else the default
    /// backend, else a routing error.
    pub fn resolve(&self, role: ModelRole) -> Result<&Backend, RouterError> {
        debug!(%role, "resolve: called");
        if let Some(backend) = self
            .routing
            .preferences(role)
            .iter()
            .find_map(|name| self.registry.get(name))
        {
            debug!(%role, backend = %backend.name(), "resolve: preferred backend");
            return Ok(backend);
        }

        match self.default_backend() {
            Some(backend) => {
                info!(%role, backend = %backend.name(), "Role not served by a preferred backend, using default");
                Ok(backend)
            }
            None => {
                debug!(%role, "resolve: no backend available");
                Err(RouterError::Routing { role })
            }
        }
    }

    /// Generate text for `role` from a prompt and optional system message
    ///
    /// On failure of a non-default backend the request is retried exactly
    /// once on the default backend. Empty output counts as failure.
    pub async fn generate(
        &self,
        role: ModelRole,
        prompt: &str,
        system_message: Option<&str>,
    ) -> Result<String, RouterError> {
        debug!(%role, prompt_len = prompt.len(), "generate: called");
        let backend = self.resolve(role)?;
        let request = CompletionRequest::single_turn(prompt, system_message, self.max_tokens);

        let err = match Self::invoke(backend, request.clone()).await {
            Ok(text) => return Ok(text),
            Err(e) => e,
        };

        let fallback = self.default_backend().filter(|d| d.name() != backend.name());
        let Some(fallback) = fallback else {
            warn!(%role, backend = %backend.name(), error = %err, "Generation failed, no fallback available");
            return Err(RouterError::Generation {
                backend: backend.name().to_string(),
                source: err,
            });
        };

        warn!(
            %role,
            backend = %backend.name(),
            fallback = %fallback.name(),
            error = %err,
            "Generation failed, retrying once on default backend"
        );
        Self::invoke(fallback, request).await.map_err(|source| {
            warn!(%role, backend = %fallback.name(), error = %source, "Fallback generation failed");
            RouterError::Generation {
                backend: fallback.name().to_string(),
                source,
            }
        })
    }

    async fn invoke(backend: &Backend, request: CompletionRequest) -> Result<String, LlmError> {
        debug!(backend = %backend.name(), "invoke: called");
        let response = backend.client().complete(request).await?;
        debug!(
            backend = %backend.name(),
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            stop_reason = ?response.stop_reason,
            "invoke: completed"
        );
        if response.stop_reason == StopReason::MaxTokens {
            warn!(backend = %backend.name(), "Response truncated at max tokens");
        }
        match response.content {
            Some(text) if !text.trim().is_empty() => {
                debug!(backend = %backend.name(), len = text.len(), "invoke: got text");
                Ok(text)
            }
            _ => Err(LlmError::EmptyResponse),
        }
    }
}
