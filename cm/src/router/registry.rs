//! Backend registry - the set of live backends, built once at startup

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::Locality;
use crate::config::LlmConfig;
use crate::llm::{LlmClient, create_client_from_resolved};

/// One callable generation backend
#[derive(Clone)]
pub struct Backend {
    name: String,
    locality: Locality,
    client: Arc<dyn LlmClient>,
}

impl Backend {
    pub fn new(name: impl Into<String>, locality: Locality, client: Arc<dyn LlmClient>) -> Self {
        Self {
            name: name.into(),
            locality,
            client,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn locality(&self) -> Locality {
        self.locality
    }

    pub fn client(&self) -> &Arc<dyn LlmClient> {
        &self.client
    }
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backend")
            .field("name", &self.name)
            .field("locality", &self.locality)
            .field("model", &self.client.model())
            .finish()
    }
}

/// A configured backend that failed to initialize
#[derive(Debug, Clone)]
pub struct SkippedBackend {
    pub name: String,
    pub reason: String,
}

/// Live backends by name, in registration order
///
/// Immutable once built. An empty registry is valid: the router still
/// constructs, and every request fails with a routing error.
#[derive(Debug, Default, Clone)]
pub struct BackendRegistry {
    backends: Vec<Backend>,
    skipped: Vec<SkippedBackend>,
}

impl BackendRegistry {
    /// Register every configured backend that initializes
    ///
    /// A backend that fails (missing API key, bad URL) is logged and left
    /// out; it never aborts registration of the others.
    pub fn from_config(config: &LlmConfig) -> Self {
        debug!(backend_count = config.backends.len(), "BackendRegistry::from_config: called");
        let mut registry = Self::default();

        for backend in &config.backends {
            let resolved = backend.resolve();
            match create_client_from_resolved(&resolved) {
                Ok(client) => {
                    info!(
                        name = %resolved.name,
                        locality = %resolved.locality,
                        model = %resolved.model,
                        "Registered backend"
                    );
                    registry.insert(Backend::new(resolved.name, resolved.locality, client));
                }
                Err(e) => {
                    warn!(name = %resolved.name, error = %e, "Skipping backend that failed to initialize");
                    registry.skipped.push(SkippedBackend {
                        name: resolved.name,
                        reason: e.to_string(),
                    });
                }
            }
        }

        if registry.is_empty() {
            warn!("No backends initialized; every generation request will fail");
        }
        registry
    }

    /// Build a registry from ready-made backends
    pub fn from_backends(backends: impl IntoIterator<Item = Backend>) -> Self {
        let mut registry = Self::default();
        for backend in backends {
            registry.insert(backend);
        }
        registry
    }

    /// A later backend with the same name replaces the earlier one
    fn insert(&mut self, backend: Backend) {
        self.backends.retain(|b| b.name != backend.name);
        self.backends.push(backend);
    }

    pub fn get(&self, name: &str) -> Option<&Backend> {
        self.backends.iter().find(|b| b.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Backend> {
        self.backends.iter()
    }

    /// Backends that were configured but did not initialize
    pub fn skipped(&self) -> &[SkippedBackend] {
        &self.skipped
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}
