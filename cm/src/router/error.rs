//! Router error types

use thiserror::Error;

use super::ModelRole;
use crate::llm::LlmError;

/// Hard failures surfaced by the router
#[derive(Debug, Error)]
pub enum RouterError {
    /// No preferred backend and no default backend is registered
    #[error("No backend available for role '{role}' and no default backend registered")]
    Routing { role: ModelRole },

    /// The backend call failed, after the single fallback retry when one applied
    #[error("Generation failed on backend '{backend}': {source}")]
    Generation {
        backend: String,
        #[source]
        source: LlmError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routing_error_names_role() {
        let err = RouterError::Routing {
            role: ModelRole::Reviewer,
        };
        assert!(err.to_string().contains("reviewer"));
    }

    #[test]
    fn test_generation_error_keeps_source() {
        let err = RouterError::Generation {
            backend: "local-gemma3".to_string(),
            source: LlmError::EmptyResponse,
        };
        assert!(err.to_string().contains("'local-gemma3'"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
