//! ContextMgr configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::llm::LlmError;
use crate::router::{Locality, ModelRole};

/// Environment variables that push a backend to the front of a role's list
const ROLE_OVERRIDE_ENV: [(ModelRole, &str); 3] = [
    (ModelRole::Planner, "PLANNER_MODEL"),
    (ModelRole::Coder, "CODER_MODEL"),
    (ModelRole::Reviewer, "REVIEWER_MODEL"),
];

/// Main ContextMgr configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backends, routing table and default backend
    pub llm: LlmConfig,

    /// Storage locations
    pub paths: PathsConfig,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,
}

impl Config {
    /// Load configuration with fallback chain, then apply environment overrides
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        let mut config = Self::load_file_chain(config_path)?;
        config.llm.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Read only the log level, quietly, before logging is initialized
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        Self::candidate_paths(config_path)
            .into_iter()
            .find(|p| p.exists())
            .and_then(|p| fs::read_to_string(p).ok())
            .and_then(|content| serde_yaml::from_str::<Self>(&content).ok())
            .and_then(|c| c.log_level)
    }

    fn candidate_paths(config_path: Option<&PathBuf>) -> Vec<PathBuf> {
        if let Some(path) = config_path {
            return vec![path.clone()];
        }

        let mut paths = vec![PathBuf::from(".contextmgr.yml")];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("contextmgr").join("contextmgr.yml"));
        }
        paths
    }

    fn load_file_chain(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, it must load
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        for path in Self::candidate_paths(None) {
            if path.exists() {
                match Self::load_from_file(&path) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        warn!("Failed to load config from {}: {}", path.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Validate configuration before use
    ///
    /// Duplicate backend names are an error. Routing entries and a default
    /// that name unconfigured backends are only warned about: they simply
    /// never resolve.
    pub fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        for backend in &self.llm.backends {
            if !names.insert(backend.name.as_str()) {
                return Err(eyre::eyre!("Duplicate backend name in config: {}", backend.name));
            }
        }

        if !names.contains(self.llm.default.as_str()) {
            warn!(default = %self.llm.default, "Default backend is not configured");
        }
        for (role, list) in &self.llm.routing {
            for name in list.iter().filter(|n| !names.contains(n.as_str())) {
                warn!(%role, backend = %name, "Routing entry names an unconfigured backend");
            }
        }
        Ok(())
    }
}

/// Backend list, routing table and default backend
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Name of the backend used when a role has no live preference, and for
    /// the single fallback retry
    pub default: String,

    /// Every backend the router may register
    pub backends: Vec<BackendConfig>,

    /// Role -> backend names in preference order
    pub routing: BTreeMap<ModelRole, Vec<String>>,

    /// Max tokens requested per generation
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        let backends = vec![
            BackendConfig::new("local-gemma3", ProviderKind::Ollama, "gemma3:12b"),
            BackendConfig::new("local-llama3", ProviderKind::Ollama, "llama3"),
            BackendConfig::new("local-codellama", ProviderKind::Ollama, "codellama"),
            BackendConfig::new("gpt-4o", ProviderKind::OpenAI, "gpt-4o"),
            BackendConfig::new("claude-3-opus", ProviderKind::Anthropic, "claude-3-opus-20240229"),
        ];

        let mut routing = BTreeMap::new();
        routing.insert(
            ModelRole::Planner,
            vec!["local-llama3".to_string(), "gpt-4o".to_string()],
        );
        routing.insert(
            ModelRole::Coder,
            vec!["local-codellama".to_string(), "claude-3-opus".to_string()],
        );
        routing.insert(
            ModelRole::Reviewer,
            vec!["local-codellama".to_string(), "gpt-4o".to_string()],
        );

        Self {
            default: "local-gemma3".to_string(),
            backends,
            routing,
            max_tokens: 8192,
        }
    }
}

impl LlmConfig {
    /// Move backends named by `PLANNER_MODEL` / `CODER_MODEL` / `REVIEWER_MODEL`
    /// to the front of their role's preference list
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        for (role, key) in ROLE_OVERRIDE_ENV {
            if let Some(name) = lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
                debug!(%role, backend = %name, "apply_env_overrides: overriding preference");
                let list = self.routing.entry(role).or_default();
                list.retain(|n| n != &name);
                list.insert(0, name);
            }
        }
    }

    /// Preference list for a role (empty if the role is not routed)
    pub fn preferences(&self, role: ModelRole) -> &[String] {
        self.routing.get(&role).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Which API a backend speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Ollama,
    #[serde(rename = "openai")]
    OpenAI,
    Anthropic,
}

impl ProviderKind {
    /// Ollama runs on this machine; the hosted APIs do not
    pub fn default_locality(&self) -> Locality {
        match self {
            ProviderKind::Ollama => Locality::Local,
            ProviderKind::OpenAI | ProviderKind::Anthropic => Locality::Remote,
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderKind::Ollama => "http://localhost:11434",
            ProviderKind::OpenAI => "https://api.openai.com",
            ProviderKind::Anthropic => "https://api.anthropic.com",
        }
    }

    pub fn default_api_key_env(&self) -> Option<&'static str> {
        match self {
            ProviderKind::Ollama => None,
            ProviderKind::OpenAI => Some("OPENAI_API_KEY"),
            ProviderKind::Anthropic => Some("ANTHROPIC_API_KEY"),
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::Ollama => write!(f, "ollama"),
            ProviderKind::OpenAI => write!(f, "openai"),
            ProviderKind::Anthropic => write!(f, "anthropic"),
        }
    }
}

/// One configured backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Name used in the routing table
    pub name: String,

    /// API this backend speaks
    pub provider: ProviderKind,

    /// Model identifier sent to the provider
    pub model: String,

    /// API base URL (provider default when omitted)
    #[serde(rename = "base-url", default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Environment variable holding the API key (provider default when omitted)
    #[serde(rename = "api-key-env", default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    /// Locality override (derived from the provider when omitted)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locality: Option<Locality>,

    /// Maximum tokens per response
    #[serde(rename = "max-tokens", default = "default_backend_max_tokens")]
    pub max_tokens: u32,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms", default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_backend_max_tokens() -> u32 {
    16384
}

fn default_timeout_ms() -> u64 {
    300_000
}

impl BackendConfig {
    pub fn new(name: impl Into<String>, provider: ProviderKind, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            provider,
            model: model.into(),
            base_url: None,
            api_key_env: None,
            locality: None,
            max_tokens: default_backend_max_tokens(),
            timeout_ms: default_timeout_ms(),
        }
    }

    /// Fill in provider defaults
    pub fn resolve(&self) -> ResolvedBackendConfig {
        debug!(name = %self.name, provider = %self.provider, "BackendConfig::resolve: called");
        ResolvedBackendConfig {
            name: self.name.clone(),
            provider: self.provider,
            model: self.model.clone(),
            base_url: self
                .base_url
                .clone()
                .unwrap_or_else(|| self.provider.default_base_url().to_string())
                .trim_end_matches('/')
                .to_string(),
            api_key_env: self
                .api_key_env
                .clone()
                .or_else(|| self.provider.default_api_key_env().map(str::to_string)),
            locality: self.locality.unwrap_or_else(|| self.provider.default_locality()),
            max_tokens: self.max_tokens,
            timeout_ms: self.timeout_ms,
        }
    }
}

/// A backend config with every default applied, ready for client construction
#[derive(Debug, Clone)]
pub struct ResolvedBackendConfig {
    pub name: String,
    pub provider: ProviderKind,
    pub model: String,
    pub base_url: String,
    pub api_key_env: Option<String>,
    pub locality: Locality,
    pub max_tokens: u32,
    pub timeout_ms: u64,
}

impl ResolvedBackendConfig {
    /// Read the API key from the configured environment variable
    pub fn get_api_key(&self) -> Result<String, LlmError> {
        let Some(env) = &self.api_key_env else {
            return Err(LlmError::MissingApiKey(format!("<no api-key-env for {}>", self.name)));
        };
        match std::env::var(env) {
            Ok(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
            _ => Err(LlmError::MissingApiKey(env.clone())),
        }
    }
}

/// Storage locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory for plan markdown documents
    pub plans: PathBuf,

    /// Directory for the context search index
    pub context: PathBuf,

    /// Directory with user prompt overrides (`{name}.pmt`)
    pub prompts: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        let base = PathBuf::from("data");
        Self {
            plans: base.join("plans"),
            context: base.join("context"),
            prompts: PathBuf::from(".contextmgr").join("prompts"),
        }
    }
}
