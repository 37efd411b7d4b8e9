//! ContextMgr - project planning assistant
//!
//! Takes a rough project description and, with the help of an LLM, turns it
//! into clarification questions, a refined brief and a structured
//! development plan saved as markdown.
//!
//! # Core Concepts
//!
//! - **Roles, not models**: callers ask for a `planner` generation; the router
//!   picks the backend, preferring local models and falling back once to the
//!   default backend
//! - **Lenient parsing**: model replies are free text; a bad reply degrades
//!   the result instead of failing the call
//! - **Markdown is the durable form**: plans render to a fixed layout that
//!   parses back to the same structure
//!
//! # Modules
//!
//! - [`router`] - role to backend resolution and generation with fallback
//! - [`llm`] - provider clients (Ollama, OpenAI, Anthropic)
//! - [`planning`] - questions, brief and plan pipeline, markdown and plan files
//! - [`domain`] - plan and question types
//! - [`prompts`] - prompt templates
//! - [`config`] - configuration types and loading
//! - [`cli`] - command-line interface

pub mod cli;
pub mod config;
pub mod context;
pub mod domain;
pub mod llm;
pub mod planning;
pub mod prompts;
pub mod router;
pub mod wizard;

// Re-export commonly used types
pub use config::{BackendConfig, Config, LlmConfig, PathsConfig, ProviderKind};
pub use domain::{ClarificationAnswers, Plan, PlanEditError, Question, QuestionKind, WorkPackage};
pub use llm::{CompletionRequest, CompletionResponse, LlmClient, LlmError};
pub use planning::{
    GeneratedPlan, PlanStore, PlannerError, ProjectPlanner, extract_balanced, parse_markdown_plan, render_plan,
};
pub use prompts::PromptLoader;
pub use router::{Backend, BackendRegistry, Locality, ModelRole, ModelRouter, RouterError, RoutingTable};
