//! Prompt templates for the planning pipeline
//!
//! Template loading chain:
//! 1. `{paths.prompts}/{name}.pmt` (user override)
//! 2. Embedded fallback compiled from `cm/prompts/`
//!
//! Templates use Handlebars syntax; `{{description}}` and `{{answers}}` are
//! substituted without HTML escaping.

pub mod embedded;
mod loader;

pub use loader::{PromptContext, PromptLoader, TemplateName};
