//! Prompt Loader
//!
//! Loads prompt templates from the user override directory or falls back to
//! embedded defaults.

use std::path::{Path, PathBuf};

use eyre::{Result, eyre};
use handlebars::Handlebars;
use serde::Serialize;
use tracing::{debug, info};

use super::embedded;

/// The templates the pipeline renders
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateName {
    Questions,
    Brief,
    Plan,
}

impl TemplateName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Questions => "questions",
            Self::Brief => "brief",
            Self::Plan => "plan",
        }
    }
}

impl std::fmt::Display for TemplateName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Variables available to templates
#[derive(Debug, Clone, Default, Serialize)]
pub struct PromptContext {
    /// Project description or refined brief
    pub description: String,
    /// Rendered clarification answers (brief template only)
    pub answers: Option<String>,
}

impl PromptContext {
    pub fn description(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            answers: None,
        }
    }

    pub fn with_answers(mut self, answers: impl Into<String>) -> Self {
        self.answers = Some(answers.into());
        self
    }
}

/// Loads and renders prompt templates
pub struct PromptLoader {
    hbs: Handlebars<'static>,
    /// User override directory (e.g., `.contextmgr/prompts/`)
    user_dir: Option<PathBuf>,
}

impl PromptLoader {
    /// Loader that prefers templates found in `user_dir`
    pub fn new(user_dir: impl AsRef<Path>) -> Self {
        let user_dir = user_dir.as_ref();
        debug!(user_dir = %user_dir.display(), "PromptLoader::new: called");
        Self {
            hbs: Self::engine(),
            user_dir: user_dir.is_dir().then(|| user_dir.to_path_buf()),
        }
    }

    /// Create a loader that only uses embedded prompts
    pub fn embedded_only() -> Self {
        Self {
            hbs: Self::engine(),
            user_dir: None,
        }
    }

    fn engine() -> Handlebars<'static> {
        let mut hbs = Handlebars::new();
        // Prompts are plain text; HTML escaping would mangle quotes in descriptions
        hbs.register_escape_fn(handlebars::no_escape);
        hbs
    }

    /// Load a template by name
    ///
    /// Checks in order:
    /// 1. User override: `{user_dir}/{name}.pmt`
    /// 2. Embedded fallback
    fn load_template(&self, name: &str) -> Result<String> {
        if let Some(ref user_dir) = self.user_dir {
            let path = user_dir.join(format!("{}.pmt", name));
            if path.exists() {
                debug!("Loading prompt from user override: {:?}", path);
                return std::fs::read_to_string(&path)
                    .map_err(|e| eyre!("Failed to read user prompt {}: {}", path.display(), e));
            }
        }

        if let Some(content) = embedded::get_embedded(name) {
            debug!("Using embedded prompt: {}", name);
            return Ok(content.to_string());
        }

        Err(eyre!("Prompt template not found: {}", name))
    }

    /// Render a template with the given context
    pub fn render(&self, template: TemplateName, context: &PromptContext) -> Result<String> {
        let source = self.load_template(template.as_str())?;
        info!(%template, description_len = context.description.len(), "Rendering prompt template");

        self.hbs
            .render_template(&source, context)
            .map_err(|e| eyre!("Failed to render template {}: {}", template, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_render_embedded_questions() {
        let loader = PromptLoader::embedded_only();
        let prompt = loader
            .render(TemplateName::Questions, &PromptContext::description("A \"todo\" app & more"))
            .unwrap();
        assert!(prompt.contains("A \"todo\" app & more"));
        assert!(prompt.contains("\"id\": \"target_platform\""));
    }

    #[test]
    fn test_render_brief_includes_answers() {
        let loader = PromptLoader::embedded_only();
        let ctx = PromptContext::description("desc").with_answers("Q: timeline\nA: 3 months");
        let prompt = loader.render(TemplateName::Brief, &ctx).unwrap();
        assert!(prompt.contains("Initial Project Description:\ndesc"));
        assert!(prompt.contains("Q: timeline\nA: 3 months"));
    }

    #[test]
    fn test_user_override_wins() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("plan.pmt"), "Custom plan for {{description}}").unwrap();

        let loader = PromptLoader::new(temp.path());
        let prompt = loader.render(TemplateName::Plan, &PromptContext::description("X")).unwrap();
        assert_eq!(prompt, "Custom plan for X");

        // Templates not overridden still come from the embedded set
        let prompt = loader.render(TemplateName::Brief, &PromptContext::description("X")).unwrap();
        assert!(prompt.contains("DO NOT include any preamble"));
    }

    #[test]
    fn test_missing_user_dir_is_ignored() {
        let temp = TempDir::new().unwrap();
        let loader = PromptLoader::new(temp.path().join("absent"));
        assert!(loader.user_dir.is_none());
    }

    #[test]
    fn test_unknown_template() {
        let loader = PromptLoader::embedded_only();
        assert!(loader.load_template("nonexistent-template").is_err());
    }

    #[test]
    fn test_broken_override_is_render_error() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("questions.pmt"), "{{#if}} unclosed").unwrap();
        let loader = PromptLoader::new(temp.path());
        assert!(loader.render(TemplateName::Questions, &PromptContext::default()).is_err());
    }
}
