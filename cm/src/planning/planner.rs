//! ProjectPlanner - the three-step planning pipeline
//!
//! Every call goes to the router with role `planner`. Model output is parsed
//! leniently: malformed questions become an empty list and a malformed plan
//! becomes a degraded result carrying the raw text. Only routing, prompt and
//! disk failures are errors.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use eyre::Context;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::extract::extract_balanced;
use super::markdown::{parse_markdown_plan, render_plan};
use super::store::{PlanStore, PlanWriteError};
use crate::domain::{ClarificationAnswers, Plan, Question, WorkPackage};
use crate::prompts::{PromptContext, PromptLoader, TemplateName, embedded};
use crate::router::{ModelRole, ModelRouter, RouterError};

/// Overview of a plan whose model output could not be decoded
pub const PLAN_PARSE_ERROR: &str = "Error parsing plan";

/// Planner errors
#[derive(Debug, Error)]
pub enum PlannerError {
    #[error(transparent)]
    Router(#[from] RouterError),

    /// The plan was generated but could not be written; it is carried along unsaved
    #[error("Failed to save plan to {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: io::Error,
        plan: Box<GeneratedPlan>,
    },

    #[error("Prompt error: {0}")]
    Prompt(String),
}

/// A plan as produced by the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedPlan {
    pub overview: String,
    pub work_packages: Vec<WorkPackage>,
    /// Rendered markdown, or the raw model output for a degraded result
    pub plan: String,
    /// Where the document was written; `None` when nothing was saved
    pub path: Option<PathBuf>,
}

impl GeneratedPlan {
    pub fn from_plan(plan: Plan, path: Option<PathBuf>) -> Self {
        let document = render_plan(&plan);
        Self {
            overview: plan.overview,
            work_packages: plan.work_packages,
            plan: document,
            path,
        }
    }

    fn degraded(raw: String) -> Self {
        Self {
            overview: PLAN_PARSE_ERROR.to_string(),
            work_packages: Vec::new(),
            plan: raw,
            path: None,
        }
    }

    /// The structured part, for editing
    pub fn to_plan(&self) -> Plan {
        Plan::new(self.overview.clone(), self.work_packages.clone())
    }

    /// True when the model output could not be decoded into a plan
    pub fn is_degraded(&self) -> bool {
        self.path.is_none() && self.work_packages.is_empty() && self.overview == PLAN_PARSE_ERROR
    }
}

/// Shape the plan prompt asks the model for; both fields are required
#[derive(Debug, Deserialize)]
struct PlanOutput {
    overview: String,
    work_packages: Vec<WorkPackageOutput>,
}

#[derive(Debug, Deserialize)]
struct WorkPackageOutput {
    title: String,
    #[serde(default)]
    tasks: Vec<String>,
}

impl From<PlanOutput> for Plan {
    fn from(output: PlanOutput) -> Self {
        Plan::new(
            output.overview,
            output
                .work_packages
                .into_iter()
                .map(|wp| WorkPackage::with_tasks(wp.title, wp.tasks))
                .collect(),
        )
    }
}

/// Runs questions -> brief -> plan against the router
pub struct ProjectPlanner {
    router: Arc<ModelRouter>,
    prompts: PromptLoader,
    store: PlanStore,
}

impl ProjectPlanner {
    pub fn new(router: Arc<ModelRouter>, prompts: PromptLoader, store: PlanStore) -> Self {
        Self { router, prompts, store }
    }

    pub fn store(&self) -> &PlanStore {
        &self.store
    }

    fn render(&self, template: TemplateName, context: &PromptContext) -> Result<String, PlannerError> {
        self.prompts
            .render(template, context)
            .map_err(|e| PlannerError::Prompt(format!("{:#}", e)))
    }

    /// Ask the model for clarification questions about a project
    ///
    /// Returns whatever the model produced, without enforcing the 3-5 range.
    /// An unparseable reply yields an empty list.
    pub async fn generate_clarification_questions(&self, description: &str) -> Result<Vec<Question>, PlannerError> {
        debug!(description_len = description.len(), "generate_clarification_questions: called");
        let prompt = self.render(TemplateName::Questions, &PromptContext::description(description))?;

        let response = self
            .router
            .generate(ModelRole::Planner, &prompt, Some(embedded::QUESTIONS_SYSTEM))
            .await?;

        let questions = parse_questions(&response);
        info!(count = questions.len(), "Generated clarification questions");
        Ok(questions)
    }

    /// Turn the description plus answers into a refined brief
    pub async fn generate_refined_brief(
        &self,
        description: &str,
        answers: &ClarificationAnswers,
    ) -> Result<String, PlannerError> {
        debug!(answer_count = answers.len(), "generate_refined_brief: called");
        let context = PromptContext::description(description).with_answers(answers.render());
        let prompt = self.render(TemplateName::Brief, &context)?;

        let brief = self
            .router
            .generate(ModelRole::Planner, &prompt, Some(embedded::BRIEF_SYSTEM))
            .await?;

        info!(len = brief.len(), "Generated refined brief");
        Ok(brief)
    }

    /// Generate a structured plan and save it as markdown
    ///
    /// A reply that does not decode returns a degraded plan and writes
    /// nothing.
    pub async fn generate_plan(&self, description: &str) -> Result<GeneratedPlan, PlannerError> {
        debug!(description_len = description.len(), "generate_plan: called");
        let prompt = self.render(TemplateName::Plan, &PromptContext::description(description))?;

        let response = self.router.generate(ModelRole::Planner, &prompt, None).await?;

        let Some(plan) = parse_plan(&response) else {
            warn!(len = response.len(), "Plan output could not be parsed, returning degraded plan");
            return Ok(GeneratedPlan::degraded(response));
        };

        info!(
            work_packages = plan.work_packages.len(),
            tasks = plan.task_count(),
            "Parsed development plan"
        );

        match self.store.save(&plan) {
            Ok(path) => Ok(GeneratedPlan::from_plan(plan, Some(path))),
            Err(PlanWriteError { path, source }) => {
                warn!(path = %path.display(), error = %source, "Failed to save plan");
                Err(PlannerError::Persist {
                    path,
                    source,
                    plan: Box::new(GeneratedPlan::from_plan(plan, None)),
                })
            }
        }
    }

    /// Re-render an edited plan, rewriting its document if it was saved
    pub fn apply_edits(&self, previous: &GeneratedPlan, plan: Plan) -> Result<GeneratedPlan, PlanWriteError> {
        debug!(path = ?previous.path, "apply_edits: called");
        if let Some(path) = &previous.path {
            self.store.overwrite(path, &plan)?;
        }
        Ok(GeneratedPlan::from_plan(plan, previous.path.clone()))
    }

    /// Load a saved plan document
    pub fn load_plan(&self, path: &Path) -> eyre::Result<GeneratedPlan> {
        debug!(path = %path.display(), "load_plan: called");
        let document =
            std::fs::read_to_string(path).with_context(|| format!("Failed to read plan {}", path.display()))?;
        let plan = parse_markdown_plan(&document);
        Ok(GeneratedPlan {
            overview: plan.overview,
            work_packages: plan.work_packages,
            plan: document,
            path: Some(path.to_path_buf()),
        })
    }
}

/// Decode the first-`[`-to-last-`]` slice of a reply as a question list
pub fn parse_questions(response: &str) -> Vec<Question> {
    let Some(json) = extract_balanced(response, '[', ']') else {
        debug!("parse_questions: no JSON array in response");
        return Vec::new();
    };

    match serde_json::from_str::<Vec<Value>>(json) {
        Ok(values) => values.into_iter().map(Question::from_value).collect(),
        Err(e) => {
            debug!(error = %e, "parse_questions: failed to decode array");
            Vec::new()
        }
    }
}

/// Decode the first-`{`-to-last-`}` slice of a reply as a plan
pub fn parse_plan(response: &str) -> Option<Plan> {
    let json = extract_balanced(response, '{', '}')?;
    match serde_json::from_str::<PlanOutput>(json) {
        Ok(output) => Some(output.into()),
        Err(e) => {
            debug!(error = %e, "parse_plan: failed to decode plan object");
            None
        }
    }
}
