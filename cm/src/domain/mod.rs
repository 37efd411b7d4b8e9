//! Domain types for the planning pipeline
//!
//! - [`Plan`]: overview plus ordered work packages, with in-place edits
//! - [`Question`]: one clarification question as returned by the model
//! - [`ClarificationAnswers`]: answers keyed by question id, ordered

mod plan;
mod question;

pub use plan::{
    DEFAULT_TASK_TEXT, DEFAULT_WORK_PACKAGE_TITLE, FIRST_TASK_TEXT, Plan, PlanEditError, WorkPackage, task_id,
    task_letter, wp_id,
};
pub use question::{ClarificationAnswers, ClarificationQuestion, Question, QuestionKind};
