//! Planning module - from a project description to a saved development plan
//!
//! # Architecture
//!
//! ```text
//! description ──► questions ──► answers ──► brief ──► plan ──► plan-*.md
//!                    ↑                        ↑         ↑          │
//!                    └──── ModelRouter (role: planner) ─┘          ▼
//!                                                          parse_markdown_plan
//! ```
//!
//! Model replies are free-form text; [`extract_balanced`] isolates the JSON
//! payload before decoding. The markdown document is the durable form of a
//! plan and [`parse_markdown_plan`] inverts [`render_plan`].

mod extract;
mod markdown;
mod planner;
mod store;

pub use extract::extract_balanced;
pub use markdown::{PLAN_HEADING, WORK_PACKAGES_HEADING, parse_markdown_plan, render_plan};
pub use planner::{GeneratedPlan, PLAN_PARSE_ERROR, PlannerError, ProjectPlanner, parse_plan, parse_questions};
pub use store::{PlanStore, PlanWriteError};
