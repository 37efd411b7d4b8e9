//! Plan <-> markdown document
//!
//! The document layout is fixed:
//!
//! ```text
//! # Development Plan
//!
//! {overview}
//!
//! # Work Packages
//!
//! ## WP001: {title}
//!
//! - [ ] WP001-A: {task}
//! ```
//!
//! Ids in the document are recomputed from position on every render and
//! ignored on parse.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::domain::{Plan, WorkPackage, task_id, wp_id};

pub const PLAN_HEADING: &str = "# Development Plan";
pub const WORK_PACKAGES_HEADING: &str = "# Work Packages";

static SECTION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^## WP\d+: (.*)$").expect("section regex"));
static TASK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^- \[[ xX]\] WP\d+-[A-Z]+: (.*)$").expect("task regex"));

/// Render a plan as its markdown document
pub fn render_plan(plan: &Plan) -> String {
    debug!(work_packages = plan.work_packages.len(), "render_plan: called");
    let mut out = format!("{}\n\n{}\n\n{}\n\n", PLAN_HEADING, plan.overview, WORK_PACKAGES_HEADING);

    for (i, wp) in plan.work_packages.iter().enumerate() {
        out.push_str(&format!("## {}: {}\n\n", wp_id(i), wp.title));
        for (j, task) in wp.tasks.iter().enumerate() {
            out.push_str(&format!("- [ ] {}: {}\n", task_id(i, j), task));
        }
        out.push('\n');
    }

    out
}

/// Recover a plan from a markdown document
///
/// Never fails. Unrecognized lines are skipped; a document without any of
/// the expected headings becomes an empty plan whose overview is the
/// trimmed text.
pub fn parse_markdown_plan(document: &str) -> Plan {
    debug!(len = document.len(), "parse_markdown_plan: called");
    let lines: Vec<&str> = document.lines().collect();

    let plan_heading = lines.iter().position(|l| l.trim_end() == PLAN_HEADING);
    let overview_start = plan_heading.map(|i| i + 1).unwrap_or(0);

    let wp_heading = lines[overview_start..]
        .iter()
        .position(|l| l.trim_end() == WORK_PACKAGES_HEADING)
        .map(|i| i + overview_start);

    let (overview_end, body_start) = match wp_heading {
        Some(i) => (i, i + 1),
        None => {
            let first_section = lines[overview_start..]
                .iter()
                .position(|l| SECTION_RE.is_match(l))
                .map(|i| i + overview_start)
                .unwrap_or(lines.len());
            (first_section, first_section)
        }
    };

    let overview = lines[overview_start..overview_end].join("\n").trim().to_string();

    let mut work_packages: Vec<WorkPackage> = Vec::new();
    for line in &lines[body_start..] {
        if let Some(caps) = SECTION_RE.captures(line) {
            work_packages.push(WorkPackage::new(&caps[1]));
        } else if let Some(caps) = TASK_RE.captures(line) {
            match work_packages.last_mut() {
                Some(wp) => wp.tasks.push(caps[1].to_string()),
                None => debug!(%line, "parse_markdown_plan: task before any section, skipping"),
            }
        }
    }

    debug!(work_packages = work_packages.len(), "parse_markdown_plan: parsed");
    Plan::new(overview, work_packages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn setup_plan() -> Plan {
        Plan::new(
            "A CLI for tracking habits.",
            vec![WorkPackage::with_tasks("Setup", ["Init repo", "Add CI"])],
        )
    }

    #[test]
    fn test_render_exact_layout() {
        let doc = render_plan(&setup_plan());
        assert_eq!(
            doc,
            "# Development Plan\n\nA CLI for tracking habits.\n\n# Work Packages\n\n\
             ## WP001: Setup\n\n- [ ] WP001-A: Init repo\n- [ ] WP001-B: Add CI\n\n"
        );
    }

    #[test]
    fn test_render_labels_follow_position() {
        let mut plan = Plan::new(
            "o",
            vec![
                WorkPackage::with_tasks("One", ["a"]),
                WorkPackage::with_tasks("Two", ["b"]),
                WorkPackage::with_tasks("Three", ["c"]),
            ],
        );
        let doc = render_plan(&plan);
        assert!(doc.contains("## WP001: One"));
        assert!(doc.contains("## WP002: Two"));
        assert!(doc.contains("## WP003: Three"));

        plan.move_work_package(2, 0).unwrap();
        let doc = render_plan(&plan);
        assert!(doc.contains("## WP001: Three\n\n- [ ] WP001-A: c"));
        assert!(doc.contains("## WP002: One\n\n- [ ] WP002-A: a"));
        assert!(doc.contains("## WP003: Two\n\n- [ ] WP003-A: b"));
    }

    #[test]
    fn test_parse_ignores_stale_ids_and_checked_boxes() {
        let doc = "# Development Plan\n\nOverview text\n\n# Work Packages\n\n\
                   ## WP007: Later\n\n- [x] WP007-C: done thing\n- [ ] WP001-A: open thing\n\
                   Some stray note\n";
        let plan = parse_markdown_plan(doc);
        assert_eq!(plan.overview, "Overview text");
        assert_eq!(plan.work_packages.len(), 1);
        assert_eq!(plan.work_packages[0].title, "Later");
        assert_eq!(plan.work_packages[0].tasks, vec!["done thing", "open thing"]);
    }

    #[test]
    fn test_parse_document_without_headings() {
        let plan = parse_markdown_plan("\n  just some notes\nmore notes  \n");
        assert_eq!(plan.overview, "just some notes\nmore notes");
        assert!(plan.work_packages.is_empty());
    }

    #[test]
    fn test_parse_without_plan_heading() {
        let doc = "Intro paragraph\n\n# Work Packages\n\n## WP001: Only\n\n- [ ] WP001-A: t\n";
        let plan = parse_markdown_plan(doc);
        assert_eq!(plan.overview, "Intro paragraph");
        assert_eq!(plan.work_packages, vec![WorkPackage::with_tasks("Only", ["t"])]);
    }

    #[test]
    fn test_parse_without_work_packages_heading() {
        let doc = "# Development Plan\n\nOverview\n\n## WP001: Setup\n- [ ] WP001-A: Init\n";
        let plan = parse_markdown_plan(doc);
        assert_eq!(plan.overview, "Overview");
        assert_eq!(plan.work_packages, vec![WorkPackage::with_tasks("Setup", ["Init"])]);
    }

    #[test]
    fn test_parse_empty_sections() {
        let doc = render_plan(&Plan::new("o", vec![WorkPackage::new("Empty"), WorkPackage::new("Also empty")]));
        let plan = parse_markdown_plan(&doc);
        assert_eq!(plan.work_packages.len(), 2);
        assert!(plan.work_packages.iter().all(|wp| wp.tasks.is_empty()));
    }

    #[test]
    fn test_round_trip_of_multiline_model_output() {
        let plan = Plan::new(
            "## Solution Overview\nA CLI.\n\n## Architecture\nOne binary.\n",
            vec![WorkPackage::with_tasks("Setup", ["Init repo\n- [ ] WP009-Z: ghost", "Add CI"])],
        );
        let parsed = parse_markdown_plan(&render_plan(&plan));
        assert_eq!(parsed, plan);
        assert!(parsed.overview.ends_with("One binary."));
        assert_eq!(parsed.work_packages[0].tasks.len(), 2);
    }

    #[test]
    fn test_round_trip_past_26_tasks() {
        let tasks: Vec<String> = (0..30).map(|i| format!("task {}", i)).collect();
        let plan = Plan::new("Big", vec![WorkPackage::with_tasks("Many", tasks)]);
        let doc = render_plan(&plan);
        assert!(doc.contains("- [ ] WP001-AD: task 29"));
        assert_eq!(parse_markdown_plan(&doc), plan);
    }

    fn arb_line() -> impl Strategy<Value = String> {
        "[A-Za-z0-9 ][A-Za-z0-9 .,:()\\[\\]#-]{0,30}(\r?\n[A-Za-z0-9 #-]{0,10})?"
    }

    fn arb_plan() -> impl Strategy<Value = Plan> {
        let overview = prop::collection::vec("[A-Za-z0-9 #][A-Za-z0-9 .,#]{0,20}", 1..4)
            .prop_map(|lines| format!("\n {} \n", lines.join("\n")));
        let wp = (arb_line(), prop::collection::vec(arb_line(), 0..6))
            .prop_map(|(title, tasks)| WorkPackage::with_tasks(title, tasks));
        (overview, prop::collection::vec(wp, 0..6))
            .prop_map(|(overview, work_packages)| Plan::new(overview, work_packages))
    }

    proptest! {
        #[test]
        fn prop_parse_inverts_render(plan in arb_plan()) {
            prop_assert_eq!(parse_markdown_plan(&render_plan(&plan)), plan);
        }

        #[test]
        fn prop_parse_never_panics(doc in "(?s).{0,200}") {
            let _ = parse_markdown_plan(&doc);
        }
    }
}
