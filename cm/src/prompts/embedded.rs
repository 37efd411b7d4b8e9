//! Embedded prompts
//!
//! Compiled into the binary from the .pmt files at build time.

use tracing::debug;

/// Clarification question generation
pub const QUESTIONS: &str = include_str!("../../prompts/questions.pmt");

/// Refined brief from description plus answers
pub const BRIEF: &str = include_str!("../../prompts/brief.pmt");

/// Structured development plan
pub const PLAN: &str = include_str!("../../prompts/plan.pmt");

/// System message sent with the questions prompt
pub const QUESTIONS_SYSTEM: &str = "You are an expert project planner who helps refine project requirements.";

/// System message sent with the brief prompt
pub const BRIEF_SYSTEM: &str = "You are an expert project requirements analyst who creates clear, \
                                comprehensive project briefs without any preamble text.";

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    match name {
        "questions" => Some(QUESTIONS),
        "brief" => Some(BRIEF),
        "plan" => Some(PLAN),
        _ => {
            debug!("get_embedded: no match found");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_embedded_known_templates() {
        assert!(get_embedded("questions").unwrap().contains("\"type\": \"yes_no\""));
        assert!(get_embedded("brief").unwrap().contains("DO NOT include any preamble"));
        assert!(get_embedded("plan").unwrap().contains("\"work_packages\""));
    }

    #[test]
    fn test_get_embedded_unknown() {
        assert!(get_embedded("nonexistent").is_none());
    }

    #[test]
    fn test_templates_take_description() {
        for name in ["questions", "brief", "plan"] {
            assert!(get_embedded(name).unwrap().contains("{{description}}"), "{name}");
        }
        assert!(BRIEF.contains("{{answers}}"));
    }
}
