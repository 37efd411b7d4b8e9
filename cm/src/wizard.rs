//! Interactive planning session
//!
//! Walks a project description through questions, brief and plan, then
//! drops into an edit loop where slash commands change the plan. Every
//! change re-renders the document, rewrites it on disk and re-indexes it.

use colored::Colorize;
use contextstore::{ContextStore, DocId};
use eyre::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::{debug, warn};

use crate::context::index_plan;
use crate::domain::{ClarificationAnswers, Plan, PlanEditError, Question, QuestionKind, task_id, wp_id};
use crate::planning::{GeneratedPlan, PlannerError, ProjectPlanner};

/// One edit to apply to a plan; indices are zero-based
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditCommand {
    AddWorkPackage(Option<String>),
    RemoveWorkPackage(usize),
    RenameWorkPackage(usize, String),
    MoveWorkPackage(usize, usize),
    AddTask(usize, Option<String>),
    RemoveTask(usize, usize),
    EditTask(usize, usize, String),
    MoveTask(usize, usize, usize),
}

impl EditCommand {
    /// Apply to a plan in place
    pub fn apply(&self, plan: &mut Plan) -> Result<(), PlanEditError> {
        debug!(?self, "EditCommand::apply: called");
        match self {
            Self::AddWorkPackage(title) => {
                plan.add_work_package(title.as_deref());
            }
            Self::RemoveWorkPackage(wp) => {
                plan.remove_work_package(*wp)?;
            }
            Self::RenameWorkPackage(wp, title) => plan.rename_work_package(*wp, title.clone())?,
            Self::MoveWorkPackage(from, to) => plan.move_work_package(*from, *to)?,
            Self::AddTask(wp, text) => {
                plan.add_task(*wp, text.as_deref())?;
            }
            Self::RemoveTask(wp, task) => {
                plan.remove_task(*wp, *task)?;
            }
            Self::EditTask(wp, task, text) => plan.edit_task(*wp, *task, text.clone())?,
            Self::MoveTask(wp, from, to) => plan.move_task(*wp, *from, *to)?,
        }
        Ok(())
    }
}

/// What a line typed in the edit loop means
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashCommand {
    Edit(EditCommand),
    Show,
    Help,
    Done,
}

/// Parse a slash command; numbers are one-based as displayed
pub fn parse_slash_command(input: &str) -> Result<SlashCommand, String> {
    let mut parts = input.trim().splitn(2, char::is_whitespace);
    let cmd = parts.next().unwrap_or("");
    let rest = parts.next().unwrap_or("").trim();

    let edit = match cmd {
        "/help" | "/h" => return Ok(SlashCommand::Help),
        "/show" | "/s" => return Ok(SlashCommand::Show),
        "/done" | "/quit" | "/q" => return Ok(SlashCommand::Done),
        "/add-wp" => EditCommand::AddWorkPackage(non_empty(rest)),
        "/rm-wp" => {
            let (wp, _) = take_index(rest)?;
            EditCommand::RemoveWorkPackage(wp)
        }
        "/rename-wp" => {
            let (wp, title) = take_index(rest)?;
            EditCommand::RenameWorkPackage(wp, required_text(title)?)
        }
        "/move-wp" => {
            let (from, rest) = take_index(rest)?;
            let (to, _) = take_index(rest)?;
            EditCommand::MoveWorkPackage(from, to)
        }
        "/add-task" => {
            let (wp, text) = take_index(rest)?;
            EditCommand::AddTask(wp, non_empty(text))
        }
        "/rm-task" => {
            let (wp, rest) = take_index(rest)?;
            let (task, _) = take_index(rest)?;
            EditCommand::RemoveTask(wp, task)
        }
        "/edit-task" => {
            let (wp, rest) = take_index(rest)?;
            let (task, text) = take_index(rest)?;
            EditCommand::EditTask(wp, task, required_text(text)?)
        }
        "/move-task" => {
            let (wp, rest) = take_index(rest)?;
            let (from, rest) = take_index(rest)?;
            let (to, _) = take_index(rest)?;
            EditCommand::MoveTask(wp, from, to)
        }
        other => return Err(format!("Unknown command: {}", other)),
    };
    Ok(SlashCommand::Edit(edit))
}

/// Split off a leading one-based number (or `WP003`), returning it zero-based
fn take_index(s: &str) -> Result<(usize, &str), String> {
    let s = s.trim_start();
    let (token, rest) = s.split_once(char::is_whitespace).unwrap_or((s, ""));
    if token.is_empty() {
        return Err("Missing number".to_string());
    }
    let digits = token
        .strip_prefix("WP")
        .or_else(|| token.strip_prefix("wp"))
        .unwrap_or(token);
    match digits.parse::<usize>() {
        Ok(n) if n >= 1 => Ok((n - 1, rest.trim())),
        _ => Err(format!("Expected a number starting at 1, got '{}'", token)),
    }
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

fn required_text(s: &str) -> Result<String, String> {
    non_empty(s).ok_or_else(|| "Missing text".to_string())
}

/// Resolve a typed answer: an option number picks that option, y/n normalizes
pub fn normalize_answer(question: &Question, input: &str) -> String {
    let input = input.trim();
    match question.kind() {
        Some(QuestionKind::MultipleChoice) => input
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| question.options().get(i))
            .cloned()
            .unwrap_or_else(|| input.to_string()),
        Some(QuestionKind::YesNo) => match input.to_lowercase().as_str() {
            "y" | "yes" => "Yes".to_string(),
            "n" | "no" => "No".to_string(),
            _ => input.to_string(),
        },
        _ => input.to_string(),
    }
}

/// Interactive session over a planner and a context store
pub struct Wizard {
    planner: ProjectPlanner,
    context: ContextStore,
    rl: DefaultEditor,
}

impl Wizard {
    pub fn new(planner: ProjectPlanner, context: ContextStore) -> Result<Self> {
        let rl = DefaultEditor::new().map_err(|e| eyre::eyre!("Failed to initialize readline: {}", e))?;
        Ok(Self { planner, context, rl })
    }

    /// Read one line; `None` on Ctrl+C or Ctrl+D
    fn prompt(&mut self, label: &str) -> Result<Option<String>> {
        match self.rl.readline(&format!("{} ", label.bright_green())) {
            Ok(line) => {
                let _ = self.rl.add_history_entry(line.as_str());
                Ok(Some(line.trim().to_string()))
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
            Err(err) => Err(eyre::eyre!("Readline error: {}", err)),
        }
    }

    /// Run the whole session
    pub async fn run(&mut self, description: Option<String>) -> Result<()> {
        println!();
        println!("{}", "contextmgr planning wizard".bright_cyan().bold());
        println!("Press {} to stop at any prompt", "Ctrl+D".yellow());
        println!();

        let description = match description.filter(|d| !d.trim().is_empty()) {
            Some(d) => d,
            None => match self.prompt("Describe your project >")? {
                Some(d) if !d.is_empty() => d,
                _ => return Ok(()),
            },
        };

        println!("{}", "Generating clarification questions...".dimmed());
        let questions = self.planner.generate_clarification_questions(&description).await?;
        let Some(answers) = self.ask_questions(&questions)? else {
            return Ok(());
        };

        println!("{}", "Refining project brief...".dimmed());
        let brief = self.planner.generate_refined_brief(&description, &answers).await?;
        println!();
        println!("{}", "Refined Brief".bright_cyan().bold());
        println!("{}", brief.trim());
        println!();

        let plan_input = match self.prompt("Plan from this brief? [Y/n] >")? {
            None => return Ok(()),
            Some(reply) if reply.eq_ignore_ascii_case("n") || reply.eq_ignore_ascii_case("no") => description,
            Some(_) => brief,
        };

        println!("{}", "Generating development plan...".dimmed());
        let generated = match self.planner.generate_plan(&plan_input).await {
            Ok(generated) => generated,
            Err(PlannerError::Persist { path, source, plan }) => {
                println!(
                    "{} Could not save plan to {}: {}",
                    "!".yellow(),
                    path.display(),
                    source
                );
                *plan
            }
            Err(e) => return Err(e.into()),
        };

        if generated.is_degraded() {
            println!("{} The model reply could not be parsed as a plan:", "!".yellow());
            println!("{}", generated.plan);
            return Ok(());
        }

        self.edit_loop(generated)
    }

    fn ask_questions(&mut self, questions: &[Question]) -> Result<Option<ClarificationAnswers>> {
        let mut answers = ClarificationAnswers::new();
        if questions.is_empty() {
            println!("{}", "No clarification questions.".dimmed());
            return Ok(Some(answers));
        }

        for (i, question) in questions.iter().enumerate() {
            println!();
            println!("{} {}", format!("{}.", i + 1).bright_cyan(), question.prompt_text());
            for (n, option) in question.options().iter().enumerate() {
                println!("   {} {}", format!("{})", n + 1).yellow(), option);
            }
            let label = match question.kind() {
                Some(QuestionKind::YesNo) => "[y/n] >",
                _ => ">",
            };
            let Some(input) = self.prompt(label)? else {
                return Ok(None);
            };
            if input.is_empty() {
                continue;
            }
            let id = question.id().map(str::to_string).unwrap_or_else(|| format!("q{}", i + 1));
            answers.set(id, normalize_answer(question, &input));
        }
        Ok(Some(answers))
    }

    fn edit_loop(&mut self, mut generated: GeneratedPlan) -> Result<()> {
        let mut indexed: Option<DocId> = self.reindex(&generated, None);
        print_plan(&generated);
        print_edit_help();

        loop {
            let Some(input) = self.prompt("edit >")? else {
                break;
            };
            if input.is_empty() {
                continue;
            }

            let command = match parse_slash_command(&input) {
                Ok(command) => command,
                Err(msg) => {
                    println!("{} {}", "?".yellow(), msg);
                    continue;
                }
            };

            match command {
                SlashCommand::Help => print_edit_help(),
                SlashCommand::Show => print_plan(&generated),
                SlashCommand::Done => break,
                SlashCommand::Edit(edit) => {
                    let mut plan = generated.to_plan();
                    if let Err(e) = edit.apply(&mut plan) {
                        println!("{} {}", "?".yellow(), e);
                        continue;
                    }
                    generated = match self.planner.apply_edits(&generated, plan.clone()) {
                        Ok(updated) => updated,
                        Err(e) => {
                            println!("{} {}", "!".yellow(), e);
                            GeneratedPlan::from_plan(plan, generated.path.clone())
                        }
                    };
                    indexed = self.reindex(&generated, indexed.as_deref());
                    print_plan(&generated);
                }
            }
        }

        if let Some(path) = &generated.path {
            println!("Plan saved to {}", path.display().to_string().bright_green());
        }
        Ok(())
    }

    fn reindex(&self, generated: &GeneratedPlan, previous: Option<&str>) -> Option<DocId> {
        match index_plan(&self.context, generated, previous) {
            Ok(doc_id) => Some(doc_id),
            Err(e) => {
                warn!(error = %e, "Failed to index plan");
                println!("{} Could not index plan: {:#}", "!".yellow(), e);
                previous.map(str::to_string)
            }
        }
    }
}

/// Print a plan with its derived ids
pub fn print_plan(generated: &GeneratedPlan) {
    println!();
    println!("{}", "Development Plan".bright_cyan().bold());
    println!("{}", generated.overview.trim());
    println!();
    for (i, wp) in generated.work_packages.iter().enumerate() {
        println!("{} {}", format!("{}:", wp_id(i)).bright_cyan(), wp.title.bold());
        for (j, task) in wp.tasks.iter().enumerate() {
            println!("  {} {}", format!("{}:", task_id(i, j)).yellow(), task);
        }
    }
    println!();
}

fn print_edit_help() {
    println!("{}", "Edit Commands:".bright_cyan());
    println!("  {:32} Add a work package", "/add-wp [TITLE]".yellow());
    println!("  {:32} Remove a work package", "/rm-wp WP".yellow());
    println!("  {:32} Rename a work package", "/rename-wp WP TITLE".yellow());
    println!("  {:32} Move a work package", "/move-wp FROM TO".yellow());
    println!("  {:32} Add a task", "/add-task WP [TEXT]".yellow());
    println!("  {:32} Remove a task", "/rm-task WP TASK".yellow());
    println!("  {:32} Replace a task's text", "/edit-task WP TASK TEXT".yellow());
    println!("  {:32} Move a task within its work package", "/move-task WP FROM TO".yellow());
    println!("  {:32} Print the plan", "/show".yellow());
    println!("  {:32} Finish", "/done".yellow());
    println!("Numbers start at 1; WP accepts 2 or WP002.");
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ClarificationQuestion, WorkPackage};

    #[test]
    fn test_parse_edit_commands() {
        assert_eq!(
            parse_slash_command("/add-wp Release prep").unwrap(),
            SlashCommand::Edit(EditCommand::AddWorkPackage(Some("Release prep".to_string())))
        );
        assert_eq!(
            parse_slash_command("/add-wp").unwrap(),
            SlashCommand::Edit(EditCommand::AddWorkPackage(None))
        );
        assert_eq!(
            parse_slash_command("/edit-task WP002 3 Write the docs").unwrap(),
            SlashCommand::Edit(EditCommand::EditTask(1, 2, "Write the docs".to_string()))
        );
        assert_eq!(
            parse_slash_command("/move-task 1 2 1").unwrap(),
            SlashCommand::Edit(EditCommand::MoveTask(0, 1, 0))
        );
        assert_eq!(parse_slash_command("/q").unwrap(), SlashCommand::Done);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(parse_slash_command("/rm-wp").is_err());
        assert!(parse_slash_command("/rm-wp 0").is_err());
        assert!(parse_slash_command("/rename-wp 1").is_err());
        assert!(parse_slash_command("/frobnicate").is_err());
    }

    #[test]
    fn test_apply_edit_commands() {
        let mut plan = Plan::new("o", vec![WorkPackage::with_tasks("Setup", ["Init repo", "Add CI"])]);

        EditCommand::MoveTask(0, 1, 0).apply(&mut plan).unwrap();
        EditCommand::AddWorkPackage(Some("Ship".to_string())).apply(&mut plan).unwrap();
        EditCommand::RemoveTask(1, 0).apply(&mut plan).unwrap();

        assert_eq!(plan.work_packages[0].tasks, vec!["Add CI", "Init repo"]);
        assert_eq!(plan.work_packages[1], WorkPackage::new("Ship"));
        assert!(EditCommand::RemoveWorkPackage(7).apply(&mut plan).is_err());
    }

    #[test]
    fn test_normalize_answer() {
        let choice = Question::Typed(ClarificationQuestion {
            id: "platform".to_string(),
            question: "Platform?".to_string(),
            kind: QuestionKind::MultipleChoice,
            options: vec!["Web".to_string(), "Mobile".to_string()],
        });
        assert_eq!(normalize_answer(&choice, "2"), "Mobile");
        assert_eq!(normalize_answer(&choice, "9"), "9");
        assert_eq!(normalize_answer(&choice, "Desktop"), "Desktop");

        let yes_no = Question::Typed(ClarificationQuestion {
            id: "deadline".to_string(),
            question: "Deadline?".to_string(),
            kind: QuestionKind::YesNo,
            options: vec![],
        });
        assert_eq!(normalize_answer(&yes_no, "Y"), "Yes");
        assert_eq!(normalize_answer(&yes_no, "no"), "No");
    }
}
