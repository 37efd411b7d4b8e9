//! ContextMgr - project planning assistant
//!
//! CLI entry point.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{CommandFactory, FromArgMatches};
use colored::Colorize;
use contextstore::ContextStore;
use eyre::{Context, Result};
use tracing::{debug, info, warn};

use contextmgr::cli::{Cli, Command, OutputFormat, generate_after_help, get_log_path};
use contextmgr::config::Config;
use contextmgr::context::index_plan;
use contextmgr::domain::{ClarificationAnswers, Question};
use contextmgr::planning::{GeneratedPlan, PlanStore, PlannerError, ProjectPlanner};
use contextmgr::prompts::PromptLoader;
use contextmgr::router::{ModelRole, ModelRouter};
use contextmgr::wizard::{Wizard, print_plan};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    let log_path = get_log_path();
    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    // Priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level).map(|s| s.to_uppercase()) {
        None => tracing::Level::INFO,
        Some(s) => match s.as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
    };

    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cmd = Cli::command().after_help(generate_after_help());
    let cli = Cli::from_arg_matches(&cmd.get_matches())?;

    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!(default = %config.llm.default, backends = config.llm.backends.len(), "ContextMgr loaded config");

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Some(Command::Ask { description, format }) => cmd_ask(&config, &description, format).await,
        Some(Command::Brief { description, answers }) => cmd_brief(&config, &description, answers).await,
        Some(Command::Plan { description, file }) => cmd_plan(&config, description, file).await,
        Some(Command::Show { path, format }) => cmd_show(&config, &path, format),
        Some(Command::History { limit }) => cmd_history(&config, limit),
        Some(Command::Search { query, limit }) => cmd_search(&config, &query, limit),
        Some(Command::Backends) => cmd_backends(&config),
        Some(Command::Wizard { description }) => cmd_wizard(&config, description).await,
        None => {
            Cli::command().after_help(generate_after_help()).print_help()?;
            Ok(())
        }
    }
}

fn build_planner(config: &Config) -> ProjectPlanner {
    let router = Arc::new(ModelRouter::from_config(&config.llm));
    ProjectPlanner::new(
        router,
        PromptLoader::new(&config.paths.prompts),
        PlanStore::new(&config.paths.plans),
    )
}

fn open_context(config: &Config) -> Result<ContextStore> {
    ContextStore::open(&config.paths.context)
        .with_context(|| format!("Failed to open context store at {}", config.paths.context.display()))
}

async fn cmd_ask(config: &Config, description: &str, format: OutputFormat) -> Result<()> {
    debug!(%format, "cmd_ask: called");
    let planner = build_planner(config);
    let questions = planner.generate_clarification_questions(description).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&questions)?),
        OutputFormat::Text => {
            if questions.is_empty() {
                println!("{}", "No clarification questions.".dimmed());
            }
            for (i, question) in questions.iter().enumerate() {
                print_question(i, question);
            }
        }
    }
    Ok(())
}

fn print_question(i: usize, question: &Question) {
    let id = question.id().unwrap_or("?");
    let kind = question.kind().map(|k| k.to_string()).unwrap_or_else(|| "raw".to_string());
    println!(
        "{} {} {}",
        format!("{}.", i + 1).bright_cyan(),
        question.prompt_text(),
        format!("[{} / {}]", id, kind).dimmed()
    );
    for option in question.options() {
        println!("   - {}", option);
    }
}

async fn cmd_brief(config: &Config, description: &str, answers: Vec<(String, String)>) -> Result<()> {
    debug!(answer_count = answers.len(), "cmd_brief: called");
    let planner = build_planner(config);
    let answers: ClarificationAnswers = answers.into_iter().collect();
    let brief = planner.generate_refined_brief(description, &answers).await?;
    println!("{}", brief.trim_end());
    Ok(())
}

async fn cmd_plan(config: &Config, description: Option<String>, file: Option<PathBuf>) -> Result<()> {
    debug!(?file, "cmd_plan: called");
    let input = match (description, file) {
        (_, Some(path)) => {
            fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?
        }
        (Some(description), None) => description,
        (None, None) => eyre::bail!("A description or --file is required"),
    };

    let planner = build_planner(config);
    let generated = match planner.generate_plan(&input).await {
        Ok(generated) => generated,
        Err(PlannerError::Persist { path, source, plan }) => {
            eprintln!("{} Could not save plan to {}: {}", "!".yellow(), path.display(), source);
            *plan
        }
        Err(e) => return Err(e.into()),
    };

    if generated.is_degraded() {
        eprintln!("{} The model reply could not be parsed as a plan:", "!".yellow());
        println!("{}", generated.plan);
        return Ok(());
    }

    print!("{}", generated.plan);
    if let Some(path) = &generated.path {
        println!("Saved to {}", path.display().to_string().bright_green());
        index_generated(config, &generated);
    }
    Ok(())
}

/// Index a saved plan; a failure here never fails the command
fn index_generated(config: &Config, generated: &GeneratedPlan) {
    match open_context(config).and_then(|store| index_plan(&store, generated, None)) {
        Ok(doc_id) => debug!(%doc_id, "index_generated: indexed"),
        Err(e) => {
            warn!(error = %e, "Failed to index plan");
            eprintln!("{} Could not index plan: {:#}", "!".yellow(), e);
        }
    }
}

fn cmd_show(config: &Config, path: &PathBuf, format: OutputFormat) -> Result<()> {
    debug!(path = %path.display(), %format, "cmd_show: called");
    let plan = PlanStore::new(&config.paths.plans).load(path)?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
        OutputFormat::Text => print_plan(&GeneratedPlan::from_plan(plan, Some(path.clone()))),
    }
    Ok(())
}

fn cmd_history(config: &Config, limit: usize) -> Result<()> {
    debug!(%limit, "cmd_history: called");
    let store = PlanStore::new(&config.paths.plans);
    let paths = store.list()?;
    if paths.is_empty() {
        println!("{}", format!("No plans in {}", store.dir().display()).dimmed());
        return Ok(());
    }

    for path in paths.iter().take(limit) {
        match store.load(path) {
            Ok(plan) => {
                let headline = plan.overview.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
                println!(
                    "{}  {} WPs, {} tasks  {}",
                    path.display().to_string().bright_green(),
                    plan.work_packages.len(),
                    plan.task_count(),
                    headline.dimmed()
                );
            }
            Err(e) => println!("{}  {}", path.display(), format!("{:#}", e).red()),
        }
    }
    Ok(())
}

fn cmd_search(config: &Config, query: &str, limit: usize) -> Result<()> {
    debug!(%query, %limit, "cmd_search: called");
    let store = open_context(config)?;
    let hits = store.search(query, limit)?;
    if hits.is_empty() {
        println!("{}", "No matches.".dimmed());
        return Ok(());
    }

    for hit in hits {
        let source = hit.metadata.get("path").map(String::as_str).unwrap_or(&hit.doc_id);
        let snippet: String = hit
            .text
            .lines()
            .filter(|l| !l.trim().is_empty() && !l.starts_with('#'))
            .take(1)
            .collect::<String>()
            .chars()
            .take(100)
            .collect();
        println!("{:.2}  {}", hit.score, source.bright_green());
        println!("      {}", snippet.dimmed());
    }
    Ok(())
}

fn cmd_backends(config: &Config) -> Result<()> {
    debug!("cmd_backends: called");
    let router = ModelRouter::from_config(&config.llm);

    println!("{}", "Backends:".bright_cyan());
    for backend in router.registry().iter() {
        let marker = if router.default_backend().map(|d| d.name()) == Some(backend.name()) {
            " (default)".yellow().to_string()
        } else {
            String::new()
        };
        println!(
            "  {} {:20} {:7} {}{}",
            "\u{2705}",
            backend.name(),
            backend.locality().to_string(),
            backend.client().model(),
            marker
        );
    }
    for skipped in router.registry().skipped() {
        println!("  {} {:20} {}", "\u{274C}", skipped.name, skipped.reason.dimmed());
    }

    println!();
    println!("{}", "Routing:".bright_cyan());
    for role in ModelRole::ALL {
        let resolved = match router.resolve(role) {
            Ok(backend) => backend.name().bright_green().to_string(),
            Err(e) => e.to_string().red().to_string(),
        };
        println!(
            "  {:9} {} {}",
            role.as_str(),
            resolved,
            format!("[{}]", router.routing().preferences(role).join(", ")).dimmed()
        );
    }
    Ok(())
}

async fn cmd_wizard(config: &Config, description: Option<String>) -> Result<()> {
    debug!("cmd_wizard: called");
    let planner = build_planner(config);
    let context = open_context(config)?;
    Wizard::new(planner, context)?.run(description).await
}
