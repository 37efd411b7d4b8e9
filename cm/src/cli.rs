//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

/// contextmgr - project planning assistant
#[derive(Parser)]
#[command(
    name = "cm",
    about = "Turn a project idea into clarification questions, a refined brief and a development plan",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate clarification questions for a project description
    Ask {
        /// Project description
        description: String,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Generate a refined brief from a description and answers
    Brief {
        /// Project description
        description: String,

        /// Answer to a clarification question, as ID=ANSWER (repeatable)
        #[arg(short, long = "answer", value_name = "ID=ANSWER", value_parser = parse_answer)]
        answers: Vec<(String, String)>,
    },

    /// Generate a development plan and save it as markdown
    Plan {
        /// Project description or refined brief
        #[arg(required_unless_present = "file")]
        description: Option<String>,

        /// Read the description from a file instead
        #[arg(short, long, conflicts_with = "description")]
        file: Option<PathBuf>,
    },

    /// Show a saved plan document
    Show {
        /// Path to a plan-*.md file
        path: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// List saved plans, newest first
    History {
        /// Maximum number of plans to list
        #[arg(short = 'n', long, default_value = "10")]
        limit: usize,
    },

    /// Search indexed plans
    Search {
        /// Free-text query
        query: String,

        /// Number of results
        #[arg(short = 'k', long, default_value_t = contextstore::DEFAULT_SEARCH_LIMIT)]
        limit: usize,
    },

    /// Show configured backends and how each role resolves
    Backends,

    /// Interactive questions -> brief -> plan session
    Wizard {
        /// Project description (prompted for when omitted)
        description: Option<String>,
    },
}

/// Parse `ID=ANSWER` into its parts
pub fn parse_answer(s: &str) -> Result<(String, String), String> {
    debug!(%s, "parse_answer: called");
    let (id, answer) = s
        .split_once('=')
        .ok_or_else(|| format!("Expected ID=ANSWER, got '{}'", s))?;
    let id = id.trim();
    if id.is_empty() {
        return Err(format!("Missing question id in '{}'", s));
    }
    Ok((id.to_string(), answer.trim().to_string()))
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    debug!("get_log_path: called");
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("contextmgr")
        .join("logs")
        .join("contextmgr.log")
}

/// Generate the after_help text
pub fn generate_after_help() -> String {
    format!(
        "Config is read from --config, ./.contextmgr.yml or ~/.config/contextmgr/contextmgr.yml\n\
         Logs are written to: {}\n",
        get_log_path().display()
    )
}

/// Output format for commands that print structured data
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "OutputFormat::from_str: called");
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use text or json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}
