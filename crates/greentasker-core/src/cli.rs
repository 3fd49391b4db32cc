use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "greentasker",
    version,
    about = "GreenTasker: a password-gated personal task list",
    disable_help_subcommand = true
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    #[arg(long = "rc", global = true)]
    pub rc: Option<PathBuf>,

    #[arg(long = "data", global = true)]
    pub data: Option<PathBuf>,

    #[arg(long = "session", global = true)]
    pub session: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

const TASK_REF_HELP: &str =
    "List position (1-based), full id, or id prefix; numbers resolve as positions first";

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Open the session with the shared password
    Unlock { password: String },

    /// End the session
    Lock,

    /// Add a task to the top of the list
    Add {
        #[arg(required = true, num_args = 1..)]
        title: Vec<String>,

        #[arg(long)]
        due: Option<String>,
    },

    /// Show the list
    List,

    /// Flip a task between done and not done
    Toggle {
        #[arg(help = TASK_REF_HELP)]
        task: String,
    },

    /// Delete a task
    Remove {
        #[arg(help = TASK_REF_HELP)]
        task: String,
    },

    /// Replace a task's title and due date
    Edit {
        #[arg(help = TASK_REF_HELP)]
        task: String,

        #[arg(required = true, num_args = 1..)]
        title: Vec<String>,

        #[arg(long, conflicts_with = "clear_due")]
        due: Option<String>,

        #[arg(long)]
        clear_due: bool,
    },

    /// Move a task to the position held by another
    Move {
        #[arg(help = TASK_REF_HELP)]
        source: String,

        #[arg(help = TASK_REF_HELP)]
        target: String,
    },

    /// Show or change the theme
    Theme { mode: Option<ThemeArg> },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeArg {
    Dark,
    Light,
    Toggle,
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}
