mod commands;
mod tui;

use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use taskdesk_core::{AppConfig, Priority, SortStrategy, TaskFilter, TaskStatus, TokenStore};

const LOG_FILE_NAME: &str = "taskdesk.log";

#[derive(Parser)]
#[command(name = "taskdesk")]
#[command(about = "Terminal client for a remote task manager", long_about = None)]
struct Cli {
    /// Base URL of the task API (overrides config and TASKDESK_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Log in and store the session token
    Login {
        #[arg(short, long)]
        username: String,
        /// Read from TASKDESK_PASSWORD or prompted when omitted
        #[arg(short, long, env = "TASKDESK_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Forget the stored session token
    Logout,
    /// Show the current session
    Whoami,
    /// List tasks
    List {
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        priority: Option<String>,
        #[arg(long, value_enum, default_value_t = SortArg::Server)]
        sort: SortArg,
    },
    /// Show one task
    Show { id: i64 },
    /// Create a task (usage: add Buy milk due:tomorrow pri:high desc:two_liters)
    Add {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        args: Vec<String>,
    },
    /// Edit a task; free words replace the title, key:value pairs replace fields
    Edit {
        id: i64,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Change the status of a task
    Status { id: i64, status: String },
    /// Delete a task
    Delete {
        id: i64,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Open the Terminal User Interface
    Tui,
}

#[derive(Clone, Copy, ValueEnum)]
enum SortArg {
    Server,
    Priority,
    Due,
    Created,
}

impl From<SortArg> for SortStrategy {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Server => SortStrategy::Server,
            SortArg::Priority => SortStrategy::Priority,
            SortArg::Due => SortStrategy::DueDate,
            SortArg::Created => SortStrategy::Created,
        }
    }
}

fn init_tracing(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let level = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_env("TASKDESK_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    match log_file {
        // The TUI owns the terminal, so its logs go to a file.
        Some(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init(),
    }
    .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load()
        .context("failed to load configuration")?
        .with_api_url(cli.api_url);
    let data_dir = config.resolve_data_dir()?;
    let store = TokenStore::new(&data_dir);

    let command = cli.command.unwrap_or(Commands::Tui);
    let log_file = matches!(command, Commands::Tui).then(|| data_dir.join(LOG_FILE_NAME));
    init_tracing(cli.verbose, log_file.as_deref())?;
    tracing::debug!(api_url = %config.api_url, "configuration loaded");

    match command {
        Commands::Login { username, password } => {
            commands::login(&config, &store, &username, password)?;
        },
        Commands::Logout => commands::logout(&store)?,
        Commands::Whoami => commands::whoami(&store)?,
        Commands::List { status, priority, sort } => {
            let filter = TaskFilter {
                status: status.map(|s| s.parse::<TaskStatus>()).transpose()?,
                priority: priority.map(|p| p.parse::<Priority>()).transpose()?,
            };
            let service = commands::authed_service(&config, &store)?;
            commands::list(&service, filter, sort.into())?;
        },
        Commands::Show { id } => {
            let service = commands::authed_service(&config, &store)?;
            commands::show(&service, id)?;
        },
        Commands::Add { args } => {
            let service = commands::authed_service(&config, &store)?;
            commands::add(&service, &args)?;
        },
        Commands::Edit { id, args } => {
            let service = commands::authed_service(&config, &store)?;
            commands::edit(&service, id, &args)?;
        },
        Commands::Status { id, status } => {
            let service = commands::authed_service(&config, &store)?;
            commands::set_status(&service, id, &status)?;
        },
        Commands::Delete { id, yes } => {
            let service = commands::authed_service(&config, &store)?;
            commands::delete(&service, id, yes)?;
        },
        Commands::Tui => tui::run(&config, &store)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn add_collects_trailing_words() {
        let cli = Cli::try_parse_from(["taskdesk", "add", "Buy", "milk", "pri:h"]).unwrap();
        match cli.command {
            Some(Commands::Add { args }) => assert_eq!(args, vec!["Buy", "milk", "pri:h"]),
            _ => panic!("expected add"),
        }
    }

    #[test]
    fn global_api_url_after_subcommand() {
        let args = ["taskdesk", "list", "--sort", "due", "--api-url", "http://x:1"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.api_url.as_deref(), Some("http://x:1"));
        assert!(matches!(cli.command, Some(Commands::List { sort: SortArg::Due, .. })));
    }
}
