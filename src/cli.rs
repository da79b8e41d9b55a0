use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "todo",
    about = "A small file-backed to-do list driven from a numbered menu.",
    long_about = "Without a subcommand, todo opens an interactive menu over the task file (./todo.txt by default).\n\nTasks are stored one per line as description|status|due and the file is replaced atomically on every change.",
    disable_help_subcommand = true
)]
pub(crate) struct Cli {
    /// Load configuration from PATH instead of ~/.config/todo.yml.
    #[arg(
        short = 'c',
        long = "config",
        global = true,
        value_name = "PATH",
        help = "Load configuration from PATH instead of ~/.config/todo.yml."
    )]
    pub(crate) config: Option<PathBuf>,

    /// Use PATH as the task file (overrides todo_file from the config).
    #[arg(
        short = 'f',
        long = "file",
        global = true,
        value_name = "PATH",
        help = "Use PATH as the task file (overrides todo_file from the config)."
    )]
    pub(crate) file: Option<PathBuf>,

    /// Append transition logs to PATH (overrides log_path from the config).
    #[arg(
        long = "log",
        global = true,
        value_name = "PATH",
        help = "Append transition logs to PATH (overrides log_path from the config)."
    )]
    pub(crate) log: Option<PathBuf>,

    #[arg(value_name = "ARG", hide = true)]
    pub(crate) positional: Vec<String>,

    #[command(subcommand)]
    pub(crate) command: Option<CliCommand>,
}

#[derive(Debug, Subcommand)]
pub(crate) enum CliCommand {
    #[command(about = "Check the task file for malformed lines without modifying it.")]
    /// Check the task file for malformed lines without modifying it.
    Doctor,
}
