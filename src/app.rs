use clap::Parser;
use std::env;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;

use crate::cli::{Cli, CliCommand};
use crate::config::{load_config, Config, LoadedConfig};
use crate::doctor::diagnose;
use crate::logger::{sanitize_log_value, Logger};
use crate::shell::{report_fatal, run_shell, TerminalShellIo};
use crate::store::{TaskStore, DEFAULT_TODO_FILE};

const DEFAULT_CONFIG_REL: &str = ".config/todo.yml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AppMode {
    Shell,
    Doctor,
}

#[derive(Debug)]
pub(crate) struct Quit {
    pub(crate) code: i32,
    #[allow(dead_code)]
    pub(crate) reason: String,
}

impl Quit {
    pub(crate) fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.code as u8)
    }
}

pub(crate) fn quit(logger: &Logger, reason: &str, code: i32) -> Quit {
    let sanitized = if reason.trim().is_empty() {
        "unknown".to_string()
    } else {
        sanitize_log_value(reason)
    };
    logger.log_transition(&format!("quit reason={}", sanitized));
    Quit {
        code,
        reason: reason.to_string(),
    }
}

fn home_dir() -> Option<PathBuf> {
    env::var_os("HOME")
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

/// Reads the explicit config, or the default one when it exists. Only an
/// explicitly named config is required to exist.
fn resolve_config(explicit: Option<PathBuf>) -> Result<Option<(PathBuf, LoadedConfig)>, String> {
    let (path, required) = match explicit {
        Some(path) => (path, true),
        None => match home_dir() {
            Some(home) => (home.join(DEFAULT_CONFIG_REL), false),
            None => return Ok(None),
        },
    };
    if !path.is_file() {
        if required {
            return Err(format!("Missing config file: {}", path.display()));
        }
        return Ok(None);
    }
    let loaded = load_config(&path)?;
    Ok(Some((path, loaded)))
}

fn run_with_cli_impl<F>(cli: Cli, shell_runner: F) -> Result<(), Quit>
where
    F: FnOnce(&TaskStore<'_>) -> Result<(), String>,
{
    let mode = match cli.command {
        Some(CliCommand::Doctor) => AppMode::Doctor,
        None => AppMode::Shell,
    };

    if !cli.positional.is_empty() {
        let message = format!(
            "Positional arguments are not supported: {}\nThe task list is edited from the interactive menu; run todo without arguments.",
            cli.positional.join(" ")
        );
        eprintln!("{}", message);
        return Err(Quit {
            code: 1,
            reason: "positional_args_not_supported".to_string(),
        });
    }

    let resolved = resolve_config(cli.config).map_err(|message| {
        eprintln!("{}", message);
        Quit {
            code: 1,
            reason: message,
        }
    })?;
    let (config_source, config, config_warnings) = match resolved {
        Some((path, loaded)) => (
            path.display().to_string(),
            loaded.config.expand_home(home_dir().as_deref()),
            loaded.warnings.len(),
        ),
        None => ("defaults".to_string(), Config::default(), 0),
    };

    let log_path = cli.log.or(config.log_path);
    let todo_file = cli
        .file
        .or(config.todo_file)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_TODO_FILE));

    let logger = Logger::new(log_path);
    logger.log_transition(&format!(
        "config source={} unknown_keys={} todo_file={}",
        config_source,
        config_warnings,
        todo_file.display()
    ));
    let store = TaskStore::new(todo_file, &logger);

    match mode {
        AppMode::Doctor => {
            let report = diagnose(&store).map_err(|message| {
                eprintln!("{}", message);
                quit(&logger, &message, 1)
            })?;
            for line in &report.lines {
                println!("{}", line);
            }
            if report.problems > 0 {
                return Err(quit(
                    &logger,
                    &format!("doctor found {} problem(s)", report.problems),
                    1,
                ));
            }
            Ok(())
        }
        AppMode::Shell => shell_runner(&store).map_err(|message| quit(&logger, &message, 1)),
    }
}

fn run_terminal_shell(store: &TaskStore<'_>) -> Result<(), String> {
    let mut io = TerminalShellIo::new();
    run_shell(store, &mut io).map_err(|message| {
        report_fatal(&mut io, &message);
        message
    })
}

pub(crate) fn run_with_cli(cli: Cli) -> Result<(), Quit> {
    run_with_cli_impl(cli, run_terminal_shell)
}

#[cfg(test)]
pub(crate) fn run_with_cli_for_test<F>(cli: Cli, shell_runner: F) -> Result<(), Quit>
where
    F: FnOnce(&TaskStore<'_>) -> Result<(), String>,
{
    run_with_cli_impl(cli, shell_runner)
}

pub(crate) fn run_with_args(args: Vec<OsString>) -> Result<(), Quit> {
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) => {
            // Rendered by hand so help and errors go through the captured streams.
            eprintln!("{err}");
            return Err(Quit {
                code: err.exit_code(),
                reason: "cli_parse".to_string(),
            });
        }
    };
    run_with_cli(cli)
}

pub(crate) fn main_with_args(args: Vec<OsString>) -> ExitCode {
    match run_with_args(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(quit) => quit.exit_code(),
    }
}

pub(crate) fn main() -> ExitCode {
    main_with_args(env::args_os().collect())
}
