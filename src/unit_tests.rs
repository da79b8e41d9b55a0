use clap::Parser;
use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;

use crate::app::{run_with_args, run_with_cli_for_test};
use crate::cli::{Cli, CliCommand};
use crate::ops;
use crate::shell::{run_shell, TestShellIo};
use crate::store::TaskStore;
use crate::task_types::Task;

pub(crate) static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Points HOME at a fresh directory so the user's real config is never read.
fn isolated_home() -> TempDir {
    let home = TempDir::new().expect("temp home");
    env::set_var("HOME", home.path());
    home
}

fn args(values: &[&str]) -> Vec<OsString> {
    std::iter::once("todo")
        .chain(values.iter().copied())
        .map(OsString::from)
        .collect()
}

fn path_arg(path: &Path) -> String {
    path.display().to_string()
}

fn parse(values: &[&str]) -> Cli {
    Cli::try_parse_from(args(values)).expect("parse cli")
}

fn capture_store_path(cli: Cli) -> Result<PathBuf, i32> {
    let mut seen = None;
    run_with_cli_for_test(cli, |store: &TaskStore<'_>| {
        seen = Some(store.path().to_path_buf());
        Ok(())
    })
    .map_err(|quit| quit.code)?;
    Ok(seen.expect("shell runner should be called"))
}

#[test]
fn no_arguments_opens_shell_on_default_file() {
    let _guard = ENV_MUTEX.lock().unwrap();
    let _home = isolated_home();

    let cli = parse(&[]);
    assert!(cli.command.is_none());
    assert_eq!(capture_store_path(cli), Ok(PathBuf::from("todo.txt")));
}

#[test]
fn default_config_supplies_todo_file() {
    let _guard = ENV_MUTEX.lock().unwrap();
    let home = isolated_home();
    let config_dir = home.path().join(".config");
    fs::create_dir_all(&config_dir).expect("config dir");
    fs::write(config_dir.join("todo.yml"), "todo_file: /tmp/elsewhere.txt\n").expect("config");

    assert_eq!(
        capture_store_path(parse(&[])),
        Ok(PathBuf::from("/tmp/elsewhere.txt"))
    );
}

#[test]
fn config_paths_starting_with_tilde_resolve_under_home() {
    let _guard = ENV_MUTEX.lock().unwrap();
    let home = isolated_home();
    let config_dir = home.path().join(".config");
    fs::create_dir_all(&config_dir).expect("config dir");
    fs::write(config_dir.join("todo.yml"), "todo_file: ~/lists/todo.txt\n").expect("config");

    assert_eq!(
        capture_store_path(parse(&[])),
        Ok(home.path().join("lists").join("todo.txt"))
    );
}

#[test]
fn file_flag_overrides_config() {
    let _guard = ENV_MUTEX.lock().unwrap();
    let _home = isolated_home();
    let temp = TempDir::new().expect("temp dir");
    let config = temp.path().join("todo.yml");
    fs::write(&config, "todo_file: from-config.txt\n").expect("config");

    let cli = parse(&["-c", &path_arg(&config), "--file", "from-flag.txt"]);
    assert_eq!(capture_store_path(cli), Ok(PathBuf::from("from-flag.txt")));
}

#[test]
fn missing_explicit_config_fails() {
    let _guard = ENV_MUTEX.lock().unwrap();
    let _home = isolated_home();
    let temp = TempDir::new().expect("temp dir");
    let config = temp.path().join("absent.yml");

    let cli = parse(&["--config", &path_arg(&config)]);
    assert_eq!(capture_store_path(cli), Err(1));
}

#[test]
fn invalid_config_fails_before_shell() {
    let _guard = ENV_MUTEX.lock().unwrap();
    let _home = isolated_home();
    let temp = TempDir::new().expect("temp dir");
    let config = temp.path().join("todo.yml");
    fs::write(&config, "todo_file: 42\n").expect("config");

    let cli = parse(&["--config", &path_arg(&config)]);
    assert_eq!(capture_store_path(cli), Err(1));
}

#[test]
fn positional_arguments_are_rejected() {
    let _guard = ENV_MUTEX.lock().unwrap();
    let _home = isolated_home();

    let result = run_with_args(args(&["buy", "milk"]));
    let quit = result.expect_err("positional args should fail");
    assert_eq!(quit.code, 1);
    assert_eq!(quit.reason, "positional_args_not_supported");
}

#[test]
fn unknown_flag_uses_clap_exit_code() {
    let _guard = ENV_MUTEX.lock().unwrap();
    let _home = isolated_home();

    let quit = run_with_args(args(&["--bogus"])).expect_err("unknown flag");
    assert_eq!(quit.code, 2);
    assert_eq!(quit.reason, "cli_parse");
}

#[test]
fn doctor_subcommand_parses() {
    let cli = parse(&["doctor", "--file", "x.txt"]);
    assert!(matches!(cli.command, Some(CliCommand::Doctor)));
    assert_eq!(cli.file, Some(PathBuf::from("x.txt")));
}

#[test]
fn doctor_exit_status_reflects_malformed_lines() {
    let _guard = ENV_MUTEX.lock().unwrap();
    let _home = isolated_home();
    let temp = TempDir::new().expect("temp dir");
    let todo = temp.path().join("todo.txt");

    fs::write(&todo, "A|pending|\n").expect("seed");
    assert!(run_with_args(args(&["doctor", "--file", &path_arg(&todo)])).is_ok());

    fs::write(&todo, "A|pending|\nbroken\n").expect("seed");
    let quit = run_with_args(args(&["doctor", "--file", &path_arg(&todo)]))
        .expect_err("malformed line should fail doctor");
    assert_eq!(quit.code, 1);
    assert_eq!(
        fs::read_to_string(&todo).expect("read"),
        "A|pending|\nbroken\n"
    );
}

#[test]
fn shell_failure_is_logged_and_exits_nonzero() {
    let _guard = ENV_MUTEX.lock().unwrap();
    let _home = isolated_home();
    let temp = TempDir::new().expect("temp dir");
    let log = temp.path().join("todo.log");

    let cli = parse(&["--log", &path_arg(&log)]);
    let quit = run_with_cli_for_test(cli, |_store: &TaskStore<'_>| {
        Err("Failed to replace task file todo.txt: denied".to_string())
    })
    .expect_err("shell failure");
    assert_eq!(quit.code, 1);

    let log = fs::read_to_string(&log).expect("read log");
    assert!(log.contains("config source=defaults"), "log: {log}");
    assert!(
        log.contains("quit reason=Failed to replace task file"),
        "log: {log}"
    );
}

#[test]
fn full_session_matches_operations() {
    let _guard = ENV_MUTEX.lock().unwrap();
    let _home = isolated_home();
    let temp = TempDir::new().expect("temp dir");
    let todo = temp.path().join("todo.txt");
    let log = temp.path().join("todo.log");

    let cli = parse(&["--file", &path_arg(&todo), "--log", &path_arg(&log)]);
    let mut stdout = String::new();
    run_with_cli_for_test(cli, |store: &TaskStore<'_>| {
        let mut io = TestShellIo::new(&[
            "2", "Buy milk", "", "2", "Pay rent", "1st", "2", "Call mom", "", "4", "2", "3",
            "1", "5", "2", "Call dad", "", "1", "6",
        ]);
        let result = run_shell(store, &mut io);
        stdout = io.stdout;
        result
    })
    .expect("session");

    assert!(
        stdout.contains("1. ✅ Pay rent (Due: 1st)\n2. ❌ Call dad\n"),
        "stdout: {stdout}"
    );

    let logger = crate::logger::Logger::disabled();
    let store = TaskStore::new(&todo, &logger);
    let expected = vec![
        Task {
            description: "Pay rent".to_string(),
            done: true,
            due: "1st".to_string(),
        },
        Task::pending("Call dad", ""),
    ];
    assert_eq!(store.load().expect("load"), expected);
    assert_eq!(
        ops::render(&expected),
        "\n📋 Your To-Do List:\n1. ✅ Pay rent (Due: 1st)\n2. ❌ Call dad\n"
    );

    let log = fs::read_to_string(&log).expect("read log");
    for needle in [
        "shell start",
        "shell choice=add",
        "op mark_done number=2",
        "op delete number=1 remaining=2",
        "op edit number=2 text_changed=true due_changed=false",
        "shell end reason=exit",
    ] {
        assert!(log.contains(needle), "missing {needle:?} in log: {log}");
    }
}
