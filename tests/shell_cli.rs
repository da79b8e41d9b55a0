use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

fn run_todo(home: &Path, cwd: &Path, extra_args: &[&str], stdin: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_todo"))
        .args(extra_args)
        .current_dir(cwd)
        .env("HOME", home)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn todo");
    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(stdin.as_bytes())
        .expect("write stdin");
    child.wait_with_output().expect("wait for todo")
}

#[test]
fn scripted_session_writes_todo_file_in_working_directory() {
    let home = TempDir::new().expect("temp home");
    let work = TempDir::new().expect("temp cwd");

    let output = run_todo(
        home.path(),
        work.path(),
        &[],
        "2\nBuy milk\n\n2\nFile taxes\n2025-04-15\n4\n2\n1\n6\n",
    );

    assert!(output.status.success(), "status: {:?}", output.status);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("1. ❌ Buy milk\n2. ✅ File taxes (Due: 2025-04-15)\n"),
        "stdout: {stdout}"
    );
    assert!(stdout.contains("👋 Goodbye!"), "stdout: {stdout}");

    let contents = fs::read_to_string(work.path().join("todo.txt")).expect("read todo.txt");
    assert_eq!(contents, "Buy milk|pending|\nFile taxes|done|2025-04-15\n");

    let leftovers: Vec<_> = fs::read_dir(work.path())
        .expect("read dir")
        .map(|entry| entry.expect("entry").file_name())
        .collect();
    assert_eq!(leftovers.len(), 1, "unexpected files: {leftovers:?}");
}

#[test]
fn closed_stdin_exits_successfully_without_writing() {
    let home = TempDir::new().expect("temp home");
    let work = TempDir::new().expect("temp cwd");

    let output = run_todo(home.path(), work.path(), &[], "");

    assert!(output.status.success(), "status: {:?}", output.status);
    assert!(!work.path().join("todo.txt").exists());
}

#[test]
fn unwritable_target_directory_is_fatal() {
    let home = TempDir::new().expect("temp home");
    let work = TempDir::new().expect("temp cwd");
    let target = work.path().join("missing").join("todo.txt");

    let output = run_todo(
        home.path(),
        work.path(),
        &["--file", &target.display().to_string()],
        "2\nBuy milk\n\n6\n",
    );

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error: "), "stderr: {stderr}");
    assert!(!target.exists());
}

#[test]
fn doctor_reports_malformed_lines() {
    let home = TempDir::new().expect("temp home");
    let work = TempDir::new().expect("temp cwd");
    fs::write(work.path().join("todo.txt"), "Buy milk|pending|\nhalf|line\n").expect("seed");

    let output = run_todo(home.path(), work.path(), &["doctor"], "");

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("tasks: 1 (0 done, 1 pending)"), "stdout: {stdout}");
    assert!(stdout.contains("malformed line 2"), "stdout: {stdout}");
}

#[test]
fn config_in_home_selects_task_file() {
    let home = TempDir::new().expect("temp home");
    let work = TempDir::new().expect("temp cwd");
    let config_dir = home.path().join(".config");
    fs::create_dir_all(&config_dir).expect("config dir");
    let target = work.path().join("lists").join("home.txt");
    fs::create_dir_all(target.parent().expect("parent")).expect("lists dir");
    fs::write(
        config_dir.join("todo.yml"),
        format!("todo_file: {}\n", target.display()),
    )
    .expect("config");

    let output = run_todo(home.path(), work.path(), &[], "2\nWater plants\n\n6\n");

    assert!(output.status.success(), "status: {:?}", output.status);
    assert_eq!(
        fs::read_to_string(&target).expect("read target"),
        "Water plants|pending|\n"
    );
    assert!(!work.path().join("todo.txt").exists());
}
