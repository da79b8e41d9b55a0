//! Transition log for task-file activity.
//!
//! Each store load and save, every menu choice, and each operation outcome
//! becomes one line: a UTC timestamp, a space, then `key=value` pairs. Control
//! characters in values are escaped so a task description can never split a
//! record across lines.

use chrono::Utc;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

#[derive(Debug)]
pub(crate) struct Logger {
    path: Option<PathBuf>,
    broken: AtomicBool,
}

impl Logger {
    /// `None` keeps the to-do session silent; nothing touches the disk.
    pub(crate) fn new(path: Option<PathBuf>) -> Self {
        Self {
            path,
            broken: AtomicBool::new(false),
        }
    }

    #[cfg(test)]
    pub(crate) fn disabled() -> Self {
        Self::new(None)
    }

    /// Records one transition. A log that cannot be written never interrupts
    /// task editing: the first failure is reported and later calls are no-ops.
    pub(crate) fn log_transition(&self, message: &str) {
        let Some(path) = self.path.as_deref() else {
            return;
        };
        if self.broken.load(Ordering::Relaxed) {
            return;
        }
        if let Err(err) = append_line(path, &format_line(message)) {
            self.give_up(path, &err);
        }
    }

    fn give_up(&self, path: &Path, err: &io::Error) {
        if self.broken.swap(true, Ordering::SeqCst) {
            return;
        }
        let _ = writeln!(
            io::stderr().lock(),
            "Warning: transition logging disabled log_path={} io_error={}",
            path.display(),
            err
        );
    }
}

fn format_line(message: &str) -> String {
    format!(
        "{} {}\n",
        Utc::now().format(TIMESTAMP_FORMAT),
        sanitize_log_value(message)
    )
}

fn append_line(path: &Path, line: &str) -> io::Result<()> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?
        .write_all(line.as_bytes())
}

pub(crate) fn sanitize_log_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            other => escaped.push(other),
        }
    }
    escaped
}
