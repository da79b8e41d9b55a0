use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::logger::{sanitize_log_value, Logger};
use crate::task_types::{check_field, Task, TaskStatus, SEPARATOR};

pub(crate) const DEFAULT_TODO_FILE: &str = "todo.txt";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MalformedLine {
    pub(crate) line_number: usize,
    pub(crate) content: String,
}

#[derive(Debug, Default)]
pub(crate) struct LoadReport {
    pub(crate) exists: bool,
    pub(crate) tasks: Vec<Task>,
    pub(crate) malformed: Vec<MalformedLine>,
}

/// Whole-list persistence for the flat `description|status|due` file.
#[derive(Debug)]
pub(crate) struct TaskStore<'a> {
    path: PathBuf,
    logger: &'a Logger,
}

impl<'a> TaskStore<'a> {
    pub(crate) fn new(path: impl Into<PathBuf>, logger: &'a Logger) -> Self {
        Self {
            path: path.into(),
            logger,
        }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn logger(&self) -> &Logger {
        self.logger
    }

    /// Loads every well-formed task. A missing file is an empty list, and
    /// malformed lines are dropped without being reported to the caller.
    pub(crate) fn load(&self) -> Result<Vec<Task>, String> {
        self.load_report().map(|report| report.tasks)
    }

    pub(crate) fn load_report(&self) -> Result<LoadReport, String> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                self.logger.log_transition(&format!(
                    "store load path={} missing=true tasks=0",
                    self.path.display()
                ));
                return Ok(LoadReport::default());
            }
            Err(err) => {
                return Err(format!(
                    "Failed to read task file {}: {}",
                    self.path.display(),
                    err
                ))
            }
        };

        let report = parse_tasks(&content);
        self.logger.log_transition(&format!(
            "store load path={} tasks={} malformed={}",
            self.path.display(),
            report.tasks.len(),
            report.malformed.len()
        ));
        Ok(report)
    }

    /// Replaces the file with `tasks` via write-then-rename: the destination
    /// is either the previous complete list or the new complete list.
    pub(crate) fn save(&self, tasks: &[Task]) -> Result<(), String> {
        self.save_with(tasks, |file, tasks| write_tasks(file, tasks))
    }

    fn save_with<F>(&self, tasks: &[Task], write: F) -> Result<(), String>
    where
        F: FnOnce(&mut NamedTempFile, &[Task]) -> io::Result<()>,
    {
        for task in tasks {
            check_field(&task.description, "description")
                .and_then(|()| check_field(&task.due, "due date"))
                .map_err(|err| {
                    format!(
                        "Refusing to save task {:?}: {}",
                        sanitize_log_value(&task.description),
                        err
                    )
                })?;
        }

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut temp = NamedTempFile::new_in(dir).map_err(|err| {
            format!(
                "Failed to create temporary file in {}: {}",
                dir.display(),
                err
            )
        })?;
        write(&mut temp, tasks)
            .and_then(|()| temp.flush())
            .and_then(|()| temp.as_file().sync_all())
            .map_err(|err| {
                format!(
                    "Failed to write temporary file for {}: {}",
                    self.path.display(),
                    err
                )
            })?;
        temp.persist(&self.path).map_err(|err| {
            format!(
                "Failed to replace task file {}: {}",
                self.path.display(),
                err.error
            )
        })?;
        let dir_synced = sync_dir(dir);

        self.logger.log_transition(&format!(
            "store save path={} tasks={} dir_synced={}",
            self.path.display(),
            tasks.len(),
            dir_synced
        ));
        Ok(())
    }
}

/// Flushes the directory entry so the rename survives power loss. Best
/// effort: platforms that cannot open a directory as a file report `false`.
#[cfg(unix)]
fn sync_dir(dir: &Path) -> bool {
    fs::File::open(dir)
        .and_then(|handle| handle.sync_all())
        .is_ok()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> bool {
    false
}

pub(crate) fn format_task(task: &Task) -> String {
    format!(
        "{}{sep}{}{sep}{}",
        task.description,
        task.status().as_str(),
        task.due,
        sep = SEPARATOR
    )
}

fn write_tasks<W: Write>(out: &mut W, tasks: &[Task]) -> io::Result<()> {
    for task in tasks {
        writeln!(out, "{}", format_task(task))?;
    }
    Ok(())
}

pub(crate) fn parse_line(line: &str) -> Option<Task> {
    let parts: Vec<&str> = line.trim().split(SEPARATOR).collect();
    let [description, status, due] = parts.as_slice() else {
        return None;
    };
    Some(Task {
        description: description.to_string(),
        done: TaskStatus::parse(status) == TaskStatus::Done,
        due: due.to_string(),
    })
}

fn parse_tasks(content: &str) -> LoadReport {
    let mut report = LoadReport {
        exists: true,
        ..LoadReport::default()
    };
    for (index, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match parse_line(line) {
            Some(task) => report.tasks.push(task),
            None => report.malformed.push(MalformedLine {
                line_number: index + 1,
                content: line.to_string(),
            }),
        }
    }
    report
}
