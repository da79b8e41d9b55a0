use std::fmt;

use crate::logger::sanitize_log_value;
use crate::store::TaskStore;
use crate::task_types::{check_field, resolve_position, Task, TaskInputError};

pub(crate) const EMPTY_LIST_NOTICE: &str = "✅ No pending tasks!";
const LIST_HEADING: &str = "📋 Your To-Do List:";

#[derive(Debug)]
pub(crate) enum OpError {
    /// Bad user input; nothing was mutated or saved.
    Input(TaskInputError),
    /// The store failed; fatal for the session.
    Store(String),
}

impl fmt::Display for OpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input(err) => write!(f, "{}", err),
            Self::Store(message) => f.write_str(message),
        }
    }
}

impl From<TaskInputError> for OpError {
    fn from(err: TaskInputError) -> Self {
        Self::Input(err)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AddOutcome {
    Added,
    Skipped,
}

fn save(store: &TaskStore<'_>, tasks: &[Task]) -> Result<(), OpError> {
    store.save(tasks).map_err(OpError::Store)
}

fn log_rejected(store: &TaskStore<'_>, op: &str, err: &TaskInputError) {
    let detail = match err {
        TaskInputError::NotANumber(raw) => format!("not_a_number input={}", raw),
        TaskInputError::InvalidIndex { number, len } => {
            format!("invalid_index number={} len={}", number, len)
        }
        TaskInputError::ForbiddenCharacter { field } => {
            format!("forbidden_character field={}", field)
        }
    };
    store
        .logger()
        .log_transition(&format!("op {} rejected {}", op, detail));
}

fn position(
    store: &TaskStore<'_>,
    op: &str,
    number: i64,
    len: usize,
) -> Result<usize, OpError> {
    resolve_position(number, len).map_err(|err| {
        log_rejected(store, op, &err);
        OpError::Input(err)
    })
}

/// Appends a pending task. A blank description is a no-op: nothing is
/// appended and the file is not written.
pub(crate) fn add(
    store: &TaskStore<'_>,
    tasks: &mut Vec<Task>,
    description: &str,
    due: &str,
) -> Result<AddOutcome, OpError> {
    let description = description.trim();
    let due = due.trim();
    if description.is_empty() {
        store.logger().log_transition("op add skipped=blank_description");
        return Ok(AddOutcome::Skipped);
    }
    if let Err(err) =
        check_field(description, "description").and_then(|()| check_field(due, "due date"))
    {
        log_rejected(store, "add", &err);
        return Err(err.into());
    }

    tasks.push(Task::pending(description, due));
    save(store, tasks)?;
    store.logger().log_transition(&format!(
        "op add number={} description={}",
        tasks.len(),
        sanitize_log_value(description)
    ));
    Ok(AddOutcome::Added)
}

pub(crate) fn delete(
    store: &TaskStore<'_>,
    tasks: &mut Vec<Task>,
    number: i64,
) -> Result<Task, OpError> {
    let index = position(store, "delete", number, tasks.len())?;
    let removed = tasks.remove(index);
    save(store, tasks)?;
    store
        .logger()
        .log_transition(&format!("op delete number={} remaining={}", number, tasks.len()));
    Ok(removed)
}

pub(crate) fn mark_done<'t>(
    store: &TaskStore<'_>,
    tasks: &'t mut [Task],
    number: i64,
) -> Result<&'t Task, OpError> {
    let index = position(store, "mark_done", number, tasks.len())?;
    tasks[index].done = true;
    save(store, tasks)?;
    store
        .logger()
        .log_transition(&format!("op mark_done number={}", number));
    Ok(&tasks[index])
}

/// Replaces each field only when its replacement is non-blank. Saves whenever
/// the number was valid, even if both replacements were blank.
pub(crate) fn edit<'t>(
    store: &TaskStore<'_>,
    tasks: &'t mut [Task],
    number: i64,
    new_text: &str,
    new_due: &str,
) -> Result<&'t Task, OpError> {
    let index = position(store, "edit", number, tasks.len())?;
    let new_text = new_text.trim();
    let new_due = new_due.trim();
    if let Err(err) =
        check_field(new_text, "description").and_then(|()| check_field(new_due, "due date"))
    {
        log_rejected(store, "edit", &err);
        return Err(err.into());
    }

    let task = &mut tasks[index];
    if !new_text.is_empty() {
        task.description = new_text.to_string();
    }
    if !new_due.is_empty() {
        task.due = new_due.to_string();
    }
    save(store, tasks)?;
    store.logger().log_transition(&format!(
        "op edit number={} text_changed={} due_changed={}",
        number,
        !new_text.is_empty(),
        !new_due.is_empty()
    ));
    Ok(&tasks[index])
}

pub(crate) fn render(tasks: &[Task]) -> String {
    if tasks.is_empty() {
        return format!("{}\n", EMPTY_LIST_NOTICE);
    }
    let mut out = format!("\n{}\n", LIST_HEADING);
    for (index, task) in tasks.iter().enumerate() {
        let marker = if task.done { "✅" } else { "❌" };
        out.push_str(&format!("{}. {} {}", index + 1, marker, task.description));
        if task.has_due() {
            out.push_str(&format!(" (Due: {})", task.due));
        }
        out.push('\n');
    }
    out
}
