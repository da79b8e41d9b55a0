use std::fmt;
use std::num::IntErrorKind;

/// Field separator used by the on-disk format.
pub(crate) const SEPARATOR: char = '|';

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Task {
    pub(crate) description: String,
    pub(crate) done: bool,
    pub(crate) due: String,
}

impl Task {
    pub(crate) fn pending(description: &str, due: &str) -> Self {
        Self {
            description: description.to_string(),
            done: false,
            due: due.to_string(),
        }
    }

    pub(crate) fn status(&self) -> TaskStatus {
        if self.done {
            TaskStatus::Done
        } else {
            TaskStatus::Pending
        }
    }

    pub(crate) fn has_due(&self) -> bool {
        !self.due.is_empty()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TaskStatus {
    Done,
    Pending,
}

impl TaskStatus {
    /// Only the exact token `done` counts as done.
    pub(crate) fn parse(token: &str) -> Self {
        if token == "done" {
            Self::Done
        } else {
            Self::Pending
        }
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Done => "done",
            Self::Pending => "pending",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum TaskInputError {
    NotANumber(String),
    InvalidIndex { number: i64, len: usize },
    ForbiddenCharacter { field: &'static str },
}

impl fmt::Display for TaskInputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotANumber(_) => f.write_str("Please enter a valid number."),
            Self::InvalidIndex { .. } => f.write_str("Invalid task number."),
            Self::ForbiddenCharacter { field } => write!(
                f,
                "The {} must not contain '{}' or line breaks.",
                field, SEPARATOR
            ),
        }
    }
}

/// Parses a user-supplied task number. Signed so that `0` and `-1` are
/// reported as out of range rather than as parse failures. Integers too wide
/// for `i64` saturate, so they are out of range too.
pub(crate) fn parse_task_number(raw: &str) -> Result<i64, TaskInputError> {
    let trimmed = raw.trim();
    match trimmed.parse::<i64>() {
        Ok(number) => Ok(number),
        Err(err) => match err.kind() {
            IntErrorKind::PosOverflow => Ok(i64::MAX),
            IntErrorKind::NegOverflow => Ok(i64::MIN),
            _ => Err(TaskInputError::NotANumber(trimmed.to_string())),
        },
    }
}

/// Maps a 1-based task number onto a position in a list of `len` tasks.
pub(crate) fn resolve_position(number: i64, len: usize) -> Result<usize, TaskInputError> {
    if number >= 1 && (number as u64) <= len as u64 {
        Ok((number - 1) as usize)
    } else {
        Err(TaskInputError::InvalidIndex { number, len })
    }
}

pub(crate) fn check_field(value: &str, field: &'static str) -> Result<(), TaskInputError> {
    if value.contains(SEPARATOR) || value.contains('\n') || value.contains('\r') {
        return Err(TaskInputError::ForbiddenCharacter { field });
    }
    Ok(())
}
