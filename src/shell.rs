use std::io::{self, Write};

use crate::ops::{self, AddOutcome, OpError};
use crate::store::TaskStore;
use crate::task_types::{parse_task_number, resolve_position, Task};

#[cfg(test)]
use std::collections::VecDeque;

pub(crate) trait ShellIo {
    fn write_out(&mut self, s: &str) -> Result<(), String>;
    fn write_err(&mut self, s: &str) -> Result<(), String>;
    fn flush_out(&mut self) -> Result<(), String>;
    fn read_line(&mut self) -> Result<Option<String>, String>;
}

pub(crate) struct TerminalShellIo {
    stdin: io::Stdin,
    stdout: io::Stdout,
    stderr: io::Stderr,
}

impl TerminalShellIo {
    pub(crate) fn new() -> Self {
        Self {
            stdin: io::stdin(),
            stdout: io::stdout(),
            stderr: io::stderr(),
        }
    }
}

impl ShellIo for TerminalShellIo {
    fn write_out(&mut self, s: &str) -> Result<(), String> {
        self.stdout
            .write_all(s.as_bytes())
            .map_err(|err| format!("Failed to write stdout: {}", err))
    }

    fn write_err(&mut self, s: &str) -> Result<(), String> {
        self.stderr
            .write_all(s.as_bytes())
            .map_err(|err| format!("Failed to write stderr: {}", err))
    }

    fn flush_out(&mut self) -> Result<(), String> {
        self.stdout
            .flush()
            .map_err(|err| format!("Failed to flush stdout: {}", err))
    }

    fn read_line(&mut self) -> Result<Option<String>, String> {
        let mut input = String::new();
        let bytes = self
            .stdin
            .read_line(&mut input)
            .map_err(|err| format!("Failed to read input: {}", err))?;
        if bytes == 0 {
            Ok(None)
        } else {
            Ok(Some(input))
        }
    }
}

#[cfg(test)]
pub(crate) struct TestShellIo {
    inputs: VecDeque<String>,
    pub(crate) stdout: String,
    pub(crate) stderr: String,
}

#[cfg(test)]
impl TestShellIo {
    pub(crate) fn new(inputs: &[&str]) -> Self {
        Self {
            inputs: inputs.iter().map(|line| format!("{}\n", line)).collect(),
            stdout: String::new(),
            stderr: String::new(),
        }
    }
}

#[cfg(test)]
impl ShellIo for TestShellIo {
    fn write_out(&mut self, s: &str) -> Result<(), String> {
        self.stdout.push_str(s);
        Ok(())
    }

    fn write_err(&mut self, s: &str) -> Result<(), String> {
        self.stderr.push_str(s);
        Ok(())
    }

    fn flush_out(&mut self) -> Result<(), String> {
        Ok(())
    }

    fn read_line(&mut self) -> Result<Option<String>, String> {
        Ok(self.inputs.pop_front())
    }
}

const MENU: &str = "\n--- 📝 To-Do App ---\n\
1. Show Tasks\n\
2. Add Task\n\
3. Delete Task\n\
4. Mark Task as Done\n\
5. Edit Task\n\
6. Exit\n";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum MenuChoice {
    Show,
    Add,
    Delete,
    MarkDone,
    Edit,
    Exit,
}

impl MenuChoice {
    pub(crate) fn parse(input: &str) -> Option<Self> {
        Some(match input.trim() {
            "1" => Self::Show,
            "2" => Self::Add,
            "3" => Self::Delete,
            "4" => Self::MarkDone,
            "5" => Self::Edit,
            "6" => Self::Exit,
            _ => return None,
        })
    }

    fn label(self) -> &'static str {
        match self {
            Self::Show => "show",
            Self::Add => "add",
            Self::Delete => "delete",
            Self::MarkDone => "mark_done",
            Self::Edit => "edit",
            Self::Exit => "exit",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Terminate,
}

struct Session<'s, 'l, IO: ShellIo> {
    store: &'s TaskStore<'l>,
    io: &'s mut IO,
}

impl<IO: ShellIo> Session<'_, '_, IO> {
    fn say(&mut self, line: &str) -> Result<(), String> {
        self.io.write_out(line)?;
        self.io.write_out("\n")
    }

    /// Prints `prompt` and reads one line. `None` once input is exhausted.
    fn ask(&mut self, prompt: &str) -> Result<Option<String>, String> {
        self.io.write_out(prompt)?;
        self.io.flush_out()?;
        self.io.read_line()
    }

    fn show(&mut self, tasks: &[Task]) -> Result<(), String> {
        let rendered = ops::render(tasks);
        self.io.write_out(&rendered)
    }

    /// Reports user-input errors and keeps going; store errors end the session.
    fn report(&mut self, err: OpError) -> Result<(), String> {
        match err {
            OpError::Input(err) => self.say(&format!("❌ {}", err)),
            OpError::Store(message) => Err(message),
        }
    }

    fn ask_number(&mut self, prompt: &str) -> Result<Option<Result<i64, OpError>>, String> {
        let Some(raw) = self.ask(prompt)? else {
            return Ok(None);
        };
        Ok(Some(parse_task_number(&raw).map_err(OpError::from)))
    }

    fn dispatch(&mut self, choice: MenuChoice, mut tasks: Vec<Task>) -> Result<Flow, String> {
        match choice {
            MenuChoice::Show => self.show(&tasks)?,
            MenuChoice::Add => {
                let Some(description) = self.ask("🆕 Enter new task: ")? else {
                    return Ok(Flow::Terminate);
                };
                let Some(due) = self.ask("📅 Enter due date (optional): ")? else {
                    return Ok(Flow::Terminate);
                };
                match ops::add(self.store, &mut tasks, &description, &due) {
                    Ok(AddOutcome::Added) => self.say("✅ Task added.")?,
                    Ok(AddOutcome::Skipped) => {}
                    Err(err) => self.report(err)?,
                }
            }
            MenuChoice::Delete => {
                self.show(&tasks)?;
                let Some(number) = self.ask_number("🗑️ Enter task number to delete: ")? else {
                    return Ok(Flow::Terminate);
                };
                match number.and_then(|number| ops::delete(self.store, &mut tasks, number)) {
                    Ok(removed) => self.say(&format!("🗑️ Removed: {}", removed.description))?,
                    Err(err) => self.report(err)?,
                }
            }
            MenuChoice::MarkDone => {
                self.show(&tasks)?;
                let Some(number) =
                    self.ask_number("☑️ Enter task number to mark as complete: ")?
                else {
                    return Ok(Flow::Terminate);
                };
                let outcome = match number {
                    Ok(number) => ops::mark_done(self.store, &mut tasks, number)
                        .map(|task| task.description.clone()),
                    Err(err) => Err(err),
                };
                match outcome {
                    Ok(description) => self.say(&format!("✅ Marked as done: {}", description))?,
                    Err(err) => self.report(err)?,
                }
            }
            MenuChoice::Edit => return self.edit(tasks),
            MenuChoice::Exit => {
                self.say("👋 Goodbye!")?;
                return Ok(Flow::Terminate);
            }
        }
        Ok(Flow::Continue)
    }

    fn edit(&mut self, mut tasks: Vec<Task>) -> Result<Flow, String> {
        self.show(&tasks)?;
        let Some(number) = self.ask_number("✏️ Enter task number to edit: ")? else {
            return Ok(Flow::Terminate);
        };
        // Validate the number before asking for replacements.
        let checked = number.and_then(|number| {
            resolve_position(number, tasks.len())
                .map(|_| number)
                .map_err(OpError::from)
        });
        let number = match checked {
            Ok(number) => number,
            Err(err) => {
                self.report(err)?;
                return Ok(Flow::Continue);
            }
        };

        let Some(new_text) = self.ask("🔤 New task text (leave blank to keep unchanged): ")? else {
            return Ok(Flow::Terminate);
        };
        let Some(new_due) = self.ask("📅 New due date (leave blank to keep unchanged): ")? else {
            return Ok(Flow::Terminate);
        };
        match ops::edit(self.store, &mut tasks, number, &new_text, &new_due) {
            Ok(_) => self.say("✅ Task updated.")?,
            Err(err) => self.report(err)?,
        }
        Ok(Flow::Continue)
    }
}

/// Runs the menu loop until the user exits or input ends. The task list is
/// reloaded from the store on every iteration.
pub(crate) fn run_shell<IO: ShellIo>(store: &TaskStore<'_>, io: &mut IO) -> Result<(), String> {
    let logger = store.logger();
    logger.log_transition(&format!("shell start path={}", store.path().display()));
    let mut session = Session { store, io };

    loop {
        session.io.write_out(MENU)?;
        let Some(input) = session.ask("Choose an option: ")? else {
            logger.log_transition("shell end reason=eof");
            return Ok(());
        };

        let tasks = store.load()?;

        let Some(choice) = MenuChoice::parse(&input) else {
            logger.log_transition("shell choice=invalid");
            session.say("❌ Invalid choice. Try again.")?;
            continue;
        };
        logger.log_transition(&format!("shell choice={}", choice.label()));

        if session.dispatch(choice, tasks)? == Flow::Terminate {
            let reason = if choice == MenuChoice::Exit {
                "exit"
            } else {
                "eof"
            };
            logger.log_transition(&format!("shell end reason={}", reason));
            return Ok(());
        }
    }
}

/// Surfaces a fatal session error on the shell's error stream.
pub(crate) fn report_fatal<IO: ShellIo>(io: &mut IO, message: &str) {
    let _ = io.write_err(&format!("Error: {}\n", message));
}
