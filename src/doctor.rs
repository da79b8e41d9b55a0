use std::path::Path;

use tempfile::NamedTempFile;

use crate::logger::sanitize_log_value;
use crate::store::{LoadReport, TaskStore};

#[derive(Debug)]
pub(crate) struct DoctorReport {
    pub(crate) lines: Vec<String>,
    pub(crate) problems: usize,
}

fn check_directory_writable(path: &Path) -> Result<(), String> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    // Same mechanism `save` uses; the file is removed on drop.
    NamedTempFile::new_in(dir).map(|_| ()).map_err(|err| {
        format!(
            "cannot create temporary files in {}: {}",
            dir.display(),
            err
        )
    })
}

fn summarize(report: &LoadReport) -> String {
    let done = report.tasks.iter().filter(|task| task.done).count();
    format!(
        "tasks: {} ({} done, {} pending)",
        report.tasks.len(),
        done,
        report.tasks.len() - done
    )
}

/// Inspects the task file without modifying it.
pub(crate) fn diagnose(store: &TaskStore<'_>) -> Result<DoctorReport, String> {
    let path = store.path();
    let report = store.load_report()?;
    let mut lines = vec![format!("task file: {}", path.display())];
    let mut problems = 0;

    if report.exists {
        lines.push(summarize(&report));
    } else {
        lines.push("task file does not exist yet (treated as an empty list)".to_string());
    }

    for malformed in &report.malformed {
        problems += 1;
        lines.push(format!(
            "malformed line {}: {:?} (expected description|status|due; ignored on load)",
            malformed.line_number,
            sanitize_log_value(&malformed.content)
        ));
    }

    match check_directory_writable(path) {
        Ok(()) => lines.push("directory is writable".to_string()),
        Err(message) => {
            problems += 1;
            lines.push(message);
        }
    }

    store.logger().log_transition(&format!(
        "doctor path={} tasks={} problems={}",
        path.display(),
        report.tasks.len(),
        problems
    ));
    Ok(DoctorReport { lines, problems })
}
