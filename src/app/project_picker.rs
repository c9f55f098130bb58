use crate::utils::error::{EtlError, Result};
use std::io::{BufRead, Write};
use std::path::Path;

/// Visible sub-folders of the editor's projects folder, sorted by name.
pub fn list_projects(projects_folder: &Path) -> Result<Vec<String>> {
    let mut projects = Vec::new();
    for entry in std::fs::read_dir(projects_folder)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if entry.file_type()?.is_dir() && !name.starts_with('.') {
            projects.push(name);
        }
    }
    projects.sort();

    if projects.is_empty() {
        return Err(EtlError::project(format!(
            "no projects found in {}",
            projects_folder.display()
        )));
    }
    Ok(projects)
}

/// Prints a numbered list and keeps asking until a valid index is typed.
/// End of input is an error.
pub fn prompt_selection<R: BufRead, W: Write>(
    projects: &[String],
    mut input: R,
    mut output: W,
) -> Result<usize> {
    writeln!(output, "\nAvailable projects:\n")?;
    for (i, project) in projects.iter().enumerate() {
        writeln!(output, "[{}] {}", i, project)?;
    }

    loop {
        write!(output, "\nSelect project number: ")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Err(EtlError::project("no project selected"));
        }

        match line.trim().parse::<usize>() {
            Ok(index) if index < projects.len() => return Ok(index),
            _ => writeln!(output, "Invalid selection.")?,
        }
    }
}
