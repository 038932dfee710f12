//! Text and markdown rendering of dispatch results.

use std::error::Error;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::aiverse::dispatch::{Outcome, ResultSet};
use crate::aiverse::roster::AgentSpec;

#[derive(Debug)]
pub enum ReportError {
    Io { path: PathBuf, source: std::io::Error },
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportError::Io { path, source } => {
                write!(f, "Failed to write {}: {}", path.display(), source)
            }
        }
    }
}

impl Error for ReportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ReportError::Io { source, .. } => Some(source),
        }
    }
}

/// One agent's block in the text report.
pub fn render_outcome(name: &str, outcome: &Outcome, show_errors: bool) -> String {
    match outcome {
        Outcome::Success(text) => format!("\n{} Agent Response:\n{}", name, text),
        Outcome::Failure { placeholder, error } if show_errors => {
            format!("\n{} Agent Response:\n{} \n Details: {}", name, placeholder, error)
        }
        Outcome::Failure { placeholder, .. } => {
            format!("\n{} Agent Response:\n{}", name, placeholder)
        }
    }
}

/// The whole report, in result set (completion) order.
pub fn render_text(results: &ResultSet, show_errors: bool) -> String {
    results
        .iter()
        .map(|(name, outcome)| render_outcome(name, outcome, show_errors))
        .collect::<Vec<_>>()
        .join("\n")
}

fn markdown_document(spec: &AgentSpec, outcome: &Outcome) -> String {
    let mut doc = format!(
        "# {}\n\n_Model: `{}` | Generated {}_\n\n",
        spec.title,
        spec.model,
        Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    doc.push_str(outcome.text());
    if let Some(error) = outcome.error() {
        doc.push_str(&format!("\n\n> Details: {}", error));
    }
    doc.push('\n');
    doc
}

/// Write one markdown file per roster agent that has an outcome. Returns the written paths.
pub fn export_markdown(
    results: &ResultSet,
    roster: &[AgentSpec],
    dir: &Path,
) -> Result<Vec<PathBuf>, ReportError> {
    fs::create_dir_all(dir).map_err(|source| ReportError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut written = Vec::new();
    for spec in roster {
        let outcome = match results.get(&spec.name) {
            Some(outcome) => outcome,
            None => continue,
        };
        let path = dir.join(&spec.file_name);
        fs::write(&path, markdown_document(spec, outcome)).map_err(|source| ReportError::Io {
            path: path.clone(),
            source,
        })?;
        log::debug!("Exported {} response to {}", spec.name, path.display());
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_outcome() {
        let ok = Outcome::Success("4".to_string());
        assert_eq!(render_outcome("Llama", &ok, false), "\nLlama Agent Response:\n4");

        let failed = Outcome::failure("Can't process", "HTTP 401");
        assert_eq!(
            render_outcome("Kimi", &failed, false),
            "\nKimi Agent Response:\nCan't process"
        );
        assert_eq!(
            render_outcome("Kimi", &failed, true),
            "\nKimi Agent Response:\nCan't process \n Details: HTTP 401"
        );
    }

    #[test]
    fn test_render_text_in_completion_order() {
        let mut results = ResultSet::new();
        results.insert("Y", Outcome::Success("y".into()));
        results.insert("X", Outcome::Success("x".into()));
        let text = render_text(&results, false);
        assert!(text.find("Y Agent").unwrap() < text.find("X Agent").unwrap());
    }
}
