//! Output file handling.
//!
//! Diagrams are rendered to a string first and then written through a
//! temporary file in the destination directory, so a failed write never
//! leaves a truncated diagram behind.

use chrono::{DateTime, SecondsFormat, Utc};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Extension of SMC input files.
pub const INPUT_EXTENSION: &str = "fsm";

/// Extension of generated diagrams.
pub const OUTPUT_EXTENSION: &str = "plantuml";

/// Returns the diagram path for an input file: `machine.fsm` becomes
/// `machine.plantuml`; any other name gets `.plantuml` appended.
pub fn output_path_for(input: &Path) -> PathBuf {
    match input.extension() {
        Some(ext) if ext == INPUT_EXTENSION => input.with_extension(OUTPUT_EXTENSION),
        _ => {
            let mut name = input.as_os_str().to_owned();
            name.push(".");
            name.push(OUTPUT_EXTENSION);
            PathBuf::from(name)
        }
    }
}

/// Informational comment block placed at the top of a generated diagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedHeader {
    pub tool: String,
    pub version: String,
    /// Command line that produced the file.
    pub invocation: String,
    pub source: Option<PathBuf>,
    pub timestamp: DateTime<Utc>,
}

impl GeneratedHeader {
    pub fn new(tool: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            version: version.into(),
            invocation: String::new(),
            source: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_invocation(mut self, invocation: impl Into<String>) -> Self {
        self.invocation = invocation.into();
        self
    }

    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Comment lines, without the comment marker.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![format!("generated by {} {}", self.tool, self.version)];
        if !self.invocation.is_empty() {
            lines.push(format!("command: {}", self.invocation));
        }
        if let Some(source) = &self.source {
            lines.push(format!("source: {}", source.display()));
        }
        lines.push(format!(
            "date: {}",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
        ));
        lines
    }
}

/// Writes `contents` to `path`, replacing any existing file only once the
/// new contents are fully on disk.
pub fn write_atomic(path: &Path, contents: &str) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = tempfile::NamedTempFile::new_in(dir)?;
    file.write_all(contents.as_bytes())?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;

    tracing::debug!("wrote {} bytes to {}", contents.len(), path.display());
    Ok(())
}
