//! PlantUML invocation.
//!
//! The renderer is an external program. It is located on `PATH` (or taken
//! from an explicit path), checked with `-testdot` to make sure graphviz is
//! usable, and finally run on the generated diagram file.

use crate::config::RendererConfig;
use crate::error::RenderError;
use std::path::{Path, PathBuf};
use std::process::Command;

/// A located renderer executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlantUml {
    program: PathBuf,
}

impl PlantUml {
    /// Finds the renderer named in `config`.
    pub fn locate(config: &RendererConfig) -> Result<Self, RenderError> {
        let program = which::which(&config.program).map_err(|e| {
            tracing::debug!("lookup of {} failed: {}", config.program, e);
            RenderError::RendererNotFound {
                program: config.program.clone(),
            }
        })?;
        tracing::debug!("using renderer {}", program.display());
        Ok(Self { program })
    }

    /// Uses `program` as-is, without checking that it exists.
    pub fn from_path(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Runs `-testdot` and fails unless the renderer reports a working dot.
    pub fn check_dot(&self) -> Result<(), RenderError> {
        // A program that cannot be started is as unusable as a missing dot.
        let output = Command::new(&self.program)
            .arg("-testdot")
            .output()
            .map_err(|e| RenderError::DotUnavailable {
                program: self.display_name(),
                details: format!("failed to run -testdot: {}", e),
            })?;
        let mut report = String::from_utf8_lossy(&output.stdout).into_owned();
        report.push_str(&String::from_utf8_lossy(&output.stderr));
        tracing::debug!("{} -testdot: {}", self.program.display(), report.trim());
        evaluate_testdot(&self.display_name(), output.status.success(), &report)
    }

    /// Renders `diagram` with the given extra flags.
    pub fn render(&self, diagram: &Path, extra: &[String]) -> Result<(), RenderError> {
        tracing::info!(
            "running {} {} {}",
            self.program.display(),
            diagram.display(),
            extra.join(" ")
        );
        let status = Command::new(&self.program)
            .arg(diagram)
            .args(extra)
            .status()
            .map_err(|e| RenderError::RendererFailed {
                program: self.display_name(),
                status: format!("failed to start: {}", e),
            })?;
        if !status.success() {
            return Err(RenderError::RendererFailed {
                program: self.display_name(),
                status: status.to_string(),
            });
        }
        Ok(())
    }

    fn display_name(&self) -> String {
        self.program.display().to_string()
    }
}

/// Interprets the result of `-testdot`.
fn evaluate_testdot(program: &str, success: bool, report: &str) -> Result<(), RenderError> {
    let report = report.trim();
    if success && !report.is_empty() && !report.to_lowercase().contains("error") {
        return Ok(());
    }
    let details = if report.is_empty() {
        "no output from -testdot".to_string()
    } else {
        report.to_string()
    };
    Err(RenderError::DotUnavailable {
        program: program.to_string(),
        details,
    })
}

/// Turns a space separated list of renderer flags into arguments, adding the
/// leading dash: `"tsvg teps"` becomes `["-tsvg", "-teps"]`.
pub fn extra_args(flags: &str) -> Vec<String> {
    flags
        .split_whitespace()
        .map(|flag| {
            if flag.starts_with('-') {
                flag.to_string()
            } else {
                format!("-{}", flag)
            }
        })
        .collect()
}
