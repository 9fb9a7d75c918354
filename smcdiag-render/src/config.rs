//! smcdiag configuration.
//!
//! Configuration is loaded in the following order (later overrides earlier):
//! 1. Default values
//! 2. YAML config file (if specified via SMCDIAG_CONFIG or --config)
//! 3. Environment variables
//!
//! Command-line flags are applied on top by the binary.

use serde::{Deserialize, Serialize};
use smcdiag_core::export::DEFAULT_INDENT;
use smcdiag_core::{ExportOptions, Visibility};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "SMCDIAG_CONFIG";

/// smcdiag configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Diagram export configuration.
    pub export: ExportConfig,
    /// External renderer configuration.
    pub renderer: RendererConfig,
}

impl Config {
    /// Loads configuration from `path` (or the file named by SMCDIAG_CONFIG),
    /// then applies environment variable overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        // Start with defaults
        let mut config = Self::default();

        let env_path = std::env::var(CONFIG_ENV).ok().map(PathBuf::from);
        if let Some(path) = path.map(Path::to_path_buf).or(env_path) {
            config = Self::from_file(&path)?;
            tracing::info!("Loaded config from {}", path.display());
        }

        config.apply_env_overrides();

        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(path.to_path_buf(), e))?;
        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))?;
        Ok(config)
    }

    /// Loads configuration from environment variables only.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from a variable lookup.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        self.export.apply_overrides(&lookup);
        self.renderer.apply_overrides(&lookup);
    }

    /// Saves configuration to a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = serde_yaml::to_string(self)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))?;
        std::fs::write(path, content).map_err(|e| ConfigError::IoError(path.to_path_buf(), e))?;
        Ok(())
    }
}

/// Diagram export configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Render entry and exit actions.
    pub show_entry_exit_actions: bool,
    /// Render guard conditions.
    pub show_guards: bool,
    /// Render transition actions.
    pub show_transition_actions: bool,
    /// Indent unit per nesting level.
    pub indent: String,
    /// Emit the generated-file comment block after `@startuml`.
    pub header: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            show_entry_exit_actions: false,
            show_guards: false,
            show_transition_actions: false,
            indent: DEFAULT_INDENT.to_string(),
            header: false,
        }
    }
}

impl ExportConfig {
    fn apply_overrides(&mut self, lookup: &impl Fn(&str) -> Option<String>) {
        if let Some(all) = lookup("SMCDIAG_SHOW_ALL") {
            if is_true(&all) {
                self.show_all();
            }
        }

        if let Some(indent) = lookup("SMCDIAG_INDENT") {
            if let Ok(width) = indent.parse::<usize>() {
                self.indent = " ".repeat(width);
            } else if indent == "tab" {
                self.indent = "\t".to_string();
            }
        }

        if let Some(header) = lookup("SMCDIAG_HEADER") {
            self.header = is_true(&header);
        }
    }

    /// Enables every optional annotation.
    pub fn show_all(&mut self) {
        self.show_entry_exit_actions = true;
        self.show_guards = true;
        self.show_transition_actions = true;
    }

    pub fn visibility(&self) -> Visibility {
        Visibility {
            entry_exit_actions: self.show_entry_exit_actions,
            guards: self.show_guards,
            transition_actions: self.show_transition_actions,
        }
    }

    /// Builds exporter options; the preamble is left empty.
    pub fn export_options(&self) -> ExportOptions {
        ExportOptions::new(self.visibility()).with_indent(self.indent.clone())
    }
}

/// External renderer configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Program name looked up on PATH, or a path to the executable.
    pub program: String,
    /// Run `-testdot` before rendering.
    pub check_dot: bool,
    /// Extra renderer flags without dashes, e.g. "tsvg teps".
    pub extra_args: Option<String>,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            program: "plantuml".to_string(),
            check_dot: true,
            extra_args: None,
        }
    }
}

impl RendererConfig {
    fn apply_overrides(&mut self, lookup: &impl Fn(&str) -> Option<String>) {
        if let Some(program) = lookup("SMCDIAG_PLANTUML") {
            if !program.is_empty() {
                self.program = program;
            }
        }

        if let Some(args) = lookup("SMCDIAG_PLANTUML_ARGS") {
            self.extra_args = Some(args).filter(|a| !a.trim().is_empty());
        }

        if let Some(check) = lookup("SMCDIAG_CHECK_DOT") {
            self.check_dot = is_true(&check);
        }
    }
}

fn is_true(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{}': {}", .0.display(), .1)]
    IoError(PathBuf, std::io::Error),

    #[error("failed to parse config file '{}': {}", .0.display(), .1)]
    ParseError(PathBuf, String),
}
