//! Render error types.

use crate::config::ConfigError;
use smcdiag_core::CoreError;
use thiserror::Error;

/// Process exit code for a missing input file.
pub const EXIT_USAGE: i32 = 1;
/// Process exit code for a missing or broken renderer.
pub const EXIT_ENVIRONMENT: i32 = 2;
/// Process exit code for I/O failures.
pub const EXIT_IO: i32 = 3;
/// Process exit code when strict mode rejects the input.
pub const EXIT_STRICT: i32 = 4;
/// Process exit code when the renderer ran and failed.
pub const EXIT_RENDER: i32 = 5;

/// Errors from configuration, output and the external renderer.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("core error: {0}")]
    Core(#[from] CoreError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("program {program} does not exist, please install it (see https://plantuml.com/download)")]
    RendererNotFound { program: String },

    #[error("program {program} cannot find 'dot', please install graphviz: {details}")]
    DotUnavailable { program: String, details: String },

    #[error("renderer {program} failed: {status}")]
    RendererFailed { program: String, status: String },
}

impl RenderError {
    /// Returns an error code suitable for diagnostics.
    pub fn error_code(&self) -> &'static str {
        match self {
            RenderError::Io(_) => "IO_ERROR",
            RenderError::Core(e) => e.error_code(),
            RenderError::Config(_) => "CONFIG_ERROR",
            RenderError::RendererNotFound { .. } => "RENDERER_NOT_FOUND",
            RenderError::DotUnavailable { .. } => "DOT_UNAVAILABLE",
            RenderError::RendererFailed { .. } => "RENDERER_FAILED",
        }
    }

    /// Returns the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            RenderError::Io(_) => EXIT_IO,
            RenderError::Core(CoreError::IgnoredLines { .. }) => EXIT_STRICT,
            RenderError::Core(_) => EXIT_IO,
            RenderError::Config(_) => EXIT_USAGE,
            RenderError::RendererNotFound { .. } | RenderError::DotUnavailable { .. } => {
                EXIT_ENVIRONMENT
            }
            RenderError::RendererFailed { .. } => EXIT_RENDER,
        }
    }

    /// Returns whether the error was caused by the environment rather than the input.
    pub fn is_environment(&self) -> bool {
        self.exit_code() == EXIT_ENVIRONMENT
    }
}
