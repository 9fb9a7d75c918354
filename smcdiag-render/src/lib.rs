//! # smcdiag-render
//!
//! Everything around the smcdiag core that touches the outside world.
//!
//! This crate provides:
//! - Layered configuration (defaults, YAML file, environment)
//! - Output path selection, generated-file headers and atomic writes
//! - Locating, probing and running the PlantUML renderer

pub mod config;
pub mod error;
pub mod output;
pub mod plantuml;

pub use config::{Config, ConfigError, ExportConfig, RendererConfig};
pub use error::RenderError;
pub use output::{output_path_for, write_atomic, GeneratedHeader};
pub use plantuml::{extra_args, PlantUml};
