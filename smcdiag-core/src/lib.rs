//! # smcdiag-core
//!
//! Parsing and export core for smcdiag.
//!
//! This crate provides:
//! - A line scanner for the SMC state machine grammar
//! - A builder that turns scanned lines into a nested state tree
//! - The arena-backed document model
//! - A PlantUML exporter with selectable annotations
//!
//! ```
//! use smcdiag_core::{export_document, parse_str, ExportOptions, Visibility};
//!
//! let report = parse_str("Initial Idle\n( Idle )\n{\nstart Running {} {} {}\n}\n");
//! let text = export_document(&report.document, &ExportOptions::new(Visibility::all()));
//! assert!(text.contains("Idle --> Running : start"));
//! ```

pub mod builder;
pub mod error;
pub mod export;
pub mod model;
pub mod scanner;

pub use builder::{
    parse_reader, parse_str, Builder, IgnoreReason, IgnoredLine, LineOutcome, ParseReport,
};
pub use error::CoreError;
pub use export::{export_document, export_states, ExportOptions, Visibility};
pub use model::{Document, MachineHeader, Parent, State, StateId, Transition};
pub use scanner::{scan_line, Header, LineItem, ScanMode, ScannedLine, TransitionLine};
