//! Core types for the stencil template analyzer.
//!
//! Holds what every subsystem needs and nothing that does work: the
//! analysis configuration and one error enum per subsystem.

pub mod config;
pub mod errors;

pub use config::AnalysisConfig;
pub use errors::{LoadError, PipelineError, SyntaxError};
