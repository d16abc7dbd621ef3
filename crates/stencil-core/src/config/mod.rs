//! Configuration for the analyzer.
//! TOML-based, serde defaults, effective-value accessors.

pub mod analysis_config;

pub use analysis_config::AnalysisConfig;
