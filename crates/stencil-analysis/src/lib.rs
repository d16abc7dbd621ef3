//! Static-analysis engine for block/macro/inheritance text templates.
//!
//! A corpus of template files goes in; one JSON `CorpusReport` comes out:
//! per-template structural facts, security/performance findings and scores,
//! plus a corpus-wide inheritance graph. Templates are never executed or
//! rendered, and a run holds no state beyond its inputs.

pub mod extract;
pub mod graph;
pub mod loader;
pub mod parser;
pub mod pipeline;
pub mod report;
pub mod rules;
pub mod scoring;

pub use extract::{MacroFacts, TemplateFacts};
pub use graph::InheritanceGraph;
pub use loader::TemplateSource;
pub use parser::ParsedTemplate;
pub use pipeline::CorpusAnalyzer;
pub use report::{CorpusReport, Summary, TemplateAnalysis};
pub use rules::{Finding, FindingCategory, Severity};
