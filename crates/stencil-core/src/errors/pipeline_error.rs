//! Pipeline errors.

use super::{LoadError, SyntaxError};

/// Errors that can occur during a corpus run.
///
/// Everything except `FatalInput` is captured into the structured report;
/// only an unreadable template-list file aborts the run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error("inheritance cycle detected through {template}")]
    InheritanceCycle { template: String },

    #[error("cannot read template list {path}: {source}")]
    FatalInput {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    /// True when the error must abort the run with no partial report.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::FatalInput { .. })
    }
}
