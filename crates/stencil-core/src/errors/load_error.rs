//! Template loading errors.

/// Errors that can occur while loading a single template file.
///
/// Always per-template and non-fatal: the pipeline records the error on
/// that template's analysis and moves on.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is not valid UTF-8")]
    Decode { path: String },
}

impl LoadError {
    /// The path the failure relates to.
    pub fn path(&self) -> &str {
        match self {
            Self::Io { path, .. } | Self::Decode { path } => path,
        }
    }
}
