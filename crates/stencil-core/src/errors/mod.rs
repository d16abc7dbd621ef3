//! Error handling for stencil.
//! One error enum per subsystem, `thiserror` only, zero `anyhow`.

pub mod load_error;
pub mod parse_error;
pub mod pipeline_error;

pub use load_error::LoadError;
pub use parse_error::SyntaxError;
pub use pipeline_error::PipelineError;
