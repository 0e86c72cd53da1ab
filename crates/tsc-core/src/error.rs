//! Framework error type.
//!
//! Sub-crates define their own error enums and wrap `CoreError` where a core
//! type rejects its input (e.g. an invalid `RunConfig`).

use thiserror::Error;

/// The error type for `tsc-core` validation.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("parse error: {0}")]
    Parse(String),
}

/// Shorthand result type for `tsc-core`.
pub type CoreResult<T> = Result<T, CoreError>;
