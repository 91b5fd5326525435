//! Error types for tire construction.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while building a tire. `update`/`advance` never fail.
#[derive(Debug, Error)]
pub enum TireError {
    /// A coefficient violates a physical precondition.
    #[error("invalid coefficient [{section}] {name} = {value}: {reason}")]
    InvalidCoefficient {
        section: &'static str,
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    /// Model configuration is unusable.
    #[error("invalid tire configuration: {reason}")]
    InvalidConfig { reason: String },

    /// Coefficient or config text does not match the schema.
    #[error("failed to parse tire data: {0}")]
    Parse(#[from] serde_json::Error),

    /// Coefficient file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TireError {
    pub(crate) fn config(reason: impl Into<String>) -> Self {
        TireError::InvalidConfig { reason: reason.into() }
    }
}
