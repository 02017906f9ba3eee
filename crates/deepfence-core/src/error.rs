//! Error types for pipeline operations

use thiserror::Error;

/// Errors that can abort a pipeline run.
///
/// Only configuration-class problems surface here; per-agent failures are
/// absorbed into stage results and never become a `PipelineError`.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Roster configuration file could not be read
    #[error("Failed to read roster config at {path}: {source}")]
    ConfigRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Roster configuration file could not be parsed
    #[error("Invalid roster config at {path}: {source}")]
    ConfigParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// Roster validation failed (e.g. duplicate agent names)
    #[error("Invalid roster: {0}")]
    InvalidRoster(String),

    /// Working directories could not be prepared
    #[error("Failed to prepare directory {path}: {source}")]
    PrepareDirs {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Prior output area could not be archived
    #[error("Failed to archive prior outputs: {0}")]
    Archive(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;
