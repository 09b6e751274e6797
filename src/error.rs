//! Error types for auto-sweep
//!
//! Toyota Way: Clear error messages with actionable guidance (Respect for People)

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// auto-sweep error types
///
/// None of these abort a sweep on their own: the dispatcher logs them per
/// work item and moves on to the next one.
#[derive(Error, Debug)]
pub enum Error {
    /// An artifact the next stage depends on is not on disk
    #[error("Missing artifact: {0}\nThe producing tool did not leave it behind; check the archived log")]
    MissingArtifact(String),

    /// External tool could not be started at all
    #[error("Failed to launch `{tool}`: {reason}\nIs the tool on PATH?")]
    ToolLaunch {
        /// Program name
        tool: String,
        /// OS-level reason
        reason: String,
    },

    /// Work item asked to move along an edge the state machine does not have
    #[error("Invalid work item transition for {item}: {from} -> {to}")]
    InvalidTransition {
        /// Work item label
        item: String,
        /// Current status
        from: String,
        /// Requested status
        to: String,
    },

    /// Design identifier not in the catalogue grammar
    #[error("Unknown design variant: {0}")]
    UnknownDesign(String),

    /// Precision code outside the supported enumeration
    #[error("Unknown precision code: {0} (expected one of 0000, 0010, 0011, 1010, 1111)")]
    UnknownPrecision(String),

    /// Sweep was cancelled; names the step that was not started
    #[error("Sweep cancelled before {0}")]
    Cancelled(String),

    /// Configuration could not be read or parsed
    #[error("Configuration error: {0}")]
    Config(String),

    /// Extraction pattern failed to compile
    #[error("Extraction pattern error: {0}")]
    Pattern(#[from] regex::Error),

    /// Storage error (Parquet)
    #[error("Storage error: {0}")]
    StorageError(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Arrow error
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Run summary could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Worker pool could not be built
    #[error("Worker pool error: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
