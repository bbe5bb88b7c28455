use thiserror::Error;

use leadscout_core::ValidationError;
use leadscout_store::StoreError;

/// Failures reaching out to the external extraction service.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Failures writing report artifacts.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error writing {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error for {context}: {source}")]
    Serialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Failures surfaced to callers of the orchestrator's API.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// An execution handle already exists for the job.
    #[error("job is already running")]
    AlreadyRunning,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A failure inside a running execution. Caught at the job boundary and
/// recorded as the job's error message; never propagated to the caller of
/// `start`.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("extraction failed for \"{location}\": {source}")]
    Extract {
        location: String,
        #[source]
        source: ExtractError,
    },

    #[error("failed to persist listings: {0}")]
    Persist(#[from] StoreError),

    #[error("report export failed: {0}")]
    Export(#[from] ExportError),
}
