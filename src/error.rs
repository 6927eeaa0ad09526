use std::time::Duration;
use thiserror::Error;

/// Input that no link pattern recognised.
#[derive(Debug, Error)]
#[error("not a recognised video link: {0:?}")]
pub struct InvalidLink(pub String);

/// Failure of a single call into the extraction tool.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("extraction timed out after {0:?}")]
    Timeout(Duration),

    #[error("extraction tool exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    #[error("unreadable extraction output: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("no playable stream in extraction result for {0}")]
    NoStream(String),
}

#[derive(Debug, Error)]
pub enum ResolveError {
    /// Both the primary and the fallback attempt failed.
    #[error("video {id} is unavailable")]
    Unavailable {
        id: String,
        #[source]
        source: ExtractError,
    },
}

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("upstream answered {0}")]
    Status(http::StatusCode),
}
