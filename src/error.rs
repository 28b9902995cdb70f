//! Error types shared by the locator, the publisher and the remote clients.

use std::path::PathBuf;
use thiserror::Error;

/// Failures reported by a remote repository host.
///
/// These are surfaced unchanged by the publisher: nothing is retried or
/// translated on the way out.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("merge conflict merging {head} into {base}")]
    MergeConflict { base: String, head: String },

    #[error("remote API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("invalid remote configuration: {0}")]
    Config(String),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to decode remote response: {0}")]
    Decode(String),
}

/// Failures of a publish run.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("publish is not implemented for this publisher")]
    NotImplemented,

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("publish listener failed: {0}")]
    Listener(anyhow::Error),
}
