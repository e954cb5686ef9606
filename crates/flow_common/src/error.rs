//! Typed errors for the engine.
//!
//! Classification and extraction are total functions and have no error type.
//! Provider errors escalate local→remote exactly once, then surface as an
//! error response; they never take down the session loop.

use thiserror::Error;

/// Errors from a chat provider (local or remote).
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("provider returned {code}: {body}")]
    Status { code: u16, body: String },

    #[error("stream error: {0}")]
    Stream(String),

    #[error("API key env var {0} not set")]
    MissingApiKey(String),
}

/// Session-level errors visible to the embedding shell.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A submit arrived while a previous one was still in flight.
    /// Submissions are serialized per session; the caller should retry after
    /// the current response lands.
    #[error("a request is already in flight for this session")]
    Busy,
}
