//! Error types for the remote verification protocol.

use thiserror::Error;

/// Errors talking to the grading server. Any of these aborts the run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RemoteProtocolError {
    /// The server answered with an `{"error": ...}` payload.
    #[error("Server error: {0}")]
    Server(String),

    #[error("Server responded with status {0}")]
    Status(u16),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed server reply: {0}")]
    MalformedReply(String),
}
