//! Server error types.

use thiserror::Error;
use warden_core::ArbiterError;
use warden_proto::ProtoError;

/// Errors that can occur in the server runtime.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Invalid runtime configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Socket-level failure.
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// Wire encoding/decoding failure.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtoError),

    /// Arbiter-level failure.
    #[error("arbiter error: {0}")]
    Arbiter(#[from] ArbiterError),
}
