//! Client error types.

use thiserror::Error;
use warden_proto::ProtoError;

/// Errors from client operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// An operation requiring a pid was attempted before registration.
    #[error("not registered with the arbiter yet")]
    NotRegistered,

    /// An envelope arrived before any public key was learned.
    ///
    /// The server attaches its key only to the first envelope per pid;
    /// if that key was lost (restarted client reusing a pid), later
    /// envelopes can never be verified.
    #[error("no server public key cached and none attached")]
    MissingPublicKey,

    /// An envelope carried a public key that conflicts with the cached
    /// one.
    #[error("server public key changed mid-session")]
    KeyMismatch,

    /// Envelope verification or payload decoding failed.
    #[error(transparent)]
    Proto(#[from] ProtoError),

    /// The server reported a caller contract violation.
    #[error("server rejected the request: {reason}")]
    Rejected {
        /// Server-supplied reason.
        reason: String,
    },
}

impl ClientError {
    /// Returns true if this error is fatal (unrecoverable).
    ///
    /// Fatal errors indicate a forged or corrupted channel; transient
    /// errors can be recovered by registering or correcting the call.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::MissingPublicKey | Self::KeyMismatch | Self::Proto(_) => true,
            Self::NotRegistered | Self::Rejected { .. } => false,
        }
    }
}
