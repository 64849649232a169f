//! Protocol error types.

use thiserror::Error;

use crate::codec::MAX_FRAME_BYTES;

/// Errors from wire encoding, decoding, and envelope verification.
#[derive(Debug, Error)]
pub enum ProtoError {
    /// Message could not be serialized to CBOR.
    #[error("message encoding failed: {0}")]
    Encode(String),

    /// Frame bytes could not be parsed as the expected message.
    #[error("message decoding failed: {0}")]
    Decode(String),

    /// Frame exceeds the transport size cap.
    #[error("frame of {0} bytes exceeds the {MAX_FRAME_BYTES} byte limit")]
    FrameTooLarge(usize),

    /// Envelope signature does not verify under the server key.
    #[error("envelope signature verification failed")]
    BadSignature,
}
