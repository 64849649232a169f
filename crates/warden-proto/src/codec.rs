//! CBOR codec helpers.
//!
//! Each frame on the wire is a 4-byte big-endian length prefix followed
//! by one CBOR-encoded message. The length prefix itself is handled by
//! the transport's framing codec; these helpers produce and consume the
//! body bytes and enforce the shared size cap on both sides.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtoError;

/// Maximum size of a single frame body.
///
/// Warden messages are tiny (a few dozen bytes); the cap exists to bound
/// allocation on malformed or hostile length prefixes.
pub const MAX_FRAME_BYTES: usize = 64 * 1024;

/// Encode a message to CBOR frame-body bytes.
///
/// # Errors
///
/// Returns `ProtoError::Encode` if serialization fails and
/// `ProtoError::FrameTooLarge` if the encoding exceeds [`MAX_FRAME_BYTES`].
pub fn encode_message<T: Serialize>(message: &T) -> Result<Vec<u8>, ProtoError> {
    let mut bytes = Vec::new();
    ciborium::ser::into_writer(message, &mut bytes)
        .map_err(|e| ProtoError::Encode(e.to_string()))?;

    if bytes.len() > MAX_FRAME_BYTES {
        return Err(ProtoError::FrameTooLarge(bytes.len()));
    }

    Ok(bytes)
}

/// Decode a message from CBOR frame-body bytes.
///
/// # Errors
///
/// Returns `ProtoError::FrameTooLarge` for oversized input and
/// `ProtoError::Decode` for anything that is not a valid encoding of `T`.
pub fn decode_message<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ProtoError> {
    if bytes.len() > MAX_FRAME_BYTES {
        return Err(ProtoError::FrameTooLarge(bytes.len()));
    }

    ciborium::de::from_reader(bytes).map_err(|e| ProtoError::Decode(e.to_string()))
}
