//! Signed response envelope.

use ed25519_dalek::{Signature, VerifyingKey};
use serde::{Deserialize, Serialize};

use crate::{ProtoError, ResourceLiberation};

/// Wrapper around every signed payload the arbiter sends to a client.
///
/// The payload is the CBOR encoding of a [`ResourceLiberation`], signed
/// with the server's Ed25519 key. The server attaches its public key to
/// the first envelope it ever sends a given pid and omits it afterwards;
/// clients are expected to cache it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedEnvelope {
    /// CBOR-encoded [`ResourceLiberation`].
    pub payload: Vec<u8>,

    /// Ed25519 signature over `payload`.
    pub signature: Signature,

    /// Server public key, present only on first contact per pid.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub public_key: Option<VerifyingKey>,
}

impl SignedEnvelope {
    /// Build an envelope from its parts.
    pub fn new(payload: Vec<u8>, signature: Signature, public_key: Option<VerifyingKey>) -> Self {
        Self { payload, signature, public_key }
    }

    /// Check the signature over the payload under `key`.
    pub fn verify(&self, key: &VerifyingKey) -> bool {
        key.verify_strict(&self.payload, &self.signature).is_ok()
    }

    /// Verify the envelope and decode its payload.
    ///
    /// # Errors
    ///
    /// Returns `ProtoError::BadSignature` when the signature does not
    /// verify under `key`, `ProtoError::Decode` when the payload is not a
    /// valid `ResourceLiberation` encoding.
    pub fn open(&self, key: &VerifyingKey) -> Result<ResourceLiberation, ProtoError> {
        if !self.verify(key) {
            return Err(ProtoError::BadSignature);
        }

        ciborium::de::from_reader(self.payload.as_slice())
            .map_err(|e| ProtoError::Decode(e.to_string()))
    }
}

impl std::fmt::Debug for SignedEnvelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignedEnvelope")
            .field("payload", &format!("{} bytes", self.payload.len()))
            .field("public_key", &self.public_key.is_some())
            .finish()
    }
}
