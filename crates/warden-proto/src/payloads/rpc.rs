//! Remote-call request and reply vocabulary.
//!
//! Clients send [`Request`] frames; the server answers each in order on
//! the same connection with a [`ServerMessage`]. Queue-promotion grants
//! arrive interleaved as [`ServerMessage::Grant`] frames, pushed by the
//! server without a corresponding request.

use serde::{Deserialize, Serialize};

use crate::{ClientId, ResourceId, SignedEnvelope};

/// Client-originated call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Request {
    /// Register with the arbiter and receive a pid.
    Register,

    /// Request exclusive ownership of a resource.
    ///
    /// Always answered promptly with a signed envelope: granted if the
    /// resource is free (or already owned by `pid`), queued otherwise.
    Ask {
        /// Caller's pid.
        pid: ClientId,
        /// Resource to acquire.
        resource: ResourceId,
    },

    /// Voluntarily release a held resource.
    ///
    /// Answered with a plain boolean: `true` only when `pid` was the
    /// current owner.
    Liberate {
        /// Caller's pid.
        pid: ClientId,
        /// Resource to release.
        resource: ResourceId,
    },
}

/// Server-originated frame: replies and asynchronous grant pushes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServerMessage {
    /// Reply to [`Request::Register`].
    Registered {
        /// The newly assigned pid.
        pid: ClientId,
    },

    /// Reply to [`Request::Ask`]: the signed acquisition outcome.
    Resource {
        /// Signed `ResourceLiberation` payload.
        envelope: SignedEnvelope,
    },

    /// Reply to [`Request::Liberate`].
    Liberated {
        /// Resource the release referred to.
        resource: ResourceId,
        /// Whether the caller owned the resource and it was released.
        liberated: bool,
    },

    /// Asynchronous queue-promotion grant, pushed by the sweep dispatch
    /// pass. Carries the same envelope an ask reply would.
    Grant {
        /// Signed `ResourceLiberation` payload (always a grant).
        envelope: SignedEnvelope,
    },

    /// The request violated the caller contract (e.g. resource id out of
    /// range) or could not be parsed.
    Error {
        /// Human-readable reason.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serde_roundtrip() {
        let requests = [
            Request::Register,
            Request::Ask { pid: 1, resource: 0 },
            Request::Liberate { pid: 9, resource: 3 },
        ];

        for request in requests {
            let mut bytes = Vec::new();
            ciborium::ser::into_writer(&request, &mut bytes).expect("encode");

            let decoded: Request = ciborium::de::from_reader(&bytes[..]).expect("decode");
            assert_eq!(request, decoded);
        }
    }

    #[test]
    fn error_reply_serde_roundtrip() {
        let message = ServerMessage::Error { reason: "resource 9 out of range".to_string() };

        let mut bytes = Vec::new();
        ciborium::ser::into_writer(&message, &mut bytes).expect("encode");

        let decoded: ServerMessage = ciborium::de::from_reader(&bytes[..]).expect("decode");
        assert_eq!(message, decoded);
    }
}
