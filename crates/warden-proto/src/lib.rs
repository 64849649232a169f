//! Warden wire protocol.
//!
//! Defines everything that crosses the network boundary between a Warden
//! server and its clients: request/reply payloads, the signed response
//! envelope, and the CBOR codec helpers used by the framed transport.
//!
//! ## Design
//!
//! - Self-describing messages: every frame body is a single CBOR value,
//!   so no fixed binary header is needed.
//! - Integrity, not confidentiality: payloads travel in the clear but are
//!   signed with the server's Ed25519 key. Clients cache the key from the
//!   first envelope they receive and verify every envelope after that.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod codec;
mod envelope;
mod error;
pub mod payloads;

pub use envelope::SignedEnvelope;
pub use error::ProtoError;
pub use payloads::{
    grant::ResourceLiberation,
    rpc::{Request, ServerMessage},
};

/// Server-assigned process id. Registration index, 0-based, never reused.
pub type ClientId = u64;

/// Identifier of a lockable resource, in `[0, pool size)`.
pub type ResourceId = u32;
