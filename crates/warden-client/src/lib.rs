//! Warden client state machine.
//!
//! Pure state machine for talking to a Warden arbiter: builds request
//! frames, verifies and opens signed envelopes, caches the server public
//! key from first contact, and tracks which resources this client holds
//! or waits on. No I/O — the caller owns the connection and feeds
//! received [`warden_proto::ServerMessage`]s in.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod client;
mod error;
mod event;

pub use client::ArbiterClient;
pub use error::ClientError;
pub use event::ClientAction;
