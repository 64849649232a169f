//! Warden arbiter core.
//!
//! A centralized mutual-exclusion arbiter over a fixed pool of abstract
//! resources. Clients are identified by a server-assigned pid; requests
//! for a held resource queue FIFO, ownership ends by explicit liberation
//! or by timeout eviction, and every response toward a client is signed
//! with the server's Ed25519 key.
//!
//! ## Architecture
//!
//! ```text
//! Arbiter
//!   ├─ ClientRegistry   (pid assignment, pubkey-sent flags)
//!   ├─ ResourceTable    (owner / acquired-at / wait queue per resource)
//!   └─ EnvelopeSigner   (Ed25519 over CBOR payloads)
//! Sweeper               (periodic tick: timeout pass + dispatch pass)
//! ```
//!
//! Everything here is Sans-IO: operations mutate state and return values
//! or actions; the driver (see `warden-server`) owns sockets, tasks, and
//! the single coarse lock that serializes client calls against the sweep
//! tick.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod arbiter;
pub mod env;
mod error;
mod registry;
mod signer;
mod snapshot;
mod sweeper;
mod table;

pub use arbiter::Arbiter;
pub use error::ArbiterError;
pub use registry::ClientRegistry;
pub use signer::EnvelopeSigner;
pub use snapshot::{ArbiterSnapshot, ResourceSnapshot};
pub use sweeper::{SweepAction, Sweeper, SweeperConfig};
pub use table::{AcquireOutcome, ResourceTable};
