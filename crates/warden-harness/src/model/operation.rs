//! Operations for model-based testing.
//!
//! Operations represent all possible actions against the arbiter. They
//! are generated randomly and applied to both the model and the real
//! implementation; results must match step for step.

use arbitrary::Arbitrary;
use warden_proto::{ClientId, ResourceId};

/// Client identifier, compressed to u8 to keep the test space small.
pub type ModelClientId = u8;

/// Resource identifier, compressed to u8. Values at or beyond the pool
/// size exercise the invalid-resource path.
pub type ModelResourceId = u8;

/// One step of a test scenario.
#[derive(Debug, Clone, Arbitrary)]
pub enum Operation {
    /// Register a new client; the arbiter assigns the next pid.
    Register,

    /// Ask for a resource on behalf of a pid.
    ///
    /// The pid is used verbatim whether or not it was registered — pids
    /// are bearer tokens and the protocol serves unknown ones.
    Ask {
        /// Pid presenting the request.
        client: ModelClientId,
        /// Requested resource.
        resource: ModelResourceId,
    },

    /// Voluntarily release a resource on behalf of a pid.
    Liberate {
        /// Pid presenting the release.
        client: ModelClientId,
        /// Resource to release.
        resource: ModelResourceId,
    },

    /// Advance the virtual clock.
    AdvanceTime {
        /// Milliseconds to advance.
        millis: u16,
    },

    /// Run one sweep tick (timeout pass, then dispatch pass).
    Sweep,
}

/// Result of applying an operation, comparable across implementations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationResult {
    /// A pid was assigned.
    Registered(ClientId),

    /// An ask completed; `granted` mirrors the envelope's
    /// `is_liberated` flag.
    Asked {
        /// Whether ownership was granted.
        granted: bool,
    },

    /// A liberation completed.
    Liberated {
        /// Whether the caller owned the resource.
        accepted: bool,
    },

    /// The clock moved.
    TimeAdvanced,

    /// A sweep tick ran.
    Swept {
        /// `(resource, former owner)` per eviction, in resource order.
        evictions: Vec<(ResourceId, ClientId)>,
        /// `(resource, recipient)` per dispatched grant, in resource
        /// order.
        grants: Vec<(ResourceId, ClientId)>,
    },

    /// The operation violated the caller contract (resource id out of
    /// range).
    Invalid,
}
