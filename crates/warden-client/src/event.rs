//! Client actions.

use warden_proto::{ClientId, ResourceId};

/// What happened as a result of processing a server message.
///
/// Returned by [`crate::ArbiterClient::handle_message`] for the caller
/// to act on (wake a waiter, log, retry).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientAction {
    /// Registration completed; the pid is now set.
    Registered {
        /// The assigned pid.
        pid: ClientId,
    },

    /// A verified envelope granted ownership of a resource, either as a
    /// direct ask reply or as a pushed queue-promotion grant.
    Granted {
        /// The granted resource.
        resource: ResourceId,
    },

    /// A verified envelope reported the resource held elsewhere; this
    /// client is now queued.
    Queued {
        /// The contested resource.
        resource: ResourceId,
    },

    /// The server acknowledged a liberation attempt.
    Released {
        /// The resource the release referred to.
        resource: ResourceId,
        /// Whether this client was the owner and the release happened.
        accepted: bool,
    },
}
