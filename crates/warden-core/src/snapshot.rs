//! Read-only state views.
//!
//! Snapshots decouple the status display from arbiter internals: a
//! presentation layer reads an immutable copy on whatever cadence it
//! likes and can never mutate ownership state through it.

use serde::Serialize;
use warden_proto::{ClientId, ResourceId};

/// Point-in-time view of the whole arbiter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArbiterSnapshot {
    /// Number of registered clients.
    pub clients: usize,
    /// One entry per resource, in id order.
    pub resources: Vec<ResourceSnapshot>,
}

/// Point-in-time view of a single resource.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceSnapshot {
    /// Resource id.
    pub id: ResourceId,
    /// Current owner, if held.
    pub owner: Option<ClientId>,
    /// Seconds held so far, rounded to two decimals; `None` when free.
    pub held_for: Option<f64>,
    /// Wait queue contents, head first.
    pub queue: Vec<ClientId>,
}

impl ResourceSnapshot {
    /// Whether the resource is currently unowned.
    pub fn is_free(&self) -> bool {
        self.owner.is_none()
    }
}
