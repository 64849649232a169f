//! Resource liberation payload.
//!
//! This is the one payload the arbiter ever signs: the outcome of an
//! acquisition attempt, whether delivered synchronously as the reply to
//! an ask or asynchronously as a queue-promotion grant.

use serde::{Deserialize, Serialize};

use crate::ResourceId;

/// Outcome of an acquisition attempt for a single resource.
///
/// `is_liberated == true` means the recipient now owns the resource (or
/// is free to hold it); `false` means the request was queued because the
/// resource is held by someone else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLiberation {
    /// Resource this outcome refers to.
    pub resource: ResourceId,
    /// Whether ownership was granted.
    pub is_liberated: bool,
}

impl ResourceLiberation {
    /// Payload for a granted acquisition.
    pub fn granted(resource: ResourceId) -> Self {
        Self { resource, is_liberated: true }
    }

    /// Payload for a queued acquisition.
    pub fn queued(resource: ResourceId) -> Self {
        Self { resource, is_liberated: false }
    }
}
