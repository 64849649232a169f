//! Arbiter error types.

use thiserror::Error;
use warden_proto::ResourceId;

/// Errors from arbiter operations.
///
/// Unauthorized liberation is deliberately NOT an error: it is the plain
/// `false` result of `liberate_resource`, and the caller decides whether
/// to ask again. Signature verification failures are a client-side
/// concern and never surface here.
#[derive(Debug, Error)]
pub enum ArbiterError {
    /// Resource id outside `[0, pool size)`. A caller contract
    /// violation; signaled immediately, never retried.
    #[error("resource {resource} out of range: pool has {pool_size} resources")]
    InvalidResource {
        /// The offending resource id.
        resource: ResourceId,
        /// Size of the configured pool.
        pool_size: u32,
    },

    /// Envelope payload could not be serialized.
    #[error("grant payload encoding failed: {0}")]
    Encode(String),
}
