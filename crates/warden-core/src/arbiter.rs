//! Arbiter
//!
//! Orchestrates the client registry, the resource table, and the signer
//! to implement the register/ask/liberate protocol.
//!
//! ## Responsibilities
//!
//! - Registration: assign pids via [`ClientRegistry`]
//! - Acquisition: delegate to [`ResourceTable`], wrap the outcome in a
//!   signed envelope
//! - Liberation: plain boolean acknowledgment, no envelope
//! - Observation: read-only [`ArbiterSnapshot`] for the status display
//!
//! ## Design
//!
//! Sans-IO: every operation mutates in-memory state and returns a value;
//! the driver owns the lock, the sockets, and the sweep task. The
//! envelope built for a sweep-dispatch grant goes through the same path
//! as an ask reply, so first-contact public-key attachment behaves
//! identically on both.

use ed25519_dalek::VerifyingKey;
use warden_proto::{ClientId, ResourceId, ResourceLiberation, SignedEnvelope};

use crate::{
    env::Environment,
    error::ArbiterError,
    registry::ClientRegistry,
    signer::EnvelopeSigner,
    snapshot::{ArbiterSnapshot, ResourceSnapshot},
    table::{AcquireOutcome, ResourceTable},
};

/// The centralized mutual-exclusion arbiter.
///
/// Holds the process-wide state: key pair, resource table (pool size
/// fixed at construction), and client registry. Lives for the process
/// lifetime; nothing is persisted across restarts.
pub struct Arbiter<E>
where
    E: Environment,
{
    env: E,
    signer: EnvelopeSigner,
    registry: ClientRegistry,
    table: ResourceTable,
}

impl<E> Arbiter<E>
where
    E: Environment,
{
    /// Create an arbiter over a pool of `resources` slots, generating a
    /// fresh server key pair from environment entropy.
    pub fn new(env: E, resources: u32) -> Self {
        let signer = EnvelopeSigner::generate(&env);
        Self::with_signer(env, resources, signer)
    }

    /// Create an arbiter with an explicit signer (deterministic tests).
    pub fn with_signer(env: E, resources: u32, signer: EnvelopeSigner) -> Self {
        Self { env, signer, registry: ClientRegistry::new(), table: ResourceTable::new(resources) }
    }

    /// Register a new client and return its pid. Cannot fail.
    pub fn register_client(&mut self) -> ClientId {
        let pid = self.registry.register();
        tracing::debug!(pid, "client registered");
        pid
    }

    /// Request exclusive ownership of `resource` for `pid`.
    ///
    /// Always returns promptly: granted if the resource is free or
    /// already owned by `pid`, queued otherwise. The outcome is returned
    /// as a signed envelope; waiting clients receive the eventual grant
    /// through the sweep dispatch push, not by blocking here.
    ///
    /// # Errors
    ///
    /// Returns `ArbiterError::InvalidResource` for an out-of-range id.
    pub fn ask_resource(
        &mut self,
        pid: ClientId,
        resource: ResourceId,
    ) -> Result<SignedEnvelope, ArbiterError> {
        let outcome = self.table.try_acquire(resource, pid, self.env.now())?;
        let is_liberated = outcome == AcquireOutcome::Granted;

        tracing::debug!(pid, resource, granted = is_liberated, "ask");
        self.build_envelope(pid, ResourceLiberation { resource, is_liberated })
    }

    /// Voluntarily release `resource`.
    ///
    /// Returns the table's verdict verbatim: true only when `pid` was
    /// the current owner. A plain boolean, not an envelope — the release
    /// is client-originated and needs only a liveness acknowledgment.
    ///
    /// # Errors
    ///
    /// Returns `ArbiterError::InvalidResource` for an out-of-range id.
    pub fn liberate_resource(
        &mut self,
        pid: ClientId,
        resource: ResourceId,
    ) -> Result<bool, ArbiterError> {
        let liberated = self.table.liberate(resource, pid)?;
        tracing::debug!(pid, resource, liberated, "liberate");
        Ok(liberated)
    }

    /// Immutable view of the current state for the status display.
    ///
    /// Reading a snapshot never mutates arbiter state; presentation
    /// cadence is entirely the consumer's business.
    pub fn snapshot(&self) -> ArbiterSnapshot {
        let now = self.env.now();

        ArbiterSnapshot {
            clients: self.registry.len(),
            resources: (0..self.table.resources())
                .map(|id| ResourceSnapshot {
                    id,
                    owner: self.table.owner(id),
                    held_for: self.table.elapsed_since(id, now),
                    queue: self.table.queued(id),
                })
                .collect(),
        }
    }

    /// The server public key clients verify envelopes against.
    pub fn public_key(&self) -> VerifyingKey {
        self.signer.public_key()
    }

    /// Build the signed envelope for a grant identical to an ask reply.
    /// Shared with the sweep dispatch pass.
    pub(crate) fn grant_envelope(
        &mut self,
        pid: ClientId,
        resource: ResourceId,
    ) -> Result<SignedEnvelope, ArbiterError> {
        self.build_envelope(pid, ResourceLiberation::granted(resource))
    }

    pub(crate) fn table(&self) -> &ResourceTable {
        &self.table
    }

    pub(crate) fn table_mut(&mut self) -> &mut ResourceTable {
        &mut self.table
    }

    fn build_envelope(
        &mut self,
        pid: ClientId,
        payload: ResourceLiberation,
    ) -> Result<SignedEnvelope, ArbiterError> {
        let mut bytes = Vec::new();
        ciborium::ser::into_writer(&payload, &mut bytes)
            .map_err(|e| ArbiterError::Encode(e.to_string()))?;

        let signature = self.signer.sign(&bytes);
        let public_key = self.registry.needs_public_key(pid).then(|| self.signer.public_key());
        self.registry.mark_public_key_sent(pid);

        Ok(SignedEnvelope::new(bytes, signature, public_key))
    }
}

impl<E> std::fmt::Debug for Arbiter<E>
where
    E: Environment,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arbiter")
            .field("resources", &self.table.resources())
            .field("clients", &self.registry.len())
            .finish()
    }
}
