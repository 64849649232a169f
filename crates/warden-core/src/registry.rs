//! Client registration.

use warden_proto::ClientId;

/// Assigns sequential pids and tracks first-contact state.
///
/// A pid is a bearer token: it is assigned at registration and trusted
/// verbatim on every later call. The registry never rejects an unknown
/// pid — presenting one simply means the public key is attached to every
/// envelope until the pid is marked, matching the trust assumption the
/// protocol accepts (see DESIGN.md).
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: Vec<ClientRecord>,
}

#[derive(Debug, Default)]
struct ClientRecord {
    public_key_sent: bool,
}

impl ClientRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new client and return its pid.
    ///
    /// Pids are 0-based registration indices, monotonically assigned and
    /// never reused. This operation cannot fail.
    pub fn register(&mut self) -> ClientId {
        self.clients.push(ClientRecord::default());
        (self.clients.len() - 1) as ClientId
    }

    /// Whether envelopes to `pid` must still carry the public key.
    ///
    /// True until [`Self::mark_public_key_sent`] has recorded the first
    /// contact. Unknown pids report true.
    pub fn needs_public_key(&self, pid: ClientId) -> bool {
        usize::try_from(pid)
            .ok()
            .and_then(|index| self.clients.get(index))
            .is_none_or(|record| !record.public_key_sent)
    }

    /// Record that `pid` has received the public key. Idempotent;
    /// out-of-range pids are a no-op.
    pub fn mark_public_key_sent(&mut self, pid: ClientId) {
        if let Some(record) =
            usize::try_from(pid).ok().and_then(|index| self.clients.get_mut(index))
        {
            record.public_key_sent = true;
        }
    }

    /// Number of registered clients.
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Whether no client has registered yet.
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
