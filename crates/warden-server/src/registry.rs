//! Connection registry.
//!
//! Maps a pid to the outbound channel of the connection that registered
//! it, so the sweep dispatch pass can push grants to waiting clients.
//! Delivery is fire-and-forget: a closed or saturated channel drops the
//! grant with a log line, and the next sweep re-evaluates the queue
//! anyway if the pid re-asks.

use std::{collections::HashMap, sync::Arc};

use tokio::sync::{Mutex, mpsc};
use warden_proto::{ClientId, ServerMessage};

/// Shared pid → connection-sender map.
#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    inner: Arc<Mutex<HashMap<ClientId, mpsc::Sender<ServerMessage>>>>,
}

impl ConnectionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Associate `pid` with a connection's outbound channel.
    ///
    /// A pid registered twice keeps the most recent channel.
    pub async fn bind(&self, pid: ClientId, sender: mpsc::Sender<ServerMessage>) {
        self.inner.lock().await.insert(pid, sender);
    }

    /// Drop the association for `pid` (connection closed).
    pub async fn unbind(&self, pid: ClientId) {
        self.inner.lock().await.remove(&pid);
    }

    /// Push a message to `pid`'s connection, fire-and-forget.
    ///
    /// Returns whether the message was handed to a live channel. No
    /// retry: a client that never reconnects simply misses the push.
    pub async fn deliver(&self, pid: ClientId, message: ServerMessage) -> bool {
        let sender = self.inner.lock().await.get(&pid).cloned();

        let Some(sender) = sender else {
            tracing::warn!(pid, "no connection bound for grant push");
            return false;
        };

        match sender.try_send(message) {
            Ok(()) => true,
            Err(error) => {
                tracing::warn!(pid, %error, "grant push dropped");
                false
            },
        }
    }

    /// Number of currently bound pids.
    pub async fn connected(&self) -> usize {
        self.inner.lock().await.len()
    }
}

impl std::fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionRegistry").finish_non_exhaustive()
    }
}
