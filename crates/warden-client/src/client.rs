//! Client state machine.
//!
//! The `ArbiterClient` tracks this process's view of the arbiter: its
//! pid, the cached server public key, and the resources it currently
//! holds or waits on. Pure state machine — callers perform the I/O and
//! feed server frames in; results come back as [`ClientAction`]s.

use std::collections::BTreeSet;

use ed25519_dalek::VerifyingKey;
use warden_proto::{
    ClientId, ProtoError, Request, ResourceId, ResourceLiberation, ServerMessage, SignedEnvelope,
};

use crate::{error::ClientError, event::ClientAction};

/// Client-side view of one arbiter session.
#[derive(Debug, Default)]
pub struct ArbiterClient {
    /// Pid assigned at registration.
    pid: Option<ClientId>,

    /// Server public key, cached from the first envelope received.
    server_key: Option<VerifyingKey>,

    /// Resources this client currently owns (as far as it knows: a
    /// timeout eviction is only discovered on the next call).
    held: BTreeSet<ResourceId>,

    /// Resources this client is queued on.
    waiting: BTreeSet<ResourceId>,
}

impl ArbiterClient {
    /// Create an unregistered client.
    pub fn new() -> Self {
        Self::default()
    }

    /// The assigned pid, once registered.
    pub fn pid(&self) -> Option<ClientId> {
        self.pid
    }

    /// Whether registration has completed.
    pub fn is_registered(&self) -> bool {
        self.pid.is_some()
    }

    /// Whether this client believes it holds `resource`.
    pub fn holds(&self, resource: ResourceId) -> bool {
        self.held.contains(&resource)
    }

    /// Whether this client believes it is queued on `resource`.
    pub fn is_waiting(&self, resource: ResourceId) -> bool {
        self.waiting.contains(&resource)
    }

    /// The registration request. Valid at any time; re-registering
    /// yields a fresh pid and abandons the old identity.
    pub fn register_request(&self) -> Request {
        Request::Register
    }

    /// Build an acquisition request for `resource`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotRegistered` before registration.
    pub fn ask_request(&self, resource: ResourceId) -> Result<Request, ClientError> {
        let pid = self.pid.ok_or(ClientError::NotRegistered)?;
        Ok(Request::Ask { pid, resource })
    }

    /// Build a liberation request for `resource`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotRegistered` before registration.
    pub fn liberate_request(&self, resource: ResourceId) -> Result<Request, ClientError> {
        let pid = self.pid.ok_or(ClientError::NotRegistered)?;
        Ok(Request::Liberate { pid, resource })
    }

    /// Process a frame from the server and return resulting actions.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the frame cannot be processed; see
    /// [`ClientError::is_fatal`] for which failures are recoverable.
    pub fn handle_message(
        &mut self,
        message: ServerMessage,
    ) -> Result<Vec<ClientAction>, ClientError> {
        match message {
            ServerMessage::Registered { pid } => {
                self.pid = Some(pid);
                Ok(vec![ClientAction::Registered { pid }])
            },

            ServerMessage::Resource { envelope } | ServerMessage::Grant { envelope } => {
                self.handle_envelope(&envelope)
            },

            ServerMessage::Liberated { resource, liberated } => {
                if liberated {
                    self.held.remove(&resource);
                }
                Ok(vec![ClientAction::Released { resource, accepted: liberated }])
            },

            ServerMessage::Error { reason } => Err(ClientError::Rejected { reason }),
        }
    }

    /// Verify an envelope, decode its payload, and update held/waiting
    /// state.
    fn handle_envelope(
        &mut self,
        envelope: &SignedEnvelope,
    ) -> Result<Vec<ClientAction>, ClientError> {
        let key = self.learn_key(envelope)?;

        if !envelope.verify(&key) {
            return Err(ClientError::Proto(ProtoError::BadSignature));
        }

        let payload: ResourceLiberation = ciborium::de::from_reader(envelope.payload.as_slice())
            .map_err(|e| ClientError::Proto(ProtoError::Decode(e.to_string())))?;

        let resource = payload.resource;
        self.waiting.remove(&resource);

        if payload.is_liberated {
            self.held.insert(resource);
            Ok(vec![ClientAction::Granted { resource }])
        } else {
            self.waiting.insert(resource);
            Ok(vec![ClientAction::Queued { resource }])
        }
    }

    /// Resolve the verification key: cache it from first contact, reject
    /// a conflicting key later.
    fn learn_key(&mut self, envelope: &SignedEnvelope) -> Result<VerifyingKey, ClientError> {
        match (self.server_key, envelope.public_key) {
            (None, Some(key)) => {
                self.server_key = Some(key);
                Ok(key)
            },
            (Some(cached), Some(attached)) if cached != attached => Err(ClientError::KeyMismatch),
            (Some(cached), _) => Ok(cached),
            (None, None) => Err(ClientError::MissingPublicKey),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use ed25519_dalek::{Signer, SigningKey};

    use super::*;

    struct TestServer {
        signing: SigningKey,
        key_sent: bool,
    }

    impl TestServer {
        fn new() -> Self {
            Self { signing: SigningKey::from_bytes(&[11u8; 32]), key_sent: false }
        }

        fn envelope(&mut self, payload: ResourceLiberation) -> SignedEnvelope {
            let mut bytes = Vec::new();
            ciborium::ser::into_writer(&payload, &mut bytes).unwrap();

            let signature = self.signing.sign(&bytes);
            let public_key = (!self.key_sent).then(|| self.signing.verifying_key());
            self.key_sent = true;

            SignedEnvelope::new(bytes, signature, public_key)
        }
    }

    fn registered_client() -> ArbiterClient {
        let mut client = ArbiterClient::new();
        client.handle_message(ServerMessage::Registered { pid: 4 }).unwrap();
        client
    }

    #[test]
    fn requests_require_registration() {
        let client = ArbiterClient::new();

        assert!(matches!(client.ask_request(0), Err(ClientError::NotRegistered)));
        assert!(matches!(client.liberate_request(0), Err(ClientError::NotRegistered)));
        assert_eq!(client.register_request(), Request::Register);
    }

    #[test]
    fn registration_sets_pid() {
        let client = registered_client();

        assert_eq!(client.pid(), Some(4));
        assert_eq!(client.ask_request(2).unwrap(), Request::Ask { pid: 4, resource: 2 });
    }

    #[test]
    fn granted_envelope_updates_held_set() {
        let mut server = TestServer::new();
        let mut client = registered_client();

        let actions = client
            .handle_message(ServerMessage::Resource {
                envelope: server.envelope(ResourceLiberation::granted(1)),
            })
            .unwrap();

        assert_eq!(actions, vec![ClientAction::Granted { resource: 1 }]);
        assert!(client.holds(1));
        assert!(!client.is_waiting(1));
    }

    #[test]
    fn queued_envelope_updates_waiting_set() {
        let mut server = TestServer::new();
        let mut client = registered_client();

        let actions = client
            .handle_message(ServerMessage::Resource {
                envelope: server.envelope(ResourceLiberation::queued(1)),
            })
            .unwrap();

        assert_eq!(actions, vec![ClientAction::Queued { resource: 1 }]);
        assert!(client.is_waiting(1));
        assert!(!client.holds(1));
    }

    #[test]
    fn pushed_grant_promotes_waiting_to_held() {
        let mut server = TestServer::new();
        let mut client = registered_client();

        client
            .handle_message(ServerMessage::Resource {
                envelope: server.envelope(ResourceLiberation::queued(3)),
            })
            .unwrap();

        let actions = client
            .handle_message(ServerMessage::Grant {
                envelope: server.envelope(ResourceLiberation::granted(3)),
            })
            .unwrap();

        assert_eq!(actions, vec![ClientAction::Granted { resource: 3 }]);
        assert!(client.holds(3));
        assert!(!client.is_waiting(3));
    }

    #[test]
    fn accepted_liberation_clears_held() {
        let mut server = TestServer::new();
        let mut client = registered_client();

        client
            .handle_message(ServerMessage::Resource {
                envelope: server.envelope(ResourceLiberation::granted(1)),
            })
            .unwrap();

        let actions = client
            .handle_message(ServerMessage::Liberated { resource: 1, liberated: true })
            .unwrap();

        assert_eq!(actions, vec![ClientAction::Released { resource: 1, accepted: true }]);
        assert!(!client.holds(1));
    }

    #[test]
    fn refused_liberation_keeps_state() {
        let mut client = registered_client();

        let actions = client
            .handle_message(ServerMessage::Liberated { resource: 0, liberated: false })
            .unwrap();

        assert_eq!(actions, vec![ClientAction::Released { resource: 0, accepted: false }]);
    }

    #[test]
    fn envelope_without_any_key_is_rejected() {
        let mut server = TestServer::new();
        server.key_sent = true; // server believes it already sent the key
        let mut client = registered_client();

        let result = client.handle_message(ServerMessage::Resource {
            envelope: server.envelope(ResourceLiberation::granted(0)),
        });

        assert!(matches!(result, Err(ClientError::MissingPublicKey)));
    }

    #[test]
    fn tampered_envelope_is_rejected() {
        let mut server = TestServer::new();
        let mut client = registered_client();

        let mut envelope = server.envelope(ResourceLiberation::granted(0));
        envelope.payload[0] ^= 0xff;

        let result = client.handle_message(ServerMessage::Resource { envelope });

        assert!(matches!(result, Err(ClientError::Proto(ProtoError::BadSignature))));
        assert!(!client.holds(0));
    }

    #[test]
    fn conflicting_key_is_fatal() {
        let mut server = TestServer::new();
        let mut client = registered_client();

        client
            .handle_message(ServerMessage::Resource {
                envelope: server.envelope(ResourceLiberation::granted(0)),
            })
            .unwrap();

        // A different signer attaches its own key mid-session.
        let mut imposter = TestServer { signing: SigningKey::from_bytes(&[99u8; 32]), key_sent: false };
        let result = client.handle_message(ServerMessage::Resource {
            envelope: imposter.envelope(ResourceLiberation::granted(1)),
        });

        assert!(matches!(result, Err(ClientError::KeyMismatch)));
        assert!(!client.holds(1));
    }

    #[test]
    fn server_error_surfaces_as_rejection() {
        let mut client = registered_client();

        let result = client.handle_message(ServerMessage::Error {
            reason: "resource 9 out of range".to_string(),
        });

        assert!(matches!(result, Err(ClientError::Rejected { .. })));
    }

    mod props {
        use proptest::prelude::*;

        use super::*;

        proptest! {
            /// Flipping any byte of the payload must fail verification;
            /// state must stay untouched.
            #[test]
            fn any_payload_tampering_is_detected(index in 0usize..8, mask in 1u8..=255) {
                let mut server = TestServer::new();
                let mut client = registered_client();

                let mut envelope = server.envelope(ResourceLiberation::granted(2));
                let position = index % envelope.payload.len();
                envelope.payload[position] ^= mask;

                let result = client.handle_message(ServerMessage::Resource { envelope });

                prop_assert!(matches!(result, Err(ClientError::Proto(ProtoError::BadSignature))));
                prop_assert!(!client.holds(2));
            }
        }
    }
}
