//! Server-side envelope signing.

use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};

use crate::env::Environment;

/// Ed25519 signer for outgoing envelopes.
///
/// Wraps the server key pair. Signing is pure; key generation consumes
/// entropy from the [`Environment`], so a seeded harness environment
/// produces a reproducible key pair.
pub struct EnvelopeSigner {
    signing: SigningKey,
}

impl EnvelopeSigner {
    /// Generate a fresh key pair from environment entropy.
    pub fn generate<E: Environment>(env: &E) -> Self {
        let mut seed = [0u8; 32];
        env.random_bytes(&mut seed);
        Self::from_seed(seed)
    }

    /// Build a signer from an explicit 32-byte seed.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self { signing: SigningKey::from_bytes(&seed) }
    }

    /// Sign a payload with the server private key.
    pub fn sign(&self, payload: &[u8]) -> Signature {
        self.signing.sign(payload)
    }

    /// The server public key, attached to first-contact envelopes.
    pub fn public_key(&self) -> VerifyingKey {
        self.signing.verifying_key()
    }
}

impl std::fmt::Debug for EnvelopeSigner {
    // Never print the private key.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvelopeSigner").field("public_key", &self.public_key()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_key_pair() {
        let a = EnvelopeSigner::from_seed([3u8; 32]);
        let b = EnvelopeSigner::from_seed([3u8; 32]);

        assert_eq!(a.public_key(), b.public_key());
    }

    #[test]
    fn signatures_verify_under_public_key() {
        let signer = EnvelopeSigner::from_seed([5u8; 32]);
        let signature = signer.sign(b"payload");

        assert!(signer.public_key().verify_strict(b"payload", &signature).is_ok());
        assert!(signer.public_key().verify_strict(b"other", &signature).is_err());
    }

    #[test]
    fn debug_redacts_private_key() {
        let signer = EnvelopeSigner::from_seed([5u8; 32]);
        let rendered = format!("{signer:?}");

        assert!(rendered.contains("public_key"));
        assert!(!rendered.contains("signing"));
    }
}
