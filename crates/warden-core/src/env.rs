//! Environment abstraction for deterministic testing.
//!
//! The `Environment` trait decouples arbiter logic from system resources
//! (time, randomness, sleeping). This enables:
//!
//! - Deterministic testing: a harness clock can be advanced manually, so
//!   timeout eviction and sweep pacing are exactly reproducible.
//!
//! - Production runtime: the server's implementation uses real system
//!   time and OS entropy without any change to the arbiter logic.
//!
//! # Invariants
//!
//! - Monotonicity: `env.now()` must never go backwards
//! - Isolation: implementations must not share global state

use std::time::{Duration, Instant};

/// Abstract environment providing time, randomness, and async sleeping.
///
/// # Safety
///
/// Implementations MUST guarantee:
///
/// 1. Time monotonicity: `now()` never goes backwards
/// 2. RNG quality: `random_bytes()` uses cryptographically secure entropy
///    in production (the server signing key is seeded from it)
pub trait Environment: Clone + Send + Sync + 'static {
    /// Returns the current time.
    ///
    /// # Invariants
    ///
    /// - Monotonicity: subsequent calls must return times >= previous
    ///   calls within a single execution context.
    fn now(&self) -> Instant;

    /// Sleeps for the specified duration.
    ///
    /// This is the ONLY async method in the trait; only driver code (the
    /// sweep loop) should use it, never arbiter logic.
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;

    /// Fills the provided buffer with random bytes.
    ///
    /// # Security
    ///
    /// Production implementations MUST use OS entropy
    /// (`getrandom`), not a userspace PRNG: the bytes seed the server's
    /// Ed25519 signing key. Simulation implementations use a seeded RNG
    /// and MUST log the seed for reproducibility.
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Generates a random `u64`.
    ///
    /// Convenience for connection ids and similar driver-side needs.
    fn random_u64(&self) -> u64 {
        let mut bytes = [0u8; 8];
        self.random_bytes(&mut bytes);
        u64::from_be_bytes(bytes)
    }
}
