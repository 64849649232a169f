//! Simulated environment.
//!
//! A deterministic [`Environment`]: the clock only moves when a test
//! advances it, and randomness comes from a seeded ChaCha8 stream. Given
//! the same seed and the same operation sequence, every run is
//! identical — record the seed in the failure message to reproduce.

use std::{
    sync::{Arc, Mutex, PoisonError},
    time::{Duration, Instant},
};

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use warden_core::env::Environment;

/// Deterministic environment for harness tests.
#[derive(Clone)]
pub struct SimEnv {
    start: Instant,
    clock: Arc<Mutex<Duration>>,
    rng: Arc<Mutex<ChaCha8Rng>>,
}

impl SimEnv {
    /// Create an environment whose RNG stream is derived from `seed`.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            start: Instant::now(),
            clock: Arc::new(Mutex::new(Duration::ZERO)),
            rng: Arc::new(Mutex::new(ChaCha8Rng::seed_from_u64(seed))),
        }
    }

    /// Move the virtual clock forward.
    pub fn advance(&self, by: Duration) {
        *lock(&self.clock) += by;
    }

    /// Virtual time elapsed since construction.
    pub fn elapsed(&self) -> Duration {
        *lock(&self.clock)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Environment for SimEnv {
    fn now(&self) -> Instant {
        self.start + *lock(&self.clock)
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        // Sleeping IS advancing in simulation.
        self.advance(duration);
        std::future::ready(())
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        lock(&self.rng).fill_bytes(buffer);
    }
}
