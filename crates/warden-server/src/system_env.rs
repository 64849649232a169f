//! Production Environment implementation.
//!
//! `SystemEnv` backs the arbiter with real system time and OS entropy.

use std::time::{Duration, Instant};

use warden_core::env::Environment;

/// Production environment: system clock, tokio sleeping, OS entropy.
///
/// # Security
///
/// `random_bytes` uses `getrandom` (OS entropy pool). The server signing
/// key is seeded from it, so a userspace PRNG would not be acceptable
/// here.
#[derive(Clone, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        getrandom::fill(buffer).unwrap_or_else(|e| {
            // Entropy exhaustion should be impossible on supported
            // platforms; zero-filling avoids a panic but must be loud.
            tracing::error!("getrandom failed: {}", e);
            buffer.fill(0);
        });
    }
}
