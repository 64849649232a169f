//! Periodic sweep: timeout eviction and queue-promotion dispatch.
//!
//! The sweeper is the arbiter's liveness mechanism. Each tick runs two
//! passes over the whole pool, the first completing before the second
//! begins:
//!
//! 1. Timeout pass — every resource held longer than `max_hold` is
//!    force-released. Eviction is silent: the former owner is never
//!    notified and discovers the loss only on its next call.
//! 2. Dispatch pass — every resource that is free with a non-empty queue
//!    grants to the head of the queue. Ownership is assigned before the
//!    grant envelope is handed to the driver, which pushes it
//!    fire-and-forget.
//!
//! Promotion happens ONLY here, never inline in liberation, so grant
//! latency is bounded by the sweep interval.

use std::time::{Duration, Instant};

use warden_proto::{ClientId, ResourceId, SignedEnvelope};

use crate::{arbiter::Arbiter, env::Environment};

/// Sweep timing configuration.
#[derive(Debug, Clone, Copy)]
pub struct SweeperConfig {
    /// Maximum time a single client may hold a resource.
    pub max_hold: Duration,
    /// Cadence of the periodic tick.
    pub interval: Duration,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self { max_hold: Duration::from_secs(30), interval: Duration::from_millis(500) }
    }
}

/// Actions produced by one sweep tick, for the driver to execute.
#[derive(Debug, Clone)]
pub enum SweepAction {
    /// A holder exceeded the hold timeout and was force-released.
    ///
    /// Purely informational: eviction is silent toward the former owner;
    /// this action only feeds the operator log.
    Evicted {
        /// Resource that was reclaimed.
        resource: ResourceId,
        /// Pid that was holding it.
        former_owner: ClientId,
        /// How long it had been held.
        held_for: Duration,
    },

    /// The head of a wait queue was granted a freed resource.
    ///
    /// The envelope is identical to what an ask reply would carry; the
    /// driver pushes it to `pid` without awaiting acknowledgment.
    DispatchGrant {
        /// Recipient of the grant.
        pid: ClientId,
        /// Signed grant payload.
        envelope: SignedEnvelope,
    },
}

/// The periodic sweep process.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sweeper {
    config: SweeperConfig,
}

impl Sweeper {
    /// Create a sweeper with the given timing configuration.
    pub fn new(config: SweeperConfig) -> Self {
        Self { config }
    }

    /// Tick cadence for the driver's sleep loop.
    pub fn interval(&self) -> Duration {
        self.config.interval
    }

    /// Configured hold timeout.
    pub fn max_hold(&self) -> Duration {
        self.config.max_hold
    }

    /// Run one tick against the arbiter at time `now`.
    ///
    /// Infallible by construction: an envelope that fails to build is
    /// logged and skipped rather than aborting the tick, since the next
    /// tick re-evaluates the same queues anyway.
    pub fn tick<E>(&self, arbiter: &mut Arbiter<E>, now: Instant) -> Vec<SweepAction>
    where
        E: Environment,
    {
        let mut actions = Vec::new();

        // Timeout pass. Runs to completion before any dispatch so a
        // resource evicted this tick can be re-granted this tick.
        for resource in arbiter.table().timed_out(now, self.config.max_hold) {
            let held_for = arbiter.table().held_duration(resource, now).unwrap_or_default();

            if let Some(former_owner) = arbiter.table_mut().force_release(resource) {
                tracing::debug!(resource, former_owner, ?held_for, "evicted timed-out holder");
                actions.push(SweepAction::Evicted { resource, former_owner, held_for });
            }
        }

        // Dispatch pass.
        for resource in 0..arbiter.table().resources() {
            let Some(pid) = arbiter.table_mut().pop_next_queued(resource) else {
                continue;
            };

            // Ownership transfers as part of the grant, before the push.
            arbiter.table_mut().grant(resource, pid, now);

            match arbiter.grant_envelope(pid, resource) {
                Ok(envelope) => {
                    tracing::debug!(resource, pid, "dispatching queued grant");
                    actions.push(SweepAction::DispatchGrant { pid, envelope });
                },
                Err(error) => {
                    tracing::error!(resource, pid, %error, "failed to build grant envelope");
                },
            }
        }

        actions
    }
}
