//! Resource ownership table.
//!
//! The authoritative map of resource → (owner, acquisition time, wait
//! queue). All mutation of ownership state funnels through this type;
//! the arbiter and the sweeper are its only callers.
//!
//! # Invariants
//!
//! - `owner == None ⇒ acquired_at == None`
//! - a pid appears in a wait queue at most once
//! - the current owner never appears in its own wait queue

use std::{
    collections::VecDeque,
    time::{Duration, Instant},
};

use warden_proto::{ClientId, ResourceId};

use crate::error::ArbiterError;

/// Result of an acquisition attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireOutcome {
    /// Caller now owns the resource (or already did).
    Granted,
    /// Resource is held by someone else; caller is queued.
    Queued,
}

#[derive(Debug, Default)]
struct Slot {
    owner: Option<ClientId>,
    acquired_at: Option<Instant>,
    queue: VecDeque<ClientId>,
}

impl Slot {
    /// Make `pid` the owner. Dropping the pid from the queue first keeps
    /// the owner-never-queued invariant when a queued client re-asks a
    /// freed resource before the dispatch pass reaches it.
    fn grant(&mut self, pid: ClientId, now: Instant) {
        self.queue.retain(|queued| *queued != pid);
        self.owner = Some(pid);
        self.acquired_at = Some(now);
    }

    fn release(&mut self) -> Option<ClientId> {
        self.acquired_at = None;
        self.owner.take()
    }
}

/// Fixed pool of lockable resources.
#[derive(Debug, Default)]
pub struct ResourceTable {
    slots: Vec<Slot>,
}

impl ResourceTable {
    /// Create a pool of `resources` free slots.
    pub fn new(resources: u32) -> Self {
        Self { slots: (0..resources).map(|_| Slot::default()).collect() }
    }

    /// Size of the pool.
    pub fn resources(&self) -> u32 {
        self.slots.len() as u32
    }

    fn slot_mut(&mut self, resource: ResourceId) -> Result<&mut Slot, ArbiterError> {
        let pool_size = self.resources();
        self.slots
            .get_mut(resource as usize)
            .ok_or(ArbiterError::InvalidResource { resource, pool_size })
    }

    /// Attempt to acquire `resource` for `pid`.
    ///
    /// Free → grant. Already owned by `pid` → grant idempotently with no
    /// state change (the hold timer is NOT reset). Held by someone else →
    /// append `pid` to the wait queue unless already present.
    ///
    /// # Errors
    ///
    /// Returns `ArbiterError::InvalidResource` for an out-of-range id.
    pub fn try_acquire(
        &mut self,
        resource: ResourceId,
        pid: ClientId,
        now: Instant,
    ) -> Result<AcquireOutcome, ArbiterError> {
        let slot = self.slot_mut(resource)?;

        match slot.owner {
            None => {
                slot.grant(pid, now);
                Ok(AcquireOutcome::Granted)
            },
            Some(owner) if owner == pid => Ok(AcquireOutcome::Granted),
            Some(_) => {
                if !slot.queue.contains(&pid) {
                    slot.queue.push_back(pid);
                }
                Ok(AcquireOutcome::Queued)
            },
        }
    }

    /// Voluntarily release `resource`.
    ///
    /// Succeeds (clears ownership, returns true) only when `pid` is the
    /// current owner; otherwise no mutation and false. Never promotes the
    /// queue: promotion happens exclusively in the sweep dispatch pass,
    /// so grant latency is bounded by the sweep interval by design.
    ///
    /// # Errors
    ///
    /// Returns `ArbiterError::InvalidResource` for an out-of-range id.
    pub fn liberate(&mut self, resource: ResourceId, pid: ClientId) -> Result<bool, ArbiterError> {
        let slot = self.slot_mut(resource)?;

        if slot.owner != Some(pid) {
            return Ok(false);
        }

        slot.release();
        Ok(true)
    }

    /// Resources whose holder has exceeded `max_hold` as of `now`.
    pub fn timed_out(&self, now: Instant, max_hold: Duration) -> Vec<ResourceId> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| {
                let acquired_at = slot.acquired_at?;
                (now.saturating_duration_since(acquired_at) >= max_hold)
                    .then_some(index as ResourceId)
            })
            .collect()
    }

    /// Unconditionally clear ownership of `resource`, returning the
    /// former owner. Sweeper-only; out-of-range ids are a no-op.
    pub fn force_release(&mut self, resource: ResourceId) -> Option<ClientId> {
        self.slots.get_mut(resource as usize)?.release()
    }

    /// Pop the head of the wait queue iff `resource` is currently free.
    ///
    /// The sole queue-promotion entry point.
    pub fn pop_next_queued(&mut self, resource: ResourceId) -> Option<ClientId> {
        let slot = self.slots.get_mut(resource as usize)?;

        if slot.owner.is_some() {
            return None;
        }

        slot.queue.pop_front()
    }

    /// Assign ownership of a free resource as part of a queue-promotion
    /// grant. Callers must have just popped `pid` via
    /// [`Self::pop_next_queued`].
    pub(crate) fn grant(&mut self, resource: ResourceId, pid: ClientId, now: Instant) {
        if let Some(slot) = self.slots.get_mut(resource as usize) {
            slot.grant(pid, now);
        }
    }

    /// Seconds the resource has been held as of `now`, rounded to two
    /// decimal places; `None` when free.
    pub fn elapsed_since(&self, resource: ResourceId, now: Instant) -> Option<f64> {
        self.held_duration(resource, now)
            .map(|held| (held.as_secs_f64() * 100.0).round() / 100.0)
    }

    /// Raw hold duration as of `now`; `None` when free.
    pub(crate) fn held_duration(&self, resource: ResourceId, now: Instant) -> Option<Duration> {
        let acquired_at = self.slots.get(resource as usize)?.acquired_at?;
        Some(now.saturating_duration_since(acquired_at))
    }

    /// Current owner of `resource`, if any.
    pub fn owner(&self, resource: ResourceId) -> Option<ClientId> {
        self.slots.get(resource as usize)?.owner
    }

    /// Wait queue contents of `resource`, head first.
    pub fn queued(&self, resource: ResourceId) -> Vec<ClientId> {
        self.slots
            .get(resource as usize)
            .map(|slot| slot.queue.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Whether `resource` is a valid id in this pool.
    pub fn contains(&self, resource: ResourceId) -> bool {
        (resource as usize) < self.slots.len()
    }

    #[cfg(test)]
    fn assert_invariants(&self) {
        for (index, slot) in self.slots.iter().enumerate() {
            assert_eq!(
                slot.owner.is_none(),
                slot.acquired_at.is_none(),
                "resource {index}: owner and acquired_at must be set together"
            );

            let mut seen = std::collections::HashSet::new();
            for pid in &slot.queue {
                assert!(seen.insert(*pid), "resource {index}: pid {pid} queued twice");
                assert_ne!(Some(*pid), slot.owner, "resource {index}: owner {pid} in own queue");
            }
        }
    }
}
