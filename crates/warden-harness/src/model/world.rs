//! Model world - the reference arbiter.
//!
//! Implements the protocol semantics directly over vectors and queues
//! with a millisecond clock. Deliberately naive: no signing, no
//! environment, no actions — just the state transitions the real
//! implementation must agree with.

use std::collections::VecDeque;

use warden_proto::{ClientId, ResourceId};

use super::operation::{Operation, OperationResult};

/// Observable state for oracle comparison.
///
/// The subset of world state a test can extract from both the model and
/// the real arbiter (via its snapshot).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservableState {
    /// Owner per resource, in id order.
    pub owners: Vec<Option<ClientId>>,
    /// Queue contents per resource, head first.
    pub queues: Vec<Vec<ClientId>>,
}

/// The reference implementation.
#[derive(Debug, Clone)]
pub struct ModelWorld {
    max_hold_ms: u64,
    now_ms: u64,
    registered: ClientId,
    owners: Vec<Option<ClientId>>,
    acquired_at_ms: Vec<Option<u64>>,
    queues: Vec<VecDeque<ClientId>>,
}

impl ModelWorld {
    /// Create a world with `resources` free slots and the given hold
    /// timeout.
    pub fn new(resources: u32, max_hold_ms: u64) -> Self {
        let n = resources as usize;

        Self {
            max_hold_ms,
            now_ms: 0,
            registered: 0,
            owners: vec![None; n],
            acquired_at_ms: vec![None; n],
            queues: vec![VecDeque::new(); n],
        }
    }

    /// Number of resources in the pool.
    pub fn resources(&self) -> u32 {
        self.owners.len() as u32
    }

    /// Apply an operation and return the comparable result.
    pub fn apply(&mut self, op: &Operation) -> OperationResult {
        match op {
            Operation::Register => {
                let pid = self.registered;
                self.registered += 1;
                OperationResult::Registered(pid)
            },

            Operation::Ask { client, resource } => self.apply_ask(*client as ClientId, *resource),

            Operation::Liberate { client, resource } => {
                self.apply_liberate(*client as ClientId, *resource)
            },

            Operation::AdvanceTime { millis } => {
                self.now_ms += u64::from(*millis);
                OperationResult::TimeAdvanced
            },

            Operation::Sweep => self.apply_sweep(),
        }
    }

    /// Extract observable state for comparison.
    pub fn observable_state(&self) -> ObservableState {
        ObservableState {
            owners: self.owners.clone(),
            queues: self.queues.iter().map(|q| q.iter().copied().collect()).collect(),
        }
    }

    fn index(&self, resource: u8) -> Option<usize> {
        let index = resource as usize;
        (index < self.owners.len()).then_some(index)
    }

    fn grant(&mut self, index: usize, pid: ClientId) {
        self.queues[index].retain(|queued| *queued != pid);
        self.owners[index] = Some(pid);
        self.acquired_at_ms[index] = Some(self.now_ms);
    }

    fn apply_ask(&mut self, pid: ClientId, resource: u8) -> OperationResult {
        let Some(index) = self.index(resource) else {
            return OperationResult::Invalid;
        };

        match self.owners[index] {
            None => {
                self.grant(index, pid);
                OperationResult::Asked { granted: true }
            },
            Some(owner) if owner == pid => OperationResult::Asked { granted: true },
            Some(_) => {
                if !self.queues[index].contains(&pid) {
                    self.queues[index].push_back(pid);
                }
                OperationResult::Asked { granted: false }
            },
        }
    }

    fn apply_liberate(&mut self, pid: ClientId, resource: u8) -> OperationResult {
        let Some(index) = self.index(resource) else {
            return OperationResult::Invalid;
        };

        if self.owners[index] != Some(pid) {
            return OperationResult::Liberated { accepted: false };
        }

        self.owners[index] = None;
        self.acquired_at_ms[index] = None;
        OperationResult::Liberated { accepted: true }
    }

    fn apply_sweep(&mut self) -> OperationResult {
        let mut evictions = Vec::new();
        let mut grants = Vec::new();

        // Timeout pass, completed before any dispatch.
        for index in 0..self.owners.len() {
            let (Some(owner), Some(acquired_at)) = (self.owners[index], self.acquired_at_ms[index])
            else {
                continue;
            };

            if self.now_ms.saturating_sub(acquired_at) >= self.max_hold_ms {
                self.owners[index] = None;
                self.acquired_at_ms[index] = None;
                evictions.push((index as ResourceId, owner));
            }
        }

        // Dispatch pass.
        for index in 0..self.owners.len() {
            if self.owners[index].is_some() {
                continue;
            }

            if let Some(pid) = self.queues[index].pop_front() {
                self.grant(index, pid);
                grants.push((index as ResourceId, pid));
            }
        }

        OperationResult::Swept { evictions, grants }
    }

    /// Panic if any protocol invariant is violated.
    pub fn assert_invariants(&self) {
        for (index, owner) in self.owners.iter().enumerate() {
            assert_eq!(
                owner.is_none(),
                self.acquired_at_ms[index].is_none(),
                "resource {index}: owner and acquisition time must be set together"
            );

            let mut seen = std::collections::HashSet::new();
            for pid in &self.queues[index] {
                assert!(seen.insert(*pid), "resource {index}: pid {pid} queued twice");
                assert_ne!(Some(*pid), *owner, "resource {index}: owner queued behind itself");
            }
        }
    }
}
