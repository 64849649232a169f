//! Differential fuzz target for the arbiter state machine
//!
//! Applies arbitrary operation sequences to the real arbiter and the
//! reference model in lockstep.
//!
//! # Invariants
//!
//! - Observable state (owners, queues) identical after every operation
//! - Model invariants hold after every operation: at most one owner,
//!   no duplicate queue entries, owner never queued behind itself
//! - The real arbiter NEVER panics, whatever the sequence

#![no_main]

use std::time::Duration;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use warden_core::{Arbiter, Sweeper, SweeperConfig, env::Environment};
use warden_harness::{ModelWorld, Operation, SimEnv};

const RESOURCES: u32 = 3;
const MAX_HOLD_MS: u64 = 10_000;

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    seed: u64,
    ops: Vec<Operation>,
}

fuzz_target!(|input: FuzzInput| {
    let env = SimEnv::with_seed(input.seed);
    let mut arbiter = Arbiter::new(env.clone(), RESOURCES);
    let sweeper = Sweeper::new(SweeperConfig {
        max_hold: Duration::from_millis(MAX_HOLD_MS),
        interval: Duration::from_millis(500),
    });

    let mut model = ModelWorld::new(RESOURCES, MAX_HOLD_MS);

    for op in &input.ops {
        let _ = model.apply(op);

        match op {
            Operation::Register => {
                arbiter.register_client();
            },
            Operation::Ask { client, resource } => {
                let _ = arbiter.ask_resource(u64::from(*client), u32::from(*resource));
            },
            Operation::Liberate { client, resource } => {
                let _ = arbiter.liberate_resource(u64::from(*client), u32::from(*resource));
            },
            Operation::AdvanceTime { millis } => {
                env.advance(Duration::from_millis(u64::from(*millis)));
            },
            Operation::Sweep => {
                let _ = sweeper.tick(&mut arbiter, env.now());
            },
        }

        model.assert_invariants();

        let snapshot = arbiter.snapshot();
        let state = model.observable_state();

        for (index, resource) in snapshot.resources.iter().enumerate() {
            assert_eq!(
                resource.owner, state.owners[index],
                "owner divergence on resource {index} after {op:?}"
            );
            assert_eq!(
                resource.queue, state.queues[index],
                "queue divergence on resource {index} after {op:?}"
            );
        }
    }
});
