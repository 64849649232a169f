//! Arbiter integration tests.
//!
//! Exercises the full register/ask/liberate/sweep protocol over a
//! manually advanced clock, including the signed-envelope surface a
//! client would actually verify.

use std::{
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use warden_core::{Arbiter, ArbiterError, SweepAction, Sweeper, SweeperConfig, env::Environment};
use warden_proto::ResourceLiberation;

/// Test environment with a manually advanced clock and deterministic
/// entropy (so the server key pair is stable across runs).
#[derive(Clone)]
struct ManualEnv {
    start: Instant,
    offset: Arc<Mutex<Duration>>,
}

impl ManualEnv {
    fn new() -> Self {
        Self { start: Instant::now(), offset: Arc::new(Mutex::new(Duration::ZERO)) }
    }

    fn advance(&self, by: Duration) {
        *self.offset.lock().unwrap() += by;
    }
}

impl Environment for ManualEnv {
    fn now(&self) -> Instant {
        self.start + *self.offset.lock().unwrap()
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        self.advance(duration);
        std::future::ready(())
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        for (index, byte) in buffer.iter_mut().enumerate() {
            *byte = (index as u8).wrapping_mul(31).wrapping_add(7);
        }
    }
}

fn world(resources: u32) -> (ManualEnv, Arbiter<ManualEnv>, Sweeper) {
    let env = ManualEnv::new();
    let arbiter = Arbiter::new(env.clone(), resources);
    let sweeper = Sweeper::new(SweeperConfig::default());

    (env, arbiter, sweeper)
}

fn open(arbiter: &Arbiter<ManualEnv>, envelope: &warden_proto::SignedEnvelope) -> ResourceLiberation {
    envelope.open(&arbiter.public_key()).expect("envelope must verify and decode")
}

/// The end-to-end scenario: pool of 2 resources, 3 clients.
#[test]
fn grant_queue_liberate_dispatch_scenario() {
    let (env, mut arbiter, sweeper) = world(2);

    let c0 = arbiter.register_client();
    let c1 = arbiter.register_client();
    let _c2 = arbiter.register_client();

    // Client 0 asks resource 0: granted, envelope carries the pubkey.
    let envelope = arbiter.ask_resource(c0, 0).unwrap();
    assert!(envelope.public_key.is_some());
    assert_eq!(open(&arbiter, &envelope), ResourceLiberation::granted(0));

    // Client 1 asks resource 0: queued; first-ever envelope to client 1
    // also carries the pubkey.
    let envelope = arbiter.ask_resource(c1, 0).unwrap();
    assert!(envelope.public_key.is_some());
    assert_eq!(open(&arbiter, &envelope), ResourceLiberation::queued(0));

    // Client 0 liberates: true, but no promotion yet.
    assert!(arbiter.liberate_resource(c0, 0).unwrap());
    let snapshot = arbiter.snapshot();
    assert!(snapshot.resources[0].is_free());
    assert_eq!(snapshot.resources[0].queue, vec![c1]);

    // Next sweep dispatch pass grants resource 0 to client 1 via push.
    let actions = sweeper.tick(&mut arbiter, env.now());
    assert_eq!(actions.len(), 1);
    match &actions[0] {
        SweepAction::DispatchGrant { pid, envelope } => {
            assert_eq!(*pid, c1);
            // Client 1 already saw the pubkey on the queued reply.
            assert!(envelope.public_key.is_none());
            assert_eq!(open(&arbiter, envelope), ResourceLiberation::granted(0));
        },
        other => panic!("expected DispatchGrant, got {other:?}"),
    }

    let snapshot = arbiter.snapshot();
    assert_eq!(snapshot.resources[0].owner, Some(c1));
    assert!(snapshot.resources[0].queue.is_empty());
}

#[test]
fn public_key_sent_exactly_once_per_client() {
    let (_env, mut arbiter, _sweeper) = world(1);
    let pid = arbiter.register_client();

    let first = arbiter.ask_resource(pid, 0).unwrap();
    assert!(first.public_key.is_some());

    let second = arbiter.ask_resource(pid, 0).unwrap();
    assert!(second.public_key.is_none());

    // Key presence has no bearing on verification.
    assert_eq!(open(&arbiter, &second), ResourceLiberation::granted(0));
}

#[test]
fn fifo_fairness_across_sweeps() {
    let (env, mut arbiter, sweeper) = world(1);

    let holder = arbiter.register_client();
    let first = arbiter.register_client();
    let second = arbiter.register_client();

    arbiter.ask_resource(holder, 0).unwrap();
    arbiter.ask_resource(first, 0).unwrap();
    arbiter.ask_resource(second, 0).unwrap();

    arbiter.liberate_resource(holder, 0).unwrap();
    let actions = sweeper.tick(&mut arbiter, env.now());
    assert!(
        matches!(&actions[..], [SweepAction::DispatchGrant { pid, .. }] if *pid == first),
        "first enqueued client must be granted first"
    );

    arbiter.liberate_resource(first, 0).unwrap();
    let actions = sweeper.tick(&mut arbiter, env.now());
    assert!(matches!(&actions[..], [SweepAction::DispatchGrant { pid, .. }] if *pid == second));
}

#[test]
fn timeout_eviction_frees_and_redispatches_in_one_tick() {
    let (env, mut arbiter, sweeper) = world(1);

    let holder = arbiter.register_client();
    let waiter = arbiter.register_client();

    arbiter.ask_resource(holder, 0).unwrap();
    arbiter.ask_resource(waiter, 0).unwrap();

    // No further client calls: the sweeper alone must reclaim.
    env.advance(Duration::from_secs(30));
    let actions = sweeper.tick(&mut arbiter, env.now());

    assert_eq!(actions.len(), 2);
    assert!(matches!(
        &actions[0],
        SweepAction::Evicted { resource: 0, former_owner, held_for }
            if *former_owner == holder && *held_for >= Duration::from_secs(30)
    ));
    assert!(matches!(&actions[1], SweepAction::DispatchGrant { pid, .. } if *pid == waiter));

    assert_eq!(arbiter.snapshot().resources[0].owner, Some(waiter));
}

#[test]
fn eviction_is_silent_toward_the_former_owner() {
    let (env, mut arbiter, sweeper) = world(1);
    let holder = arbiter.register_client();

    arbiter.ask_resource(holder, 0).unwrap();
    env.advance(Duration::from_secs(31));

    let actions = sweeper.tick(&mut arbiter, env.now());

    // Only the informational eviction action; nothing addressed to the
    // former owner.
    assert_eq!(actions.len(), 1);
    assert!(matches!(&actions[0], SweepAction::Evicted { .. }));

    // The former owner discovers the loss on its next call: the resource
    // is free again, so the re-ask is a fresh grant.
    let envelope = arbiter.ask_resource(holder, 0).unwrap();
    assert_eq!(open(&arbiter, &envelope), ResourceLiberation::granted(0));
}

#[test]
fn holder_under_timeout_is_left_alone() {
    let (env, mut arbiter, sweeper) = world(1);
    let holder = arbiter.register_client();

    arbiter.ask_resource(holder, 0).unwrap();
    env.advance(Duration::from_secs(29));

    assert!(sweeper.tick(&mut arbiter, env.now()).is_empty());
    assert_eq!(arbiter.snapshot().resources[0].owner, Some(holder));
}

#[test]
fn liberation_by_non_owner_is_refused_without_mutation() {
    let (_env, mut arbiter, _sweeper) = world(1);

    let owner = arbiter.register_client();
    let other = arbiter.register_client();

    arbiter.ask_resource(owner, 0).unwrap();

    assert!(!arbiter.liberate_resource(other, 0).unwrap());
    assert_eq!(arbiter.snapshot().resources[0].owner, Some(owner));

    // Liberating a free resource is refused the same way.
    assert!(arbiter.liberate_resource(owner, 0).unwrap());
    assert!(!arbiter.liberate_resource(owner, 0).unwrap());
}

#[test]
fn repeat_asks_do_not_grow_the_queue() {
    let (_env, mut arbiter, _sweeper) = world(1);

    let holder = arbiter.register_client();
    let waiter = arbiter.register_client();

    arbiter.ask_resource(holder, 0).unwrap();
    arbiter.ask_resource(waiter, 0).unwrap();
    arbiter.ask_resource(waiter, 0).unwrap();
    arbiter.ask_resource(waiter, 0).unwrap();

    assert_eq!(arbiter.snapshot().resources[0].queue, vec![waiter]);
}

#[test]
fn mutual_exclusion_holds_at_all_times() {
    let (env, mut arbiter, sweeper) = world(2);

    let pids: Vec<_> = (0..4).map(|_| arbiter.register_client()).collect();

    // Everyone hammers both resources, interleaved with sweeps.
    for round in 0..6 {
        for &pid in &pids {
            arbiter.ask_resource(pid, round % 2).unwrap();
        }

        env.advance(Duration::from_millis(500));
        sweeper.tick(&mut arbiter, env.now());

        for resource in arbiter.snapshot().resources {
            // At most one owner, and the owner is never queued behind
            // itself.
            if let Some(owner) = resource.owner {
                assert!(!resource.queue.contains(&owner));
            }
        }
    }
}

#[test]
fn out_of_range_resource_is_a_contract_violation() {
    let (_env, mut arbiter, _sweeper) = world(2);
    let pid = arbiter.register_client();

    assert!(matches!(
        arbiter.ask_resource(pid, 2),
        Err(ArbiterError::InvalidResource { resource: 2, pool_size: 2 })
    ));
    assert!(matches!(
        arbiter.liberate_resource(pid, 99),
        Err(ArbiterError::InvalidResource { .. })
    ));
}

#[test]
fn snapshot_reports_rounded_hold_times() {
    let (env, mut arbiter, _sweeper) = world(2);
    let pid = arbiter.register_client();

    arbiter.ask_resource(pid, 0).unwrap();
    env.advance(Duration::from_millis(1234));

    let snapshot = arbiter.snapshot();
    assert_eq!(snapshot.clients, 1);
    assert_eq!(snapshot.resources[0].held_for, Some(1.23));
    assert_eq!(snapshot.resources[1].held_for, None);
    assert!(snapshot.resources[1].is_free());
}

#[test]
fn idle_world_sweeps_to_nothing() {
    let (env, mut arbiter, sweeper) = world(3);
    arbiter.register_client();

    for _ in 0..5 {
        env.advance(Duration::from_millis(500));
        assert!(sweeper.tick(&mut arbiter, env.now()).is_empty());
    }
}
