//! Integration tests for the lane coordinator
//!
//! These drive the coordinator with concurrent travelers and check the
//! crossing rules both on live snapshots and by replaying the event stream.

use std::sync::Arc;
use std::time::Duration;

use bridgekeeper::events::drain_pending;
use bridgekeeper::{
    Admission, Direction, EventKind, LaneConfig, LaneCoordinator, LaneSnapshot, PerDirection, RangeConfig,
    Simulation, SimulationConfig, Traveler, verify,
};
use tokio::sync::watch;
use tokio::task::JoinHandle;

fn lane(max_streak: u32) -> Arc<LaneCoordinator> {
    Arc::new(LaneCoordinator::new(LaneConfig::with_max_streak(max_streak)).expect("valid config"))
}

/// Poll until the lane reaches a state matching `pred`
async fn wait_for_state(lane: &LaneCoordinator, pred: impl Fn(&LaneSnapshot) -> bool) -> LaneSnapshot {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let snapshot = lane.snapshot();
            if pred(&snapshot) {
                return snapshot;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .expect("lane never reached the expected state")
}

/// A traveler that enters, then stays on the lane until its gate opens
fn gated_traveler(
    lane: &Arc<LaneCoordinator>,
    traveler: Traveler,
    mut gate: watch::Receiver<bool>,
) -> JoinHandle<Admission> {
    let lane = Arc::clone(lane);
    tokio::spawn(async move {
        let admission = lane.enter(traveler).await;
        gate.wait_for(|open| *open).await.expect("gate sender dropped");
        lane.exit(traveler);
        admission
    })
}

fn admitted_order(events: &[bridgekeeper::LaneEvent]) -> Vec<Traveler> {
    events
        .iter()
        .filter(|e| e.kind == EventKind::Admitted)
        .map(|e| e.traveler())
        .collect()
}

// =============================================================================
// Streak cap
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_streak_cap_forces_handoff() {
    let lane = lane(3);
    let mut rx = lane.subscribe();
    let (north_gate, north_rx) = watch::channel(false);
    let (south_gate, south_rx) = watch::channel(false);

    // First northbound traveler takes the lane
    let n0 = gated_traveler(&lane, Traveler::north(0), north_rx.clone());
    wait_for_state(&lane, |s| s.occupants[Direction::North] == 1).await;

    // Southbound waits behind it
    let s0 = gated_traveler(&lane, Traveler::south(0), south_rx.clone());
    wait_for_state(&lane, |s| s.waiting[Direction::South] == 1).await;

    // Five more northbound: two fit in the streak, three are held back
    let mut north: Vec<_> = (1..=5)
        .map(|id| gated_traveler(&lane, Traveler::north(id), north_rx.clone()))
        .collect();
    let snapshot = wait_for_state(&lane, |s| s.waiting[Direction::North] == 3).await;
    assert_eq!(snapshot.occupants[Direction::North], 3);
    assert_eq!(snapshot.occupants[Direction::South], 0);
    assert_eq!(snapshot.streak, 3);
    assert_eq!(snapshot.turn, Direction::North);

    // Northbound batch leaves: southbound goes next even with northbound queued
    north_gate.send(true).unwrap();
    let snapshot = wait_for_state(&lane, |s| s.occupants[Direction::South] == 1).await;
    assert_eq!(snapshot.occupants[Direction::North], 0);
    assert_eq!(snapshot.waiting[Direction::North], 3);
    assert_eq!(snapshot.turn, Direction::South);

    south_gate.send(true).unwrap();
    assert!(s0.await.unwrap().waited);
    assert!(!n0.await.unwrap().waited);
    let mut waited = 0;
    for handle in north.drain(..) {
        if handle.await.unwrap().waited {
            waited += 1;
        }
    }
    assert_eq!(waited, 3);
    assert!(lane.snapshot().is_idle());

    let events = drain_pending(&mut rx);
    let order = admitted_order(&events);
    assert_eq!(order.len(), 7);
    assert!(order[..3].iter().all(|t| t.direction == Direction::North));
    assert_eq!(order[3], Traveler::south(0));
    assert!(order[4..].iter().all(|t| t.direction == Direction::North));

    let report = verify(&events, 3);
    assert!(report.is_clean(), "{:?}", report.violations);
    assert_eq!(report.longest_contended_streak, 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_cap_not_enforced_without_opposite_waiter() {
    let lane = lane(2);
    let (gate, gate_rx) = watch::channel(false);

    let handles: Vec<_> = (0..6)
        .map(|id| gated_traveler(&lane, Traveler::north(id), gate_rx.clone()))
        .collect();
    let snapshot = wait_for_state(&lane, |s| s.occupants[Direction::North] == 6).await;
    assert_eq!(snapshot.streak, 6);
    assert_eq!(snapshot.waiting, PerDirection::new(0, 0));

    gate.send(true).unwrap();
    for handle in handles {
        assert!(!handle.await.unwrap().waited);
    }
    assert!(lane.snapshot().is_idle());
}

// =============================================================================
// Mutual exclusion
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_opposite_entries_admit_exactly_one() {
    for _ in 0..20 {
        let lane = lane(3);
        let (gate, gate_rx) = watch::channel(false);

        let north = gated_traveler(&lane, Traveler::north(0), gate_rx.clone());
        let south = gated_traveler(&lane, Traveler::south(0), gate_rx.clone());

        let snapshot = wait_for_state(&lane, |s| {
            s.occupants.north + s.occupants.south == 1 && s.waiting.north + s.waiting.south == 1
        })
        .await;
        let admitted = if snapshot.occupants.north == 1 {
            Direction::North
        } else {
            Direction::South
        };
        assert_eq!(snapshot.occupants[admitted.opposite()], 0);
        assert_eq!(snapshot.waiting[admitted.opposite()], 1);
        assert_eq!(snapshot.waiting[admitted], 0);

        gate.send(true).unwrap();
        let (north, south) = (north.await.unwrap(), south.await.unwrap());
        assert_ne!(north.waited, south.waited);
        assert!(lane.snapshot().is_idle());
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_strict_alternation_with_cap_of_one() {
    let lane = lane(1);
    let mut rx = lane.subscribe();
    let (gate, gate_rx) = watch::channel(false);

    let n0 = gated_traveler(&lane, Traveler::north(0), gate_rx.clone());
    wait_for_state(&lane, |s| s.occupants[Direction::North] == 1).await;

    // Southbound queue first, so the northbound streak is already capped
    let mut handles: Vec<_> = (0..3)
        .map(|id| gated_traveler(&lane, Traveler::south(id), gate_rx.clone()))
        .collect();
    wait_for_state(&lane, |s| s.waiting.south == 3).await;
    handles.extend((1..=3).map(|id| gated_traveler(&lane, Traveler::north(id), gate_rx.clone())));
    wait_for_state(&lane, |s| s.waiting.north == 3).await;

    gate.send(true).unwrap();
    n0.await.unwrap();
    for handle in handles {
        handle.await.unwrap();
    }
    assert!(lane.snapshot().is_idle());

    let events = drain_pending(&mut rx);
    let report = verify(&events, 1);
    assert!(report.is_clean(), "{:?}", report.violations);
    assert_eq!(report.longest_contended_streak, 1);
}

// =============================================================================
// Full populations
// =============================================================================

fn fast_simulation(travelers: u32, seed: u64) -> SimulationConfig {
    SimulationConfig {
        travelers_per_direction: travelers,
        crossing_units: RangeConfig::new(1, 3),
        time_unit_ms: 3,
        stagger_ms: RangeConfig::new(0, 2),
        seed: Some(seed),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_interleaved_population_replays_clean() {
    for (max_streak, seed) in [(3, 1), (1, 2), (2, 3), (5, 4)] {
        let sim = Simulation::new(LaneConfig::with_max_streak(max_streak), fast_simulation(10, seed)).unwrap();
        let mut rx = sim.subscribe();

        let summary = sim.run().await.unwrap();
        assert!(summary.final_state.is_idle());
        assert_eq!(summary.stats.total_admitted, PerDirection::new(10, 10));
        assert_eq!(summary.stats.total_released, PerDirection::new(10, 10));

        let events = drain_pending(&mut rx);
        let report = verify(&events, max_streak);
        assert!(report.is_clean(), "cap {}: {:?}", max_streak, report.violations);
        assert_eq!(report.admitted, PerDirection::new(10, 10));

        let released = events.iter().filter(|e| e.kind == EventKind::Released).count();
        assert_eq!(released, 20);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_bursty_population_without_stagger() {
    let config = SimulationConfig {
        stagger_ms: RangeConfig::new(0, 0),
        ..fast_simulation(25, 11)
    };
    let sim = Simulation::new(LaneConfig::default(), config).unwrap();
    let mut rx = sim.subscribe();

    let summary = sim.run().await.unwrap();
    assert!(summary.final_state.is_idle());

    let report = verify(&drain_pending(&mut rx), 3);
    assert!(report.is_clean(), "{:?}", report.violations);
    assert_eq!(report.admitted, PerDirection::new(25, 25));
}
