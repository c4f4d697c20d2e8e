//! Simulation runner: launches travelers against one coordinator

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::domain::{Direction, PerDirection, Traveler};
use crate::error::{LaneError, Result};
use crate::events::LaneEvent;
use crate::lane::{LaneConfig, LaneCoordinator, LaneSnapshot, LaneStats};

use super::config::SimulationConfig;
use super::jitter::Jitter;

/// Result of a completed run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub travelers: PerDirection<u32>,
    pub waited: PerDirection<u32>,
    pub stats: LaneStats,
    pub final_state: LaneSnapshot,
    pub elapsed: Duration,
}

/// Launch order alternating north and south; once one side runs out the
/// other continues alone
pub fn launch_order(north: u32, south: u32) -> Vec<Traveler> {
    let len = north as usize + south as usize;
    let mut order = Vec::with_capacity(len);
    let mut next = PerDirection::new(0, 0);
    let total = PerDirection::new(north, south);

    for i in 0..len {
        let direction = if (i % 2 == 0 && next.north < total.north) || next.south >= total.south {
            Direction::North
        } else {
            Direction::South
        };
        order.push(Traveler::new(next[direction], direction));
        next[direction] += 1;
    }
    order
}

/// A bridge simulation: one coordinator, a population of travelers
pub struct Simulation {
    config: SimulationConfig,
    coordinator: Arc<LaneCoordinator>,
    jitter: Arc<Jitter>,
}

impl Simulation {
    /// Validate the configuration and set up the coordinator
    pub fn new(lane: LaneConfig, config: SimulationConfig) -> Result<Self> {
        debug!(?lane, ?config, "Simulation::new: called");
        config.validate()?;
        let coordinator = Arc::new(LaneCoordinator::new(lane)?);
        Ok(Self {
            jitter: Arc::new(Jitter::new(config.seed)),
            config,
            coordinator,
        })
    }

    /// Subscribe to lane events; call before `run`
    pub fn subscribe(&self) -> broadcast::Receiver<LaneEvent> {
        self.coordinator.subscribe()
    }

    /// Run `travelers_per_direction` travelers each way to completion.
    ///
    /// Consumes the simulation; once it returns the event bus is closed and
    /// subscribers see the end of the stream.
    pub async fn run(self) -> Result<RunSummary> {
        let n = self.config.travelers_per_direction;
        self.run_population(n, n).await
    }

    /// Run an explicit population to completion
    pub async fn run_population(self, north: u32, south: u32) -> Result<RunSummary> {
        if north.checked_add(south).is_none() {
            return Err(LaneError::InvalidConfig(format!(
                "population of {} northbound and {} southbound travelers is too large",
                north, south
            )));
        }
        let order = launch_order(north, south);
        info!(north, south, max_streak = self.coordinator.config().max_streak, "Starting simulation");
        let started = Instant::now();

        let mut handles: Vec<(Traveler, JoinHandle<bool>)> = Vec::with_capacity(order.len());
        for (i, traveler) in order.iter().copied().enumerate() {
            handles.push((traveler, self.spawn_traveler(traveler)));
            if i + 1 < order.len() {
                let stagger = self.jitter.between(self.config.stagger_ms);
                tokio::time::sleep(Duration::from_millis(stagger)).await;
            }
        }

        let mut waited = PerDirection::new(0, 0);
        for (traveler, handle) in handles {
            let had_to_wait = handle.await.map_err(|source| LaneError::Traveler {
                id: traveler.id,
                direction: traveler.direction,
                source,
            })?;
            if had_to_wait {
                waited[traveler.direction] += 1;
            }
        }

        let summary = RunSummary {
            travelers: PerDirection::new(north, south),
            waited,
            stats: self.coordinator.stats(),
            final_state: self.coordinator.snapshot(),
            elapsed: started.elapsed(),
        };
        info!(
            elapsed_ms = summary.elapsed.as_millis() as u64,
            handoffs = summary.stats.handoffs,
            "Simulation finished"
        );
        Ok(summary)
    }

    fn spawn_traveler(&self, traveler: Traveler) -> JoinHandle<bool> {
        let coordinator = Arc::clone(&self.coordinator);
        let jitter = Arc::clone(&self.jitter);
        let config = self.config.clone();

        tokio::spawn(async move {
            let admission = coordinator.enter(traveler).await;
            let units = jitter.between(config.crossing_units);
            debug!(%traveler, units, "traveler: crossing");
            tokio::time::sleep(config.units(units)).await;
            coordinator.exit(traveler);
            admission.waited
        })
    }
}
