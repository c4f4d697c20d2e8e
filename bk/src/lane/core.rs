//! Lane coordinator implementation

use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::{Notify, broadcast};
use tracing::{debug, info};

use crate::domain::{PerDirection, Traveler};
use crate::error::Result;
use crate::events::{EventBus, EventKind, LaneEvent};

use super::config::LaneConfig;
use super::state::{LaneSnapshot, LaneState, LaneStats, Refusal};

/// Result of a successful `enter`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    pub traveler: Traveler,
    /// Occupants crossing in the traveler's direction, including itself
    pub occupants: u32,
    /// Whether the traveler had to wait before being admitted
    pub waited: bool,
}

/// The LaneCoordinator admits travelers onto a single shared lane.
///
/// Travelers heading the same way may cross together; the two directions
/// never share the lane. Under contention a direction gets at most
/// `max_streak` consecutive admissions before the turn passes over.
///
/// All state sits behind one lock. Waiters park on a per-direction `Notify`,
/// so waking one direction never disturbs the other.
pub struct LaneCoordinator {
    config: LaneConfig,
    state: Mutex<LaneState>,
    wake: PerDirection<Notify>,
    events: EventBus,
}

impl LaneCoordinator {
    /// Create a new coordinator with the given configuration
    pub fn new(config: LaneConfig) -> Result<Self> {
        Self::with_event_bus(config, EventBus::with_default_capacity())
    }

    /// Create a coordinator that emits onto the given bus
    pub fn with_event_bus(config: LaneConfig, events: EventBus) -> Result<Self> {
        debug!(?config, "LaneCoordinator::new: called");
        config.validate()?;
        Ok(Self {
            state: Mutex::new(LaneState::new(config.max_streak)),
            config,
            wake: PerDirection::from_fn(|_| Notify::new()),
            events,
        })
    }

    pub fn config(&self) -> &LaneConfig {
        &self.config
    }

    /// Subscribe to the ordered event stream
    pub fn subscribe(&self) -> broadcast::Receiver<LaneEvent> {
        self.events.subscribe()
    }

    /// Wait until `traveler` may enter the lane, then admit it.
    ///
    /// Never fails. Dropping the returned future while it waits removes the
    /// traveler from the waiting count.
    pub async fn enter(&self, traveler: Traveler) -> Admission {
        let direction = traveler.direction;
        debug!(%traveler, "LaneCoordinator::enter: called");
        let mut waiting: Option<WaitingGuard<'_>> = None;

        loop {
            // Register for wakeups before looking at the state so a release
            // between the check and the await is not missed
            let notified = self.wake[direction].notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let mut yielded = false;
            {
                let mut state = self.lock_state();
                match state.check(direction) {
                    Ok(()) => {
                        let waited = waiting.is_some();
                        if let Some(guard) = waiting.take() {
                            guard.admitted(&mut state);
                        }
                        let occupants = state.admit(direction);
                        self.emit(&mut state, traveler, EventKind::Admitted, occupants);
                        debug!(%traveler, occupants, streak = state.streak(), "LaneCoordinator::enter: admitted");
                        return Admission {
                            traveler,
                            occupants,
                            waited,
                        };
                    }
                    Err(refusal) => {
                        debug!(%traveler, ?refusal, "LaneCoordinator::enter: refused");
                        if waiting.is_none() {
                            state.begin_wait(direction);
                            let occupants = state.occupants(direction);
                            self.emit(&mut state, traveler, EventKind::Blocked, occupants);
                            waiting = Some(WaitingGuard::new(self, traveler));
                        }
                        if refusal == Refusal::StreakCap && state.yield_turn(direction) {
                            info!(%traveler, "Streak cap hit on an empty lane, yielding turn");
                            self.emit(&mut state, traveler, EventKind::Yielded, 0);
                            yielded = true;
                        }
                    }
                }
            }

            if yielded {
                self.wake[direction.opposite()].notify_waiters();
            }
            notified.await;
            debug!(%traveler, "LaneCoordinator::enter: woken, re-checking");
        }
    }

    /// Take `traveler` off the lane. Returns the occupants left in its direction.
    ///
    /// When the direction empties, the turn passes to the opposite direction if
    /// it has waiters (all of them are woken); otherwise remaining waiters of the
    /// same direction are woken to keep the streak going.
    pub fn exit(&self, traveler: Traveler) -> u32 {
        let direction = traveler.direction;
        debug!(%traveler, "LaneCoordinator::exit: called");

        let release = {
            let mut state = self.lock_state();
            let release = state.release(direction);
            self.emit(&mut state, traveler, EventKind::Released, release.occupants_after);
            release
        };

        if release.handed_off {
            debug!(%traveler, to = %direction.opposite(), "LaneCoordinator::exit: handing off turn");
        }
        if let Some(target) = release.wake {
            debug!(%traveler, %target, "LaneCoordinator::exit: waking waiters");
            self.wake[target].notify_waiters();
        }
        release.occupants_after
    }

    /// Get a copy of the current counters
    pub fn snapshot(&self) -> LaneSnapshot {
        self.lock_state().snapshot()
    }

    /// Get the lane statistics
    pub fn stats(&self) -> LaneStats {
        self.lock_state().stats().clone()
    }

    fn lock_state(&self) -> MutexGuard<'_, LaneState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, state: &mut LaneState, traveler: Traveler, kind: EventKind, occupants_after: u32) {
        let seq = state.next_sequence();
        self.events.emit(LaneEvent::new(seq, traveler, kind, occupants_after));
    }

    fn abandon(&self, traveler: Traveler) {
        let direction = traveler.direction;
        {
            let mut state = self.lock_state();
            state.abandon(direction);
            let occupants = state.occupants(direction);
            self.emit(&mut state, traveler, EventKind::Abandoned, occupants);
        }
        info!(%traveler, "Traveler gave up waiting");
        // One fewer waiter can only unblock the other direction
        self.wake[direction.opposite()].notify_waiters();
    }
}

/// Counts a traveler as waiting for as long as the guard lives.
///
/// Admission disarms it under the lane lock; any other way out of `enter`
/// (the future being dropped) decrements the count in `Drop`.
struct WaitingGuard<'a> {
    coordinator: &'a LaneCoordinator,
    traveler: Traveler,
    armed: bool,
}

impl<'a> WaitingGuard<'a> {
    fn new(coordinator: &'a LaneCoordinator, traveler: Traveler) -> Self {
        Self {
            coordinator,
            traveler,
            armed: true,
        }
    }

    fn admitted(mut self, state: &mut LaneState) {
        state.end_wait(self.traveler.direction);
        self.armed = false;
    }
}

impl Drop for WaitingGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.coordinator.abandon(self.traveler);
        }
    }
}
