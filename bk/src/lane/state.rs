//! Lane state: counters, the admission predicate and hand-off decisions
//!
//! Everything here is plain data mutated under the coordinator's lock. Keeping
//! it free of synchronization lets the predicate be tested exhaustively.

use serde::{Deserialize, Serialize};

use crate::domain::{Direction, PerDirection};

/// Why an entry attempt was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refusal {
    /// Travelers are crossing the other way
    OppositeOccupied,

    /// The other direction holds the turn and has travelers waiting for it
    OppositeTurn,

    /// This direction used up its streak while the other direction waits
    StreakCap,
}

/// Outcome of a traveler leaving the lane
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Release {
    /// Occupants left in the leaving traveler's direction
    pub occupants_after: u32,

    /// Direction whose waiters must all be woken, if any
    pub wake: Option<Direction>,

    /// Whether the turn passed to the opposite direction
    pub handed_off: bool,
}

/// Statistics for the lane
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaneStats {
    pub total_admitted: PerDirection<u64>,
    pub total_released: PerDirection<u64>,
    pub total_blocked: PerDirection<u64>,
    pub total_abandoned: PerDirection<u64>,
    pub handoffs: u64,
    pub forced_yields: u64,
    pub peak_occupancy: PerDirection<u32>,
    pub longest_streak: u32,
}

/// Point-in-time copy of the lane counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaneSnapshot {
    pub occupants: PerDirection<u32>,
    pub waiting: PerDirection<u32>,
    pub turn: Direction,
    pub streak: u32,
}

impl LaneSnapshot {
    /// Nobody crossing and nobody waiting
    pub fn is_idle(&self) -> bool {
        Direction::ALL
            .iter()
            .all(|&d| self.occupants[d] == 0 && self.waiting[d] == 0)
    }
}

/// Shared lane state, owned by the coordinator
#[derive(Debug, Clone)]
pub struct LaneState {
    max_streak: u32,
    occupants: PerDirection<u32>,
    waiting: PerDirection<u32>,
    turn: Direction,
    streak: u32,
    sequence: u64,
    stats: LaneStats,
}

impl LaneState {
    /// Idle lane, north holding the turn with an empty streak
    pub fn new(max_streak: u32) -> Self {
        Self {
            max_streak,
            occupants: PerDirection::default(),
            waiting: PerDirection::default(),
            turn: Direction::North,
            streak: 0,
            sequence: 0,
            stats: LaneStats::default(),
        }
    }

    pub fn max_streak(&self) -> u32 {
        self.max_streak
    }

    pub fn occupants(&self, direction: Direction) -> u32 {
        self.occupants[direction]
    }

    pub fn waiting(&self, direction: Direction) -> u32 {
        self.waiting[direction]
    }

    pub fn turn(&self) -> Direction {
        self.turn
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn stats(&self) -> &LaneStats {
        &self.stats
    }

    pub fn snapshot(&self) -> LaneSnapshot {
        LaneSnapshot {
            occupants: self.occupants,
            waiting: self.waiting,
            turn: self.turn,
            streak: self.streak,
        }
    }

    /// Hand out the next event sequence number
    pub fn next_sequence(&mut self) -> u64 {
        self.sequence += 1;
        self.sequence
    }

    /// Evaluate the admission predicate for `direction`
    pub fn check(&self, direction: Direction) -> Result<(), Refusal> {
        let opposite = direction.opposite();
        let opposite_waiting = self.waiting[opposite] > 0;

        if self.occupants[opposite] > 0 {
            return Err(Refusal::OppositeOccupied);
        }
        if self.turn == opposite && opposite_waiting {
            return Err(Refusal::OppositeTurn);
        }
        if self.turn == direction && self.streak >= self.max_streak && opposite_waiting {
            return Err(Refusal::StreakCap);
        }
        Ok(())
    }

    pub fn can_admit(&self, direction: Direction) -> bool {
        self.check(direction).is_ok()
    }

    /// Admit one traveler; the caller has already checked the predicate.
    /// Returns the occupant count for `direction` after admission.
    pub fn admit(&mut self, direction: Direction) -> u32 {
        debug_assert!(self.can_admit(direction));

        self.occupants[direction] += 1;
        if self.turn == direction {
            self.streak += 1;
        } else {
            self.turn = direction;
            self.streak = 1;
        }

        let occupants = self.occupants[direction];
        self.stats.total_admitted[direction] += 1;
        self.stats.peak_occupancy[direction] = self.stats.peak_occupancy[direction].max(occupants);
        self.stats.longest_streak = self.stats.longest_streak.max(self.streak);
        occupants
    }

    /// Count a traveler that starts waiting
    pub fn begin_wait(&mut self, direction: Direction) {
        self.waiting[direction] += 1;
        self.stats.total_blocked[direction] += 1;
    }

    /// Stop counting a waiter, either because it is being admitted or because
    /// it gave up
    pub fn end_wait(&mut self, direction: Direction) {
        debug_assert!(self.waiting[direction] > 0);
        self.waiting[direction] = self.waiting[direction].saturating_sub(1);
    }

    /// Record a waiter that left without being admitted
    pub fn abandon(&mut self, direction: Direction) {
        self.end_wait(direction);
        self.stats.total_abandoned[direction] += 1;
    }

    /// One traveler leaves; decide which waiters, if any, must be woken
    pub fn release(&mut self, direction: Direction) -> Release {
        debug_assert!(self.occupants[direction] > 0);
        self.occupants[direction] = self.occupants[direction].saturating_sub(1);
        self.stats.total_released[direction] += 1;

        let occupants_after = self.occupants[direction];
        if occupants_after > 0 {
            return Release {
                occupants_after,
                wake: None,
                handed_off: false,
            };
        }

        let opposite = direction.opposite();
        if self.waiting[opposite] > 0 {
            self.hand_off(opposite);
            Release {
                occupants_after,
                wake: Some(opposite),
                handed_off: true,
            }
        } else if self.waiting[direction] > 0 {
            Release {
                occupants_after,
                wake: Some(direction),
                handed_off: false,
            }
        } else {
            Release {
                occupants_after,
                wake: None,
                handed_off: false,
            }
        }
    }

    /// A `direction` waiter refused only by the streak cap on a completely
    /// empty lane gives the turn away itself, since no exit is coming to do it.
    /// Returns true if the turn moved to the opposite direction.
    pub fn yield_turn(&mut self, direction: Direction) -> bool {
        let opposite = direction.opposite();
        let lane_empty = self.occupants[direction] == 0 && self.occupants[opposite] == 0;
        if self.check(direction) != Err(Refusal::StreakCap) || !lane_empty {
            return false;
        }

        self.hand_off(opposite);
        self.stats.forced_yields += 1;
        true
    }

    fn hand_off(&mut self, to: Direction) {
        self.turn = to;
        self.streak = 0;
        self.stats.handoffs += 1;
    }
}
