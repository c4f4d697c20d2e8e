//! Lane event types
//!
//! One event per observable transition of a traveler: it started waiting, it
//! was admitted, it left the lane, or (only when its task was aborted) it gave
//! up waiting. A waiter that hands the turn over on an empty lane records a
//! `Yielded` event and keeps waiting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Direction, Traveler, TravelerId};

/// What happened to the traveler
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Blocked,
    Admitted,
    Released,
    Abandoned,
    Yielded,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Blocked => "blocked",
            EventKind::Admitted => "admitted",
            EventKind::Released => "released",
            EventKind::Abandoned => "abandoned",
            EventKind::Yielded => "yielded",
        }
    }
}

/// A single entry of the ordered lane event stream
///
/// `seq` is assigned under the lane lock, so ordering by `seq` is the order in
/// which the transitions actually took effect.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaneEvent {
    pub seq: u64,
    #[serde(rename = "ts")]
    pub timestamp: DateTime<Utc>,
    pub traveler_id: TravelerId,
    pub direction: Direction,
    pub kind: EventKind,
    /// Occupants crossing in `direction` right after this event
    pub occupants_after: u32,
}

impl LaneEvent {
    /// Create an event stamped with the current time
    pub fn new(seq: u64, traveler: Traveler, kind: EventKind, occupants_after: u32) -> Self {
        Self {
            seq,
            timestamp: Utc::now(),
            traveler_id: traveler.id,
            direction: traveler.direction,
            kind,
            occupants_after,
        }
    }

    pub fn traveler(&self) -> Traveler {
        Traveler::new(self.traveler_id, self.direction)
    }
}
