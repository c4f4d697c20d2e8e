//! Replay verification of a lane event stream
//!
//! Rebuilds the lane counters, the turn and the streak from the ordered events
//! and checks that the recorded run respected mutual exclusion, turn order, the
//! streak cap and exact accounting, and that every traveler finished.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use tracing::debug;

use super::types::{EventKind, LaneEvent};
use crate::domain::{Direction, PerDirection, Traveler};

/// A rule broken by the recorded run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "violation", rename_all = "kebab-case")]
pub enum Violation {
    OutOfOrder {
        seq: u64,
        previous: u64,
    },
    BothDirections {
        seq: u64,
        north: u32,
        south: u32,
    },
    OccupantMismatch {
        seq: u64,
        direction: Direction,
        recorded: u32,
        replayed: u32,
    },
    UnexpectedTransition {
        seq: u64,
        traveler: Traveler,
        kind: EventKind,
    },
    StreakExceeded {
        seq: u64,
        direction: Direction,
        streak: u32,
        max_streak: u32,
    },
    OutOfTurn {
        seq: u64,
        traveler: Traveler,
    },
    IllegalYield {
        seq: u64,
        traveler: Traveler,
    },
    Unfinished {
        traveler: Traveler,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::OutOfOrder { seq, previous } => {
                write!(f, "event {} follows event {}", seq, previous)
            }
            Violation::BothDirections { seq, north, south } => {
                write!(f, "event {}: {} northbound and {} southbound on the lane", seq, north, south)
            }
            Violation::OccupantMismatch {
                seq,
                direction,
                recorded,
                replayed,
            } => write!(
                f,
                "event {}: recorded {} {} occupants, replay has {}",
                seq, recorded, direction, replayed
            ),
            Violation::UnexpectedTransition { seq, traveler, kind } => {
                write!(f, "event {}: {} cannot be {} in its current phase", seq, traveler, kind.as_str())
            }
            Violation::StreakExceeded {
                seq,
                direction,
                streak,
                max_streak,
            } => write!(
                f,
                "event {}: {} {} admissions while the other side waited (cap {})",
                seq, streak, direction, max_streak
            ),
            Violation::OutOfTurn { seq, traveler } => write!(
                f,
                "event {}: {} admitted while the other side held the turn",
                seq, traveler
            ),
            Violation::IllegalYield { seq, traveler } => write!(
                f,
                "event {}: {} yielded the turn without being capped on an empty lane",
                seq, traveler
            ),
            Violation::Unfinished { traveler } => write!(f, "{} never finished", traveler),
        }
    }
}

/// Outcome of replaying a run
#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    pub events: usize,
    pub admitted: PerDirection<u64>,
    pub peak_occupancy: PerDirection<u32>,
    /// Highest streak reached by an admission made while the other side waited
    pub longest_contended_streak: u32,
    pub violations: Vec<Violation>,
}

impl Report {
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Waiting,
    Crossing,
}

/// Replay `events` (in stream order) against a lane with `max_streak`
pub fn verify(events: &[LaneEvent], max_streak: u32) -> Report {
    debug!(count = events.len(), max_streak, "verify: called");
    let mut report = Report {
        events: events.len(),
        ..Default::default()
    };

    let mut phases: HashMap<Traveler, Phase> = HashMap::new();
    let mut occupants: PerDirection<u32> = PerDirection::default();
    let mut waiting: PerDirection<u32> = PerDirection::default();
    // Turn and streak as the coordinator keeps them: north starts, empty streak
    let mut turn = Direction::North;
    let mut streak: u32 = 0;
    let mut previous: Option<u64> = None;

    for event in events {
        let seq = event.seq;
        let traveler = event.traveler();
        let d = event.direction;

        if let Some(prev) = previous {
            if seq <= prev {
                report.violations.push(Violation::OutOfOrder { seq, previous: prev });
            }
        }
        previous = Some(seq);

        let phase = phases.get(&traveler).copied();
        let unexpected = Violation::UnexpectedTransition {
            seq,
            traveler,
            kind: event.kind,
        };

        match event.kind {
            EventKind::Blocked => {
                if phase.is_some() {
                    report.violations.push(unexpected);
                    continue;
                }
                phases.insert(traveler, Phase::Waiting);
                waiting[d] += 1;
            }
            EventKind::Admitted => {
                match phase {
                    Some(Phase::Crossing) => {
                        report.violations.push(unexpected);
                        continue;
                    }
                    Some(Phase::Waiting) => waiting[d] -= 1,
                    None => {}
                }
                phases.insert(traveler, Phase::Crossing);
                occupants[d] += 1;
                report.admitted[d] += 1;
                report.peak_occupancy[d] = report.peak_occupancy[d].max(occupants[d]);

                let opposite_waiting = waiting[d.opposite()] > 0;
                if turn == d.opposite() && opposite_waiting {
                    report.violations.push(Violation::OutOfTurn { seq, traveler });
                }
                if turn == d {
                    streak += 1;
                } else {
                    turn = d;
                    streak = 1;
                }
                if opposite_waiting {
                    report.longest_contended_streak = report.longest_contended_streak.max(streak);
                    if streak > max_streak {
                        report.violations.push(Violation::StreakExceeded {
                            seq,
                            direction: d,
                            streak,
                            max_streak,
                        });
                    }
                }
            }
            EventKind::Released => {
                if phase != Some(Phase::Crossing) {
                    report.violations.push(unexpected);
                    continue;
                }
                phases.remove(&traveler);
                occupants[d] -= 1;
                // Last one off hands the turn to a waiting opposite side
                if occupants[d] == 0 && waiting[d.opposite()] > 0 {
                    turn = d.opposite();
                    streak = 0;
                }
            }
            EventKind::Abandoned => {
                if phase != Some(Phase::Waiting) {
                    report.violations.push(unexpected);
                    continue;
                }
                phases.remove(&traveler);
                waiting[d] -= 1;
            }
            EventKind::Yielded => {
                if phase != Some(Phase::Waiting) {
                    report.violations.push(unexpected);
                    continue;
                }
                let lane_empty = occupants.north == 0 && occupants.south == 0;
                let capped = turn == d && streak >= max_streak && waiting[d.opposite()] > 0;
                if !(lane_empty && capped) {
                    report.violations.push(Violation::IllegalYield { seq, traveler });
                }
                turn = d.opposite();
                streak = 0;
            }
        }

        if occupants[d] != event.occupants_after {
            report.violations.push(Violation::OccupantMismatch {
                seq,
                direction: d,
                recorded: event.occupants_after,
                replayed: occupants[d],
            });
        }
        if occupants.north > 0 && occupants.south > 0 {
            report.violations.push(Violation::BothDirections {
                seq,
                north: occupants.north,
                south: occupants.south,
            });
        }
    }

    let mut unfinished: Vec<Traveler> = phases.into_keys().collect();
    unfinished.sort_by_key(|t| (t.direction == Direction::South, t.id));
    report
        .violations
        .extend(unfinished.into_iter().map(|traveler| Violation::Unfinished { traveler }));

    debug!(violations = report.violations.len(), "verify: done");
    report
}
