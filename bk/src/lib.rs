//! bridgekeeper - single-lane bridge coordination
//!
//! A lane that many travelers may cross at once, provided they all head the
//! same way. The [`LaneCoordinator`] admits travelers with two operations,
//! `enter` and `exit`, batching same-direction travelers for throughput while
//! a streak cap keeps either direction from starving the other.
//!
//! # Modules
//!
//! - [`lane`] - the coordinator, its state and admission predicate
//! - [`events`] - ordered event stream, JSONL log and replay verification
//! - [`sim`] - traveler population runner used by the `bk` binary
//! - [`config`] - configuration types and loading
//! - [`cli`] - command-line interface
//!
//! # Example
//!
//! ```ignore
//! use bridgekeeper::{LaneConfig, LaneCoordinator, Traveler};
//!
//! let lane = LaneCoordinator::new(LaneConfig::default())?;
//! let admission = lane.enter(Traveler::north(0)).await;
//! // ... cross ...
//! lane.exit(admission.traveler);
//! ```

pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod events;
pub mod lane;
pub mod sim;

/// Default streak cap
pub const DEFAULT_MAX_STREAK: u32 = 3;

/// Default travelers launched per direction
pub const DEFAULT_TRAVELERS_PER_DIRECTION: u32 = 10;

// Re-export commonly used types
pub use config::Config;
pub use domain::{Direction, PerDirection, Traveler, TravelerId};
pub use error::LaneError;
pub use events::{EventBus, EventKind, EventLogger, LaneEvent, Report, Violation, read_events, verify};
pub use lane::{Admission, LaneConfig, LaneCoordinator, LaneSnapshot, LaneStats};
pub use sim::{RangeConfig, RunSummary, Simulation, SimulationConfig};
