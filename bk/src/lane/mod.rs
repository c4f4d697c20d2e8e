//! Lane coordinator
//!
//! Admits travelers onto a single shared lane: same-direction travelers batch
//! together, opposite directions never overlap, and a streak cap bounds how
//! long one direction can keep the lane while the other waits.

mod config;
mod core;
mod state;

pub use config::LaneConfig;
pub use core::{Admission, LaneCoordinator};
pub use state::{LaneSnapshot, LaneState, LaneStats, Refusal, Release};
