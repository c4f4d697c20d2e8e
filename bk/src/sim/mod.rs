//! Bridge simulation
//!
//! Drives a coordinator with a population of travelers the way an external
//! caller would: launch them staggered and interleaved, let each cross for a
//! random duration, join them all.

mod config;
mod jitter;
mod runner;

pub use config::{RangeConfig, SimulationConfig};
pub use jitter::Jitter;
pub use runner::{RunSummary, Simulation, launch_order};
