//! Simulation configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{LaneError, Result};

/// Inclusive integer range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeConfig {
    pub min: u64,
    pub max: u64,
}

impl RangeConfig {
    pub fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    fn validate(&self, name: &str) -> Result<()> {
        if self.min > self.max {
            return Err(LaneError::InvalidConfig(format!(
                "{} range is inverted: min {} > max {}",
                name, self.min, self.max
            )));
        }
        Ok(())
    }
}

/// Simulation configuration: how many travelers, how long they take
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Travelers launched per direction
    #[serde(rename = "travelers-per-direction")]
    pub travelers_per_direction: u32,

    /// Crossing duration bounds, in time units
    #[serde(rename = "crossing-units")]
    pub crossing_units: RangeConfig,

    /// Length of one time unit in milliseconds
    #[serde(rename = "time-unit-ms")]
    pub time_unit_ms: u64,

    /// Delay between traveler launches in milliseconds
    #[serde(rename = "stagger-ms")]
    pub stagger_ms: RangeConfig,

    /// Seed for the duration sampler; random when unset
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            travelers_per_direction: crate::DEFAULT_TRAVELERS_PER_DIRECTION,
            crossing_units: RangeConfig::new(1, 3),
            time_unit_ms: 1000,
            stagger_ms: RangeConfig::new(50, 150),
            seed: None,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.travelers_per_direction.checked_mul(2).is_none() {
            return Err(LaneError::InvalidConfig(format!(
                "travelers-per-direction {} is too large for a two-way population",
                self.travelers_per_direction
            )));
        }
        self.crossing_units.validate("crossing-units")?;
        self.stagger_ms.validate("stagger-ms")?;
        Ok(())
    }

    /// Wall-clock length of `units` time units
    pub fn units(&self, units: u64) -> Duration {
        Duration::from_millis(units.saturating_mul(self.time_unit_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SimulationConfig::default();
        assert_eq!(config.travelers_per_direction, 10);
        assert_eq!(config.crossing_units, RangeConfig::new(1, 3));
        assert_eq!(config.stagger_ms, RangeConfig::new(50, 150));
        assert_eq!(config.units(2), Duration::from_secs(2));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_inverted_range_rejected() {
        let config = SimulationConfig {
            stagger_ms: RangeConfig::new(10, 5),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("stagger-ms"));
    }

    #[test]
    fn test_oversized_population_rejected() {
        let config = SimulationConfig {
            travelers_per_direction: 3_000_000_000,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("travelers-per-direction"));
    }

    #[test]
    fn test_partial_yaml() {
        let config: SimulationConfig = serde_yaml::from_str("travelers-per-direction: 4\nseed: 9").unwrap();
        assert_eq!(config.travelers_per_direction, 4);
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.time_unit_ms, 1000);
    }
}
