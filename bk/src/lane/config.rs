//! Lane coordinator configuration

use serde::{Deserialize, Serialize};

use crate::error::{LaneError, Result};

/// Lane coordinator configuration
///
/// `max_streak` trades throughput for fairness: a larger cap lets bigger
/// same-direction batches through before a waiting opposite direction gets its
/// turn, a cap of 1 degrades to strict alternation under contention. The cap is
/// only enforced while the opposite direction actually has a waiter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaneConfig {
    /// Max consecutive admissions of one direction while the other waits
    #[serde(rename = "max-streak")]
    pub max_streak: u32,
}

impl Default for LaneConfig {
    fn default() -> Self {
        Self {
            max_streak: crate::DEFAULT_MAX_STREAK,
        }
    }
}

impl LaneConfig {
    pub fn with_max_streak(max_streak: u32) -> Self {
        Self { max_streak }
    }

    /// Reject a streak cap of zero, which would block every contended entry
    pub fn validate(&self) -> Result<()> {
        if self.max_streak == 0 {
            return Err(LaneError::InvalidConfig("max-streak must be a positive integer".to_string()));
        }
        Ok(())
    }
}
