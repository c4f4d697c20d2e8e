//! Error types

use thiserror::Error;

use crate::domain::{Direction, TravelerId};

/// Errors surfaced by bridgekeeper
///
/// `enter` and `exit` never fail; everything here is either setup or a
/// traveler that could not run to completion. Both are fatal for a run.
#[derive(Debug, Error)]
pub enum LaneError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("{direction} traveler {id} did not complete: {source}")]
    Traveler {
        id: TravelerId,
        direction: Direction,
        #[source]
        source: tokio::task::JoinError,
    },

    #[error("Event log I/O error: {0}")]
    EventLog(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LaneError {
    /// Check if this error happened before any traveler started
    pub fn is_setup(&self) -> bool {
        matches!(self, LaneError::InvalidConfig(_) | LaneError::EventLog(_))
    }
}

pub type Result<T> = std::result::Result<T, LaneError>;
