//! Console narration of lane events

use colored::*;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use super::types::{EventKind, LaneEvent};

/// Render one event as a human-readable line
pub fn render(event: &LaneEvent) -> String {
    let who = format!("{} traveler {}", event.direction.bound(), event.traveler_id);
    match event.kind {
        EventKind::Blocked => format!("{} waiting...", who).yellow().to_string(),
        EventKind::Admitted => format!(
            "{} started crossing. [{} on bridge]",
            who.green(),
            event.occupants_after.to_string().cyan()
        ),
        EventKind::Released => format!(
            "{} finished crossing. [{} on bridge]",
            who,
            event.occupants_after.to_string().cyan()
        ),
        EventKind::Abandoned => format!("{} gave up waiting", who).red().to_string(),
        EventKind::Yielded => format!("{} lets {} go first", who, event.direction.opposite().bound().to_lowercase())
            .yellow()
            .to_string(),
    }
}

/// Print every event until the bus closes. Returns the number printed.
pub async fn narrate(mut rx: broadcast::Receiver<LaneEvent>) -> u64 {
    let mut printed = 0;
    loop {
        match rx.recv().await {
            Ok(event) => {
                println!("{}", render(&event));
                printed += 1;
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(missed = n, "narrate: lagged behind, missed events");
            }
            Err(broadcast::error::RecvError::Closed) => {
                debug!(printed, "narrate: channel closed");
                break;
            }
        }
    }
    printed
}
