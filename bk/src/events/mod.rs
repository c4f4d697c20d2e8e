//! Lane event stream
//!
//! Every state transition of a traveler is emitted by the coordinator, under
//! the lane lock, onto a broadcast bus. Consumers subscribe independently:
//!
//! ```text
//!                 LaneCoordinator (enter / exit)
//!                            │ emit
//!                            ▼
//!                   ┌─────────────────┐
//!                   │    EventBus     │
//!                   └─────────────────┘
//!                    │        │       │
//!                    ▼        ▼       ▼
//!              narrator   EventLogger  tests
//!              (stdout)    (.jsonl)   (replay)
//! ```
//!
//! A recorded stream can be checked after the fact with [`verify`].

mod bus;
mod console;
mod logger;
mod replay;
mod types;

pub use bus::{DEFAULT_CHANNEL_CAPACITY, EventBus, drain_pending};
pub use console::{narrate, render};
pub use logger::{EventLogger, read_events};
pub use replay::{Report, Violation, verify};
pub use types::{EventKind, LaneEvent};
