//! Per-key monitors
//!
//! Each monitored key gets its own thread that samples the key's physical
//! state and drives an Idle/Held state machine, firing callbacks on edges.

mod machine;
mod runner;

use std::time::Duration;

pub use machine::{KeyPhase, Transition};
pub(crate) use runner::KeyMonitor;

/// Default delay between two samples of the same key
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2);
