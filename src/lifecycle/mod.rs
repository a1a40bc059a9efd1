//! Process lifecycle: termination signals

mod shutdown;

pub use shutdown::{ShutdownKind, ShutdownSignal};
