//! Listener registry
//!
//! Owns the key states, launches one monitor per key, and exposes the
//! runtime API: add/remove callbacks, held-state queries, and stop.

mod builder;
mod guard;
mod listener;

#[cfg(test)]
mod tests;

pub use builder::ListenerBuilder;
pub use guard::ListenerGuard;
pub(crate) use listener::Shared;
pub use listener::{ListenerRegistry, RegistryError};
