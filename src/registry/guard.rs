//! Owning handle returned when a registry starts

use std::fmt;
use std::ops::Deref;

use super::listener::ListenerRegistry;

/// Keeps a started registry running.
///
/// Dereferences to the [`ListenerRegistry`] it started. Dropping the guard
/// stops the registry and releases every registered callback, so monitors
/// exit even when callbacks captured registry clones. Those clones stay
/// usable but only observe a stopped registry.
#[must_use = "dropping the guard stops listening"]
pub struct ListenerGuard {
    registry: ListenerRegistry,
}

impl ListenerGuard {
    pub(crate) fn new(registry: ListenerRegistry) -> Self {
        Self { registry }
    }

    /// A non-owning handle to the guarded registry
    pub fn registry(&self) -> ListenerRegistry {
        self.registry.clone()
    }
}

impl Deref for ListenerGuard {
    type Target = ListenerRegistry;

    fn deref(&self) -> &ListenerRegistry {
        &self.registry
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        self.registry.release();
    }
}

impl fmt::Debug for ListenerGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ListenerGuard").field(&self.registry).finish()
    }
}
