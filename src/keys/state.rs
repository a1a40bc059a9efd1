//! Per-key record shared between the registry and the key's monitor

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use super::code::KeyCode;
use crate::registry::ListenerRegistry;

type CallbackFn = dyn Fn(&ListenerRegistry, &KeyState) -> anyhow::Result<()> + Send + Sync;

/// A press or release handler.
///
/// Clones share identity: removing a callback from a key matches any clone
/// of the value that was registered.
#[derive(Clone)]
pub struct KeyCallback(Arc<CallbackFn>);

impl KeyCallback {
    /// Wrap a fallible handler. An `Err` counts as a callback fault.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&ListenerRegistry, &KeyState) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Wrap a handler that cannot report failure
    pub fn infallible<F>(f: F) -> Self
    where
        F: Fn(&ListenerRegistry, &KeyState) + Send + Sync + 'static,
    {
        Self::new(move |registry, key| {
            f(registry, key);
            Ok(())
        })
    }

    pub(crate) fn invoke(&self, registry: &ListenerRegistry, key: &KeyState) -> anyhow::Result<()> {
        (self.0)(registry, key)
    }

    /// Whether both values refer to the same registered handler
    pub fn same_as(&self, other: &KeyCallback) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.0), Arc::as_ptr(&other.0))
    }
}

impl PartialEq for KeyCallback {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

impl Eq for KeyCallback {}

impl fmt::Debug for KeyCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("KeyCallback")
            .field(&Arc::as_ptr(&self.0).cast::<()>())
            .finish()
    }
}

/// State of one monitored key
pub struct KeyState {
    code: KeyCode,
    name: Option<&'static str>,
    /// Written only by this key's monitor
    held: AtomicBool,
    on_press: Mutex<Vec<KeyCallback>>,
    on_release: Mutex<Vec<KeyCallback>>,
}

impl KeyState {
    pub(crate) fn new(
        code: KeyCode,
        name: Option<&'static str>,
        on_press: Option<KeyCallback>,
        on_release: Option<KeyCallback>,
    ) -> Self {
        Self {
            code,
            name,
            held: AtomicBool::new(false),
            on_press: Mutex::new(on_press.into_iter().collect()),
            on_release: Mutex::new(on_release.into_iter().collect()),
        }
    }

    pub fn code(&self) -> KeyCode {
        self.code
    }

    /// Symbolic name in the backend's key table
    pub fn name(&self) -> Option<&'static str> {
        self.name
    }

    /// Whether the most recent sample saw the key pressed
    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::Acquire)
    }

    pub(crate) fn set_held(&self, held: bool) {
        self.held.store(held, Ordering::Release);
    }

    /// Append callbacks; `None` leaves the corresponding list untouched
    pub(crate) fn add_callbacks(&self, on_press: Option<KeyCallback>, on_release: Option<KeyCallback>) {
        if let Some(cb) = on_press {
            self.on_press.lock().push(cb);
        }
        if let Some(cb) = on_release {
            self.on_release.lock().push(cb);
        }
    }

    pub(crate) fn clear_callbacks(&self) {
        self.on_press.lock().clear();
        self.on_release.lock().clear();
    }

    /// Remove one callback by identity, press list first.
    /// Returns false if neither list held it.
    pub(crate) fn remove_callback(&self, callback: &KeyCallback) -> bool {
        for list in [&self.on_press, &self.on_release] {
            let mut list = list.lock();
            if let Some(pos) = list.iter().position(|cb| cb.same_as(callback)) {
                list.remove(pos);
                return true;
            }
        }
        false
    }

    /// Snapshot of the press callbacks in registration order
    pub(crate) fn press_callbacks(&self) -> Vec<KeyCallback> {
        self.on_press.lock().clone()
    }

    /// Snapshot of the release callbacks in registration order
    pub(crate) fn release_callbacks(&self) -> Vec<KeyCallback> {
        self.on_release.lock().clone()
    }

    /// Number of (press, release) callbacks currently registered
    pub fn callback_counts(&self) -> (usize, usize) {
        (self.on_press.lock().len(), self.on_release.lock().len())
    }
}

impl fmt::Debug for KeyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (press, release) = self.callback_counts();
        f.debug_struct("KeyState")
            .field("code", &self.code)
            .field("name", &self.name())
            .field("held", &self.is_held())
            .field("on_press", &press)
            .field("on_release", &release)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> KeyCallback {
        KeyCallback::infallible(|_, _| {})
    }

    #[test]
    fn test_new_key_is_idle() {
        let key = KeyState::new(KeyCode(0x41), Some("a"), None, None);
        assert!(!key.is_held());
        assert_eq!(key.callback_counts(), (0, 0));
        assert_eq!(key.name(), Some("a"));
    }

    #[test]
    fn test_add_keeps_order() {
        let first = noop();
        let second = noop();
        let key = KeyState::new(KeyCode(0x41), None, Some(first.clone()), None);
        key.add_callbacks(Some(second.clone()), None);

        let press = key.press_callbacks();
        assert_eq!(press.len(), 2);
        assert!(press[0].same_as(&first));
        assert!(press[1].same_as(&second));
        assert!(key.release_callbacks().is_empty());
    }

    #[test]
    fn test_remove_by_identity() {
        let keep = noop();
        let drop_me = noop();
        let key = KeyState::new(KeyCode(0x42), None, Some(keep.clone()), Some(drop_me.clone()));
        key.add_callbacks(Some(drop_me.clone()), None);

        assert!(key.remove_callback(&drop_me));
        assert_eq!(key.callback_counts(), (1, 1));
        assert!(key.press_callbacks()[0].same_as(&keep));

        assert!(key.remove_callback(&drop_me));
        assert_eq!(key.callback_counts(), (1, 0));

        assert!(!key.remove_callback(&drop_me));
    }

    #[test]
    fn test_clear_callbacks() {
        let key = KeyState::new(KeyCode(0x43), None, Some(noop()), Some(noop()));
        key.clear_callbacks();
        assert_eq!(key.callback_counts(), (0, 0));
    }

    #[test]
    fn test_distinct_callbacks_are_not_equal() {
        let a = noop();
        let b = noop();
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }
}
