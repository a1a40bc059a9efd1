//! In-process keyboard
//!
//! Injected events change the state that monitors sample, so a tap on a
//! watched key goes through the same detection path as a physical press.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::{Mutex, RwLock};
use tracing::trace;

use super::{BackendError, KeyInjector, KeyStateSource};
use crate::keys::KeyCode;

/// One recorded key-down or key-up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InjectedEvent {
    pub code: KeyCode,
    pub down: bool,
    pub at: Instant,
}

/// Shared, cloneable virtual keyboard
#[derive(Debug, Clone, Default)]
pub struct VirtualKeyboard {
    pressed: Arc<RwLock<HashSet<KeyCode>>>,
    history: Arc<Mutex<Vec<InjectedEvent>>>,
}

impl VirtualKeyboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold a key down
    pub fn press(&self, code: KeyCode) {
        self.set(code, true);
    }

    /// Let a key go
    pub fn release(&self, code: KeyCode) {
        self.set(code, false);
    }

    /// Currently pressed keys, sorted
    pub fn pressed_keys(&self) -> Vec<KeyCode> {
        let mut keys: Vec<_> = self.pressed.read().iter().copied().collect();
        keys.sort();
        keys
    }

    /// Every event injected so far, oldest first
    pub fn history(&self) -> Vec<InjectedEvent> {
        self.history.lock().clone()
    }

    fn set(&self, code: KeyCode, down: bool) {
        {
            let mut pressed = self.pressed.write();
            if down {
                pressed.insert(code);
            } else {
                pressed.remove(&code);
            }
        }
        trace!(%code, down, "virtual key event");
        self.history.lock().push(InjectedEvent {
            code,
            down,
            at: Instant::now(),
        });
    }
}

impl KeyStateSource for VirtualKeyboard {
    fn is_pressed(&self, code: KeyCode) -> bool {
        self.pressed.read().contains(&code)
    }
}

impl KeyInjector for VirtualKeyboard {
    fn key_down(&self, code: KeyCode) -> Result<(), BackendError> {
        self.press(code);
        Ok(())
    }

    fn key_up(&self, code: KeyCode) -> Result<(), BackendError> {
        self.release(code);
        Ok(())
    }
}
