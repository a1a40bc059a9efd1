//! Boundary traits for reading physical key state and injecting key events
//!
//! The monitoring core only ever sees [`KeyStateSource`]; the synthesizer
//! only sees [`KeyInjector`]. [`VirtualKeyboard`] implements both in-process.
//!
//! Each backend reports the [`KeyCodeTable`] of its native code space. Name
//! lookups, default key sets and typed text all resolve through it.

mod virtual_kbd;

#[cfg(target_os = "macos")]
mod macos;

#[cfg(windows)]
mod windows;

pub use virtual_kbd::{InjectedEvent, VirtualKeyboard};

#[cfg(target_os = "macos")]
pub use macos::CoreGraphicsKeyboard;

#[cfg(windows)]
pub use windows::Win32Keyboard;

use std::sync::Arc;

use crate::keys::{KeyCode, KeyCodeTable};

/// Point-in-time physical key state
pub trait KeyStateSource: Send + Sync {
    /// Whether `code` is pressed right now
    fn is_pressed(&self, code: KeyCode) -> bool;

    /// Names for the codes this source understands
    fn key_table(&self) -> KeyCodeTable {
        KeyCodeTable::STANDARD
    }
}

/// Synthetic key event generation
pub trait KeyInjector: Send + Sync {
    fn key_down(&self, code: KeyCode) -> Result<(), BackendError>;

    fn key_up(&self, code: KeyCode) -> Result<(), BackendError>;

    /// Names for the codes this injector understands
    fn key_table(&self) -> KeyCodeTable {
        KeyCodeTable::STANDARD
    }
}

impl<T: KeyStateSource + ?Sized> KeyStateSource for Arc<T> {
    fn is_pressed(&self, code: KeyCode) -> bool {
        (**self).is_pressed(code)
    }

    fn key_table(&self) -> KeyCodeTable {
        KeyStateSource::key_table(&**self)
    }
}

impl<T: KeyInjector + ?Sized> KeyInjector for Arc<T> {
    fn key_down(&self, code: KeyCode) -> Result<(), BackendError> {
        (**self).key_down(code)
    }

    fn key_up(&self, code: KeyCode) -> Result<(), BackendError> {
        (**self).key_up(code)
    }

    fn key_table(&self) -> KeyCodeTable {
        KeyInjector::key_table(&**self)
    }
}

/// Errors raised by a backend
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("failed to create event source - check Accessibility permissions")]
    EventSource,

    #[error("failed to create keyboard event for key {0}")]
    EventCreation(KeyCode),

    #[error("input for key {0} was blocked by the system")]
    InputBlocked(KeyCode),
}
