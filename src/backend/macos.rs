//! macOS backend using CoreGraphics event sources
//!
//! Key codes are native `CGKeyCode` values, named by [`KeyCodeTable::MACOS`].
//! Requires Accessibility permission for injection.

use core_graphics::event::{CGEvent, CGEventTapLocation, CGKeyCode};
use core_graphics::event_source::{CGEventSource, CGEventSourceStateID};
use tracing::error;

use super::{BackendError, KeyInjector, KeyStateSource};
use crate::keys::{KeyCode, KeyCodeTable};

#[link(name = "CoreGraphics", kind = "framework")]
extern "C" {
    fn CGEventSourceKeyState(state_id: CGEventSourceStateID, key: CGKeyCode) -> bool;
}

/// Reads and injects keys through the HID system event source
#[derive(Debug, Clone, Copy, Default)]
pub struct CoreGraphicsKeyboard;

impl CoreGraphicsKeyboard {
    pub fn new() -> Self {
        Self
    }

    fn post(&self, code: KeyCode, down: bool) -> Result<(), BackendError> {
        let source = CGEventSource::new(CGEventSourceStateID::HIDSystemState).map_err(|_| {
            error!("failed to create event source - is Accessibility permission granted?");
            BackendError::EventSource
        })?;
        let event = CGEvent::new_keyboard_event(source, code.0, down)
            .map_err(|_| BackendError::EventCreation(code))?;
        event.post(CGEventTapLocation::HID);
        Ok(())
    }
}

impl KeyStateSource for CoreGraphicsKeyboard {
    fn is_pressed(&self, code: KeyCode) -> bool {
        // SAFETY: pure query on a process-wide event source state table.
        unsafe { CGEventSourceKeyState(CGEventSourceStateID::HIDSystemState, code.0) }
    }

    fn key_table(&self) -> KeyCodeTable {
        KeyCodeTable::MACOS
    }
}

impl KeyInjector for CoreGraphicsKeyboard {
    fn key_down(&self, code: KeyCode) -> Result<(), BackendError> {
        self.post(code, true)
    }

    fn key_up(&self, code: KeyCode) -> Result<(), BackendError> {
        self.post(code, false)
    }

    fn key_table(&self) -> KeyCodeTable {
        KeyCodeTable::MACOS
    }
}
