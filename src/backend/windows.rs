//! Windows backend using the Win32 keyboard APIs
//!
//! Key codes are virtual-key codes, named by [`KeyCodeTable::STANDARD`].

use std::mem;

use tracing::warn;
use windows_sys::Win32::UI::Input::KeyboardAndMouse::{
    GetAsyncKeyState, SendInput, INPUT, INPUT_0, INPUT_KEYBOARD, KEYBDINPUT, KEYEVENTF_KEYUP,
};

use super::{BackendError, KeyInjector, KeyStateSource};
use crate::keys::KeyCode;

/// Reads key state with `GetAsyncKeyState` and injects with `SendInput`
#[derive(Debug, Clone, Copy, Default)]
pub struct Win32Keyboard;

impl Win32Keyboard {
    pub fn new() -> Self {
        Self
    }

    fn send(&self, code: KeyCode, down: bool) -> Result<(), BackendError> {
        let input = INPUT {
            r#type: INPUT_KEYBOARD,
            Anonymous: INPUT_0 {
                ki: KEYBDINPUT {
                    wVk: code.0,
                    wScan: 0,
                    dwFlags: if down { 0 } else { KEYEVENTF_KEYUP },
                    time: 0,
                    dwExtraInfo: 0,
                },
            },
        };
        // SAFETY: one fully initialized INPUT, sized as the API expects.
        let sent = unsafe { SendInput(1, &input, mem::size_of::<INPUT>() as i32) };
        if sent != 1 {
            warn!(%code, down, "SendInput inserted no event");
            return Err(BackendError::InputBlocked(code));
        }
        Ok(())
    }
}

impl KeyStateSource for Win32Keyboard {
    fn is_pressed(&self, code: KeyCode) -> bool {
        // SAFETY: pure query; the high bit reports the key as down.
        let state = unsafe { GetAsyncKeyState(i32::from(code.0)) };
        state < 0
    }
}

impl KeyInjector for Win32Keyboard {
    fn key_down(&self, code: KeyCode) -> Result<(), BackendError> {
        self.send(code, true)
    }

    fn key_up(&self, code: KeyCode) -> Result<(), BackendError> {
        self.send(code, false)
    }
}
