//! Notifications broadcast by the listener registry
//!
//! Every observed transition and the final shutdown are published so
//! observers can follow monitoring without registering callbacks.

use serde::{Deserialize, Serialize};

use crate::keys::KeyCode;

/// Why the registry stopped listening
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The designated stop key was pressed
    StopKey,
    /// `stop()` was called by a user of the registry
    Requested,
    /// A callback returned an error or panicked
    CallbackFault,
    /// The process received a termination signal
    Signal,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::StopKey => write!(f, "stop key"),
            StopReason::Requested => write!(f, "requested"),
            StopReason::CallbackFault => write!(f, "callback fault"),
            StopReason::Signal => write!(f, "signal"),
        }
    }
}

/// Events emitted by key monitors and the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum KeyEvent {
    /// Key went from idle to held
    Pressed {
        code: KeyCode,
        name: Option<String>,
    },

    /// Key went from held to idle
    Released {
        code: KeyCode,
        name: Option<String>,
    },

    /// Listening ended; no further transitions follow
    Stopped { reason: StopReason },
}

impl KeyEvent {
    pub(crate) fn pressed(code: KeyCode, name: Option<&str>) -> Self {
        KeyEvent::Pressed {
            code,
            name: name.map(str::to_string),
        }
    }

    pub(crate) fn released(code: KeyCode, name: Option<&str>) -> Self {
        KeyEvent::Released {
            code,
            name: name.map(str::to_string),
        }
    }

    /// Key the event refers to, if any
    pub fn code(&self) -> Option<KeyCode> {
        match self {
            KeyEvent::Pressed { code, .. } | KeyEvent::Released { code, .. } => Some(*code),
            KeyEvent::Stopped { .. } => None,
        }
    }
}

impl std::fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyEvent::Pressed { code, name } => {
                write!(f, "PRESSED {}", name.as_deref().unwrap_or("?"))?;
                write!(f, " ({})", code)
            }
            KeyEvent::Released { code, name } => {
                write!(f, "RELEASED {}", name.as_deref().unwrap_or("?"))?;
                write!(f, " ({})", code)
            }
            KeyEvent::Stopped { reason } => write!(f, "STOPPED ({})", reason),
        }
    }
}
