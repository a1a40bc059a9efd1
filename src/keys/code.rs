//! Opaque key code type

use std::fmt;

use serde::{Deserialize, Serialize};

/// Integer identifying a physical key in the backend's code space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyCode(pub u16);

impl From<u16> for KeyCode {
    fn from(raw: u16) -> Self {
        Self(raw)
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02X}", self.0)
    }
}
