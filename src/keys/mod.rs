//! Key codes, the static name table, and per-key state

mod code;
mod state;
mod table;

pub use code::KeyCode;
pub use state::{KeyCallback, KeyState};
pub use table::{KeyCodeError, KeyCodeTable};
