//! Static name <-> key code mapping
//!
//! Codes are native to a backend: [`KeyCodeTable::STANDARD`] holds Windows
//! virtual-key numbers, [`KeyCodeTable::MACOS`] holds `kVK_*` codes for
//! CoreGraphics. Both tables share one naming vocabulary.

use super::code::KeyCode;

/// Errors from table lookups
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyCodeError {
    #[error("no key named {0:?}")]
    NotFound(String),
}

/// Bidirectional mapping between symbolic key names and key codes
#[derive(Debug, Clone, Copy)]
pub struct KeyCodeTable {
    entries: &'static [(&'static str, KeyCode)],
}

impl KeyCodeTable {
    /// Windows virtual-key table
    pub const STANDARD: KeyCodeTable = KeyCodeTable { entries: STANDARD_ENTRIES };

    /// macOS `kVK_*` table
    pub const MACOS: KeyCodeTable = KeyCodeTable { entries: MACOS_ENTRIES };

    /// Build a table over a caller-supplied entry list
    pub const fn new(entries: &'static [(&'static str, KeyCode)]) -> Self {
        Self { entries }
    }

    /// Look up a code by name.
    ///
    /// Exact matches win; otherwise the lookup is ASCII case-insensitive,
    /// so `"F5"` and `"A"` resolve as expected.
    pub fn code_of(&self, name: &str) -> Result<KeyCode, KeyCodeError> {
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .or_else(|| self.entries.iter().find(|(n, _)| n.eq_ignore_ascii_case(name)))
            .map(|(_, code)| *code)
            .ok_or_else(|| KeyCodeError::NotFound(name.to_string()))
    }

    /// Look up the first name registered for a code
    pub fn name_of(&self, code: KeyCode) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(_, c)| *c == code)
            .map(|(name, _)| *name)
    }

    /// Resolve a single typed character.
    ///
    /// Letters are case-folded and a blank maps to `space`.
    pub fn code_for_char(&self, ch: char) -> Option<KeyCode> {
        if ch == ' ' {
            return self.code_of("space").ok();
        }
        let lowered: String = ch.to_lowercase().collect();
        self.entries
            .iter()
            .find(|(n, _)| *n == lowered)
            .map(|(_, code)| *code)
    }

    /// Every code in the table, deduplicated, in table order
    pub fn codes(&self) -> Vec<KeyCode> {
        let mut seen = std::collections::HashSet::new();
        self.entries
            .iter()
            .filter(|(_, code)| seen.insert(*code))
            .map(|(_, code)| *code)
            .collect()
    }

    /// Iterate over `(name, code)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, KeyCode)> + '_ {
        self.entries.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for KeyCodeTable {
    fn default() -> Self {
        Self::STANDARD
    }
}

const fn k(name: &'static str, code: u16) -> (&'static str, KeyCode) {
    (name, KeyCode(code))
}

const STANDARD_ENTRIES: &[(&str, KeyCode)] = &[
    // Control keys
    k("backspace", 0x08),
    k("tab", 0x09),
    k("clear", 0x0C),
    k("enter", 0x0D),
    k("ctrl", 0x11),
    k("alt", 0x12),
    k("pause", 0x13),
    k("caps_lock", 0x14),
    k("esc", 0x1B),
    k("space", 0x20),
    k("page_up", 0x21),
    k("page_down", 0x22),
    k("end", 0x23),
    k("home", 0x24),
    k("left", 0x25),
    k("up", 0x26),
    k("right", 0x27),
    k("down", 0x28),
    k("select", 0x29),
    k("print", 0x2A),
    k("execute", 0x2B),
    k("print_screen", 0x2C),
    k("ins", 0x2D),
    k("del", 0x2E),
    k("help", 0x2F),
    // Digits
    k("0", 0x30),
    k("1", 0x31),
    k("2", 0x32),
    k("3", 0x33),
    k("4", 0x34),
    k("5", 0x35),
    k("6", 0x36),
    k("7", 0x37),
    k("8", 0x38),
    k("9", 0x39),
    // Letters
    k("a", 0x41),
    k("b", 0x42),
    k("c", 0x43),
    k("d", 0x44),
    k("e", 0x45),
    k("f", 0x46),
    k("g", 0x47),
    k("h", 0x48),
    k("i", 0x49),
    k("j", 0x4A),
    k("k", 0x4B),
    k("l", 0x4C),
    k("m", 0x4D),
    k("n", 0x4E),
    k("o", 0x4F),
    k("p", 0x50),
    k("q", 0x51),
    k("r", 0x52),
    k("s", 0x53),
    k("t", 0x54),
    k("u", 0x55),
    k("v", 0x56),
    k("w", 0x57),
    k("x", 0x58),
    k("y", 0x59),
    k("z", 0x5A),
    // Numpad
    k("numpad_0", 0x60),
    k("numpad_1", 0x61),
    k("numpad_2", 0x62),
    k("numpad_3", 0x63),
    k("numpad_4", 0x64),
    k("numpad_5", 0x65),
    k("numpad_6", 0x66),
    k("numpad_7", 0x67),
    k("numpad_8", 0x68),
    k("numpad_9", 0x69),
    k("multiply_key", 0x6A),
    k("add_key", 0x6B),
    k("separator_key", 0x6C),
    k("subtract_key", 0x6D),
    k("decimal_key", 0x6E),
    k("divide_key", 0x6F),
    // Function keys
    k("F1", 0x70),
    k("F2", 0x71),
    k("F3", 0x72),
    k("F4", 0x73),
    k("F5", 0x74),
    k("F6", 0x75),
    k("F7", 0x76),
    k("F8", 0x77),
    k("F9", 0x78),
    k("F10", 0x79),
    k("F11", 0x7A),
    k("F12", 0x7B),
    k("F13", 0x7C),
    k("F14", 0x7D),
    k("F15", 0x7E),
    k("F16", 0x7F),
    k("F17", 0x80),
    k("F18", 0x81),
    k("F19", 0x82),
    k("F20", 0x83),
    k("F21", 0x84),
    k("F22", 0x85),
    k("F23", 0x86),
    k("F24", 0x87),
    k("num_lock", 0x90),
    k("scroll_lock", 0x91),
    // Modifier variants
    k("shift", 0xA0),
    k("shift_r", 0xA1),
    k("ctrl_l", 0xA2),
    k("ctrl_r", 0xA3),
    k("left_menu", 0xA4),
    k("right_menu", 0xA5),
    // Browser and media
    k("browser_back", 0xA6),
    k("browser_forward", 0xA7),
    k("browser_refresh", 0xA8),
    k("browser_stop", 0xA9),
    k("browser_search", 0xAA),
    k("browser_favorites", 0xAB),
    k("browser_start_and_home", 0xAC),
    k("volume_mute", 0xAD),
    k("volume_Down", 0xAE),
    k("volume_up", 0xAF),
    k("next_track", 0xB0),
    k("previous_track", 0xB1),
    k("stop_media", 0xB2),
    k("play/pause_media", 0xB3),
    k("start_mail", 0xB4),
    k("select_media", 0xB5),
    k("start_application_1", 0xB6),
    k("start_application_2", 0xB7),
    k("attn_key", 0xF6),
    k("crsel_key", 0xF7),
    k("exsel_key", 0xF8),
    k("play_key", 0xFA),
    k("zoom_key", 0xFB),
    k("clear_key", 0xFE),
    // Punctuation
    k("+", 0xBB),
    k(",", 0xBC),
    k("-", 0xBD),
    k(".", 0xBE),
    k("/", 0xBF),
    k("`", 0xC0),
    k(";", 0xBA),
    k("[", 0xDB),
    k("\\", 0xDC),
    k("]", 0xDD),
    k("'", 0xDE),
    // Aliases, never returned by reverse lookup
    k("play_pause_media", 0xB3),
];

const MACOS_ENTRIES: &[(&str, KeyCode)] = &[
    // Control keys
    k("backspace", 0x33),
    k("tab", 0x30),
    k("clear", 0x47),
    k("enter", 0x24),
    k("ctrl", 0x3B),
    k("alt", 0x3A),
    k("caps_lock", 0x39),
    k("esc", 0x35),
    k("space", 0x31),
    k("page_up", 0x74),
    k("page_down", 0x79),
    k("end", 0x77),
    k("home", 0x73),
    k("left", 0x7B),
    k("up", 0x7E),
    k("right", 0x7C),
    k("down", 0x7D),
    k("del", 0x75),
    k("help", 0x72),
    // Digits
    k("0", 0x1D),
    k("1", 0x12),
    k("2", 0x13),
    k("3", 0x14),
    k("4", 0x15),
    k("5", 0x17),
    k("6", 0x16),
    k("7", 0x1A),
    k("8", 0x1C),
    k("9", 0x19),
    // Letters
    k("a", 0x00),
    k("b", 0x0B),
    k("c", 0x08),
    k("d", 0x02),
    k("e", 0x0E),
    k("f", 0x03),
    k("g", 0x05),
    k("h", 0x04),
    k("i", 0x22),
    k("j", 0x26),
    k("k", 0x28),
    k("l", 0x25),
    k("m", 0x2E),
    k("n", 0x2D),
    k("o", 0x1F),
    k("p", 0x23),
    k("q", 0x0C),
    k("r", 0x0F),
    k("s", 0x01),
    k("t", 0x11),
    k("u", 0x20),
    k("v", 0x09),
    k("w", 0x0D),
    k("x", 0x07),
    k("y", 0x10),
    k("z", 0x06),
    // Numpad
    k("numpad_0", 0x52),
    k("numpad_1", 0x53),
    k("numpad_2", 0x54),
    k("numpad_3", 0x55),
    k("numpad_4", 0x56),
    k("numpad_5", 0x57),
    k("numpad_6", 0x58),
    k("numpad_7", 0x59),
    k("numpad_8", 0x5B),
    k("numpad_9", 0x5C),
    k("multiply_key", 0x43),
    k("add_key", 0x45),
    k("subtract_key", 0x4E),
    k("decimal_key", 0x41),
    k("divide_key", 0x4B),
    // Function keys
    k("F1", 0x7A),
    k("F2", 0x78),
    k("F3", 0x63),
    k("F4", 0x76),
    k("F5", 0x60),
    k("F6", 0x61),
    k("F7", 0x62),
    k("F8", 0x64),
    k("F9", 0x65),
    k("F10", 0x6D),
    k("F11", 0x67),
    k("F12", 0x6F),
    k("F13", 0x69),
    k("F14", 0x6B),
    k("F15", 0x71),
    k("F16", 0x6A),
    k("F17", 0x40),
    k("F18", 0x4F),
    k("F19", 0x50),
    k("F20", 0x5A),
    // Modifier variants
    k("shift", 0x38),
    k("shift_r", 0x3C),
    k("ctrl_l", 0x3B),
    k("ctrl_r", 0x3E),
    k("left_menu", 0x3A),
    k("right_menu", 0x3D),
    k("command", 0x37),
    k("command_r", 0x36),
    k("fn", 0x3F),
    // Media
    k("volume_mute", 0x4A),
    k("volume_Down", 0x49),
    k("volume_up", 0x48),
    // Punctuation
    k("+", 0x18),
    k(",", 0x2B),
    k("-", 0x1B),
    k(".", 0x2F),
    k("/", 0x2C),
    k("`", 0x32),
    k(";", 0x29),
    k("[", 0x21),
    k("\\", 0x2A),
    k("]", 0x1E),
    k("'", 0x27),
];
