//! Two-state press/release machine driven by raw samples

/// Phase of a single key as seen by its monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyPhase {
    /// Not pressed as of the last sample
    #[default]
    Idle,
    /// Pressed as of the last sample
    Held,
}

/// Edge produced by a sample that changed the phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Pressed,
    Released,
}

impl KeyPhase {
    /// Feed one sample; returns the next phase and the edge, if any.
    pub fn step(self, pressed: bool) -> (KeyPhase, Option<Transition>) {
        match (self, pressed) {
            (KeyPhase::Idle, true) => (KeyPhase::Held, Some(Transition::Pressed)),
            (KeyPhase::Held, false) => (KeyPhase::Idle, Some(Transition::Released)),
            (phase, _) => (phase, None),
        }
    }

    pub fn is_held(self) -> bool {
        self == KeyPhase::Held
    }
}

impl std::fmt::Display for KeyPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyPhase::Idle => write!(f, "Idle"),
            KeyPhase::Held => write!(f, "Held"),
        }
    }
}
