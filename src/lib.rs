//! keywatch: per-key keyboard monitoring and keystroke synthesis
//!
//! A [`ListenerRegistry`] runs one monitor thread per watched key. Each
//! monitor samples its key through a [`KeyStateSource`] and fires the key's
//! press/release callbacks in registration order. Callbacks can add or
//! remove listeners and stop the registry while monitoring is live; a
//! failing callback stops everything. Pressing the stop key does the same,
//! and so does dropping the [`ListenerGuard`] that starting returns.
//!
//! [`KeySynthesizer`] issues synthetic taps and typed text through a
//! [`KeyInjector`], independent of monitoring. With [`VirtualKeyboard`] as
//! both source and injector, synthesized taps drive the monitors in-process.
//!
//! ```no_run
//! use std::time::Duration;
//! use keywatch::{KeyCallback, KeyCodeTable, KeySynthesizer, ListenerRegistry, VirtualKeyboard};
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let keyboard = VirtualKeyboard::new();
//! let table = KeyCodeTable::STANDARD;
//!
//! let registry = ListenerRegistry::builder()
//!     .keys([table.code_of("a")?, table.code_of("b")?])
//!     .on_press(KeyCallback::infallible(|_, key| println!("pressed {:?}", key.name())))
//!     .start(keyboard.clone())?;
//!
//! KeySynthesizer::new(keyboard)
//!     .type_text("ab", Duration::from_millis(20))
//!     .await?;
//!
//! registry.stop();
//! registry.join()?;
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod config;
pub mod events;
pub mod keys;
pub mod lifecycle;
pub mod monitor;
pub mod registry;
pub mod synth;

pub use backend::{BackendError, KeyInjector, KeyStateSource, VirtualKeyboard};
pub use config::Config;
pub use events::{KeyEvent, StopReason};
pub use keys::{KeyCallback, KeyCode, KeyCodeError, KeyCodeTable, KeyState};
pub use registry::{ListenerBuilder, ListenerGuard, ListenerRegistry, RegistryError};
pub use synth::{KeySynthesizer, SynthError};
