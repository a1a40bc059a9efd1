//! Sampling loop bound to one key

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, error, info};

use super::machine::{KeyPhase, Transition};
use crate::backend::KeyStateSource;
use crate::events::{KeyEvent, StopReason};
use crate::keys::{KeyCallback, KeyState};
use crate::registry::{ListenerRegistry, Shared};

/// Observation loop for a single key.
///
/// Holds only a weak reference to the registry so that dropping every
/// registry handle lets the monitor wind down.
pub(crate) struct KeyMonitor {
    key: Arc<KeyState>,
    registry: Weak<Shared>,
    source: Arc<dyn KeyStateSource>,
    listening: Arc<AtomicBool>,
    poll_interval: Duration,
    debug: bool,
}

impl KeyMonitor {
    pub(crate) fn new(
        key: Arc<KeyState>,
        registry: Weak<Shared>,
        source: Arc<dyn KeyStateSource>,
        listening: Arc<AtomicBool>,
        poll_interval: Duration,
        debug: bool,
    ) -> Self {
        Self {
            key,
            registry,
            source,
            listening,
            poll_interval,
            debug,
        }
    }

    /// Run the loop on a dedicated, named thread
    pub(crate) fn spawn(self) -> std::io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name(format!("key-monitor-{}", self.key.code()))
            .spawn(move || self.run())
    }

    fn is_listening(&self) -> bool {
        self.listening.load(Ordering::Acquire)
    }

    fn run(self) {
        let code = self.key.code();
        debug!(%code, name = ?self.key.name(), "key monitor started");

        let mut phase = KeyPhase::Idle;
        while self.is_listening() {
            let (next, edge) = phase.step(self.source.is_pressed(code));
            phase = next;

            if let Some(edge) = edge {
                // A stop that landed during the sample suppresses the edge
                if !self.is_listening() {
                    break;
                }
                if !self.fire(edge) {
                    break;
                }
            }

            thread::sleep(self.poll_interval);
        }

        debug!(%code, held = phase.is_held(), "key monitor stopped");
    }

    /// Apply an edge and run its callbacks.
    /// Returns false when the registry is gone.
    fn fire(&self, edge: Transition) -> bool {
        let Some(registry) = self.registry.upgrade().map(ListenerRegistry::from_shared) else {
            return false;
        };

        let code = self.key.code();
        let name = self.key.name();
        let (callbacks, event) = match edge {
            Transition::Pressed => {
                self.key.set_held(true);
                if self.debug {
                    info!(%code, ?name, "Pressed");
                } else {
                    debug!(%code, ?name, "pressed");
                }
                (self.key.press_callbacks(), KeyEvent::pressed(code, name))
            }
            Transition::Released => {
                self.key.set_held(false);
                if self.debug {
                    info!(%code, ?name, "Released");
                } else {
                    debug!(%code, ?name, "released");
                }
                (self.key.release_callbacks(), KeyEvent::released(code, name))
            }
        };

        registry.publish(event);
        for callback in &callbacks {
            self.invoke(&registry, callback, edge);
        }
        true
    }

    /// Run one callback, escalating any fault to a registry stop
    fn invoke(&self, registry: &ListenerRegistry, callback: &KeyCallback, edge: Transition) {
        let code = self.key.code();
        let name = self.key.name();
        match panic::catch_unwind(AssertUnwindSafe(|| callback.invoke(registry, &self.key))) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                error!(%code, ?name, ?edge, error = %e, "callback failed, stopping listener");
                registry.stop_with(StopReason::CallbackFault);
            }
            Err(payload) => {
                error!(
                    %code,
                    ?name,
                    ?edge,
                    panic = panic_message(payload.as_ref()),
                    "callback panicked, stopping listener"
                );
                registry.stop_with(StopReason::CallbackFault);
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}
