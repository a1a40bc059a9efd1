//! Listener registry owning every key state and its monitor

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::sync::{broadcast, watch};
use tracing::{debug, error, info, warn};

use crate::backend::KeyStateSource;
use crate::events::{KeyEvent, StopReason};
use crate::keys::{KeyCallback, KeyCode, KeyCodeError, KeyCodeTable, KeyState};
use crate::monitor::KeyMonitor;

use super::builder::ListenerBuilder;

/// Errors returned by registry operations
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("no listener is registered for key {0}")]
    UnknownKey(KeyCode),

    #[error("failed to spawn monitor thread for key {code}: {source}")]
    MonitorSpawn {
        code: KeyCode,
        #[source]
        source: std::io::Error,
    },

    #[error("registry is still listening; call stop() before join()")]
    StillListening,

    #[error("backend key table has no default stop key: {0}")]
    NoStopKey(#[source] KeyCodeError),
}

/// Name of the stop key when none is configured
const DEFAULT_STOP_KEY: &str = "backspace";

/// State shared by every registry handle and every monitor
pub(crate) struct Shared {
    listening: Arc<AtomicBool>,
    keys: RwLock<HashMap<KeyCode, Arc<KeyState>>>,
    stop_key: KeyCode,
    table: KeyCodeTable,
    source: Arc<dyn KeyStateSource>,
    poll_interval: Duration,
    debug: bool,
    events: broadcast::Sender<KeyEvent>,
    stopped: watch::Sender<Option<StopReason>>,
    monitors: Mutex<Vec<JoinHandle<()>>>,
}

/// Registry of monitored keys.
///
/// Cloning yields another handle to the same registry. Callbacks receive a
/// handle too, so they can query held state, add or remove listeners, or
/// stop the whole registry. Handles do not keep monitoring alive; the
/// [`ListenerGuard`](super::ListenerGuard) returned by
/// [`ListenerBuilder::start`] does.
#[derive(Clone)]
pub struct ListenerRegistry {
    shared: Arc<Shared>,
}

impl ListenerRegistry {
    /// Start configuring a registry
    pub fn builder() -> ListenerBuilder {
        ListenerBuilder::new()
    }

    pub(crate) fn from_shared(shared: Arc<Shared>) -> Self {
        Self { shared }
    }

    /// Build the key states, flip to listening and launch one monitor per key
    pub(crate) fn launch(
        builder: ListenerBuilder,
        source: Arc<dyn KeyStateSource>,
    ) -> Result<Self, RegistryError> {
        let ListenerBuilder {
            keys,
            on_press,
            on_release,
            stop_key,
            debug,
            poll_interval,
            event_capacity,
        } = builder;
        let table = source.key_table();
        let stop_key = match stop_key {
            Some(code) => code,
            None => table.code_of(DEFAULT_STOP_KEY).map_err(RegistryError::NoStopKey)?,
        };
        let keys = keys.unwrap_or_else(|| table.codes());

        let mut states = HashMap::new();
        for code in keys.into_iter().filter(|c| *c != stop_key) {
            states.entry(code).or_insert_with(|| {
                Arc::new(KeyState::new(
                    code,
                    table.name_of(code),
                    on_press.clone(),
                    on_release.clone(),
                ))
            });
        }
        let stop_callback =
            KeyCallback::infallible(|registry, _| registry.stop_with(StopReason::StopKey));
        states.insert(
            stop_key,
            Arc::new(KeyState::new(
                stop_key,
                table.name_of(stop_key),
                Some(stop_callback),
                None,
            )),
        );

        let (events, _) = broadcast::channel(event_capacity.max(1));
        let (stopped, _) = watch::channel(None);

        let registry = Self {
            shared: Arc::new(Shared {
                listening: Arc::new(AtomicBool::new(false)),
                keys: RwLock::new(states),
                stop_key,
                table,
                source,
                poll_interval,
                debug,
                events,
                stopped,
                monitors: Mutex::new(Vec::new()),
            }),
        };

        registry.shared.listening.store(true, Ordering::Release);

        let initial: Vec<Arc<KeyState>> = registry.shared.keys.read().values().cloned().collect();
        info!(
            keys = initial.len(),
            stop_key = %stop_key,
            ?poll_interval,
            "listener started"
        );
        for key in initial {
            if let Err(e) = registry.spawn_monitor(key) {
                registry.stop();
                return Err(e);
            }
        }

        Ok(registry)
    }

    fn spawn_monitor(&self, key: Arc<KeyState>) -> Result<(), RegistryError> {
        let code = key.code();
        let monitor = KeyMonitor::new(
            key,
            Arc::downgrade(&self.shared),
            Arc::clone(&self.shared.source),
            Arc::clone(&self.shared.listening),
            self.shared.poll_interval,
            self.shared.debug,
        );
        let handle = monitor
            .spawn()
            .map_err(|source| RegistryError::MonitorSpawn { code, source })?;
        self.shared.monitors.lock().push(handle);
        Ok(())
    }

    /// Register callbacks for a key.
    ///
    /// Appends to an existing key, or creates the key and starts its monitor.
    pub fn add_key_listener(
        &self,
        code: KeyCode,
        on_press: Option<KeyCallback>,
        on_release: Option<KeyCallback>,
    ) -> Result<(), RegistryError> {
        let mut keys = self.shared.keys.write();
        if let Some(existing) = keys.get(&code) {
            existing.add_callbacks(on_press, on_release);
            debug!(%code, "callbacks appended");
            return Ok(());
        }

        let name = self.shared.table.name_of(code);
        let key = Arc::new(KeyState::new(code, name, on_press, on_release));
        keys.insert(code, Arc::clone(&key));
        if let Err(e) = self.spawn_monitor(key) {
            keys.remove(&code);
            error!(%code, error = %e, "failed to start key monitor");
            return Err(e);
        }
        debug!(%code, ?name, "key listener added");
        Ok(())
    }

    /// Remove callbacks from a key.
    ///
    /// With no callback, both lists are cleared; the monitor keeps running.
    pub fn remove_key_listener(
        &self,
        code: KeyCode,
        callback: Option<&KeyCallback>,
    ) -> Result<(), RegistryError> {
        let Some(key) = self.key(code) else {
            error!(
                %code,
                name = ?self.shared.table.name_of(code),
                "cannot remove listener: key is not monitored"
            );
            return Err(RegistryError::UnknownKey(code));
        };

        match callback {
            None => {
                key.clear_callbacks();
                debug!(%code, "all callbacks removed");
            }
            Some(cb) => {
                if key.remove_callback(cb) {
                    debug!(%code, "callback removed");
                } else {
                    warn!(%code, "callback was not registered on this key");
                }
            }
        }
        Ok(())
    }

    /// Whether `code` is held per its monitor's latest sample.
    ///
    /// Unknown keys are reported and read as not held.
    pub fn is_held(&self, code: KeyCode) -> bool {
        self.try_is_held(code).unwrap_or_else(|e| {
            error!(
                %code,
                name = ?self.shared.table.name_of(code),
                error = %e,
                "held-state query for unmonitored key"
            );
            false
        })
    }

    pub fn try_is_held(&self, code: KeyCode) -> Result<bool, RegistryError> {
        self.shared
            .keys
            .read()
            .get(&code)
            .map(|key| key.is_held())
            .ok_or(RegistryError::UnknownKey(code))
    }

    /// Stop listening. Later calls are no-ops.
    ///
    /// Monitors exit on their next sample; this does not wait for them.
    pub fn stop(&self) {
        self.stop_with(StopReason::Requested);
    }

    /// Stop listening, recording why
    pub fn stop_with(&self, reason: StopReason) {
        if !self.shared.listening.swap(false, Ordering::AcqRel) {
            return;
        }
        info!(%reason, "stopping the listener");
        self.shared.stopped.send_replace(Some(reason));
        let _ = self.shared.events.send(KeyEvent::Stopped { reason });
    }

    pub fn is_listening(&self) -> bool {
        self.shared.listening.load(Ordering::Acquire)
    }

    /// Why the registry stopped, once it has
    pub fn stop_reason(&self) -> Option<StopReason> {
        *self.shared.stopped.borrow()
    }

    /// Stop, then drop every callback so captured handles are released
    pub(crate) fn release(&self) {
        self.stop();
        for key in self.shared.keys.read().values() {
            key.clear_callbacks();
        }
        debug!("callbacks released");
    }

    /// Wait until the registry stops
    pub async fn stopped(&self) -> StopReason {
        let mut rx = self.shared.stopped.subscribe();
        let reason = match rx.wait_for(Option::is_some).await {
            Ok(reason) => *reason,
            Err(_) => None,
        };
        reason.unwrap_or(StopReason::Requested)
    }

    /// Block until every monitor thread has exited.
    ///
    /// Only valid after the registry stopped. A monitor calling this from
    /// one of its own callbacks skips joining itself.
    pub fn join(&self) -> Result<(), RegistryError> {
        if self.is_listening() {
            return Err(RegistryError::StillListening);
        }
        let handles: Vec<_> = self.shared.monitors.lock().drain(..).collect();
        let current = thread::current().id();
        for handle in handles {
            if handle.thread().id() == current {
                continue;
            }
            let name = handle.thread().name().map(str::to_string);
            if handle.join().is_err() {
                warn!(?name, "monitor thread panicked");
            }
        }
        debug!("all monitors joined");
        Ok(())
    }

    pub fn stop_key(&self) -> KeyCode {
        self.shared.stop_key
    }

    /// Key table of the backend being sampled
    pub fn key_table(&self) -> KeyCodeTable {
        self.shared.table
    }

    /// Monitored codes, sorted
    pub fn keys(&self) -> Vec<KeyCode> {
        let mut codes: Vec<_> = self.shared.keys.read().keys().copied().collect();
        codes.sort();
        codes
    }

    /// Shared state for one key
    pub fn key(&self, code: KeyCode) -> Option<Arc<KeyState>> {
        self.shared.keys.read().get(&code).cloned()
    }

    /// Receive transition and shutdown events
    pub fn subscribe(&self) -> broadcast::Receiver<KeyEvent> {
        self.shared.events.subscribe()
    }

    pub(crate) fn publish(&self, event: KeyEvent) {
        // No subscribers is fine
        let _ = self.shared.events.send(event);
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listening", &self.is_listening())
            .field("stop_key", &self.shared.stop_key)
            .field("keys", &self.shared.keys.read().len())
            .finish()
    }
}
