//! Registry construction

use std::sync::Arc;
use std::time::Duration;

use crate::backend::KeyStateSource;
use crate::config::Config;
use crate::keys::{KeyCallback, KeyCode};
use crate::monitor::DEFAULT_POLL_INTERVAL;

use super::guard::ListenerGuard;
use super::listener::{ListenerRegistry, RegistryError};

const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Configures and starts a [`ListenerRegistry`]
#[derive(Debug, Clone)]
pub struct ListenerBuilder {
    /// `None` monitors every key of the backend's table
    pub(super) keys: Option<Vec<KeyCode>>,
    pub(super) on_press: Option<KeyCallback>,
    pub(super) on_release: Option<KeyCallback>,
    /// `None` resolves `backspace` in the backend's table
    pub(super) stop_key: Option<KeyCode>,
    pub(super) debug: bool,
    pub(super) poll_interval: Duration,
    pub(super) event_capacity: usize,
}

impl Default for ListenerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ListenerBuilder {
    pub fn new() -> Self {
        Self {
            keys: None,
            on_press: None,
            on_release: None,
            stop_key: None,
            debug: false,
            poll_interval: DEFAULT_POLL_INTERVAL,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }

    /// Keys to monitor from the start. Duplicates and the stop key are ignored.
    pub fn keys<I>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = KeyCode>,
    {
        self.keys = Some(keys.into_iter().collect());
        self
    }

    /// Press callback attached to every initial key except the stop key
    pub fn on_press(mut self, callback: KeyCallback) -> Self {
        self.on_press = Some(callback);
        self
    }

    /// Release callback attached to every initial key except the stop key
    pub fn on_release(mut self, callback: KeyCallback) -> Self {
        self.on_release = Some(callback);
        self
    }

    /// Key whose press stops the registry
    pub fn stop_key(mut self, code: KeyCode) -> Self {
        self.stop_key = Some(code);
        self
    }

    /// Log every transition at info level
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Delay between two samples of the same key
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Buffered events per subscriber before it starts lagging
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Take stop key, debug flag and poll interval from a loaded config
    pub fn config(mut self, config: &Config) -> Self {
        if let Some(code) = config.stop_key {
            self.stop_key = Some(code);
        }
        self.debug(config.debug).poll_interval(config.poll_interval)
    }

    /// Start listening on `source`, launching one monitor per key.
    ///
    /// Monitoring lasts until the registry stops or the returned guard is
    /// dropped.
    pub fn start<S>(self, source: S) -> Result<ListenerGuard, RegistryError>
    where
        S: KeyStateSource + 'static,
    {
        ListenerRegistry::launch(self, Arc::new(source)).map(ListenerGuard::new)
    }
}
