//! Keystroke synthesis
//!
//! Issues press/release pairs through a [`KeyInjector`]. Nothing here touches
//! key state directly: if a synthesized key is also monitored, its monitor
//! picks the tap up like any physical press.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::backend::{BackendError, KeyInjector};
use crate::keys::{KeyCode, KeyCodeTable};

/// Default hold time of a tap and gap between typed characters
pub const DEFAULT_TAP_DELAY: Duration = Duration::from_millis(50);

/// Errors that can occur while synthesizing input
#[derive(Debug, thiserror::Error)]
pub enum SynthError {
    #[error("failed to inject event for key {code}: {source}")]
    Inject {
        code: KeyCode,
        #[source]
        source: BackendError,
    },

    #[error("character {0:?} has no key and the table has no '.' fallback")]
    Unresolvable(char),

    #[error("tap requires a running tokio runtime")]
    NoRuntime,
}

/// Generates synthetic taps and typed text
#[derive(Clone)]
pub struct KeySynthesizer {
    injector: Arc<dyn KeyInjector>,
    table: KeyCodeTable,
}

impl KeySynthesizer {
    /// Synthesize through `injector`, resolving characters in its key table
    pub fn new<I>(injector: I) -> Self
    where
        I: KeyInjector + 'static,
    {
        let table = injector.key_table();
        Self {
            injector: Arc::new(injector),
            table,
        }
    }

    /// Resolve typed characters through a different table
    pub fn with_table(mut self, table: KeyCodeTable) -> Self {
        self.table = table;
        self
    }

    /// Press `code`, wait `delay`, release it, all on a background task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn tap(
        &self,
        code: KeyCode,
        delay: Duration,
    ) -> Result<JoinHandle<Result<(), SynthError>>, SynthError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| SynthError::NoRuntime)?;
        let injector = Arc::clone(&self.injector);
        Ok(runtime.spawn(async move { press_release(injector.as_ref(), code, delay).await }))
    }

    /// Type `text` one character at a time.
    ///
    /// Characters are lowercased before lookup; anything without a key is
    /// typed as `.`. Each tap holds for `delay` and the next character
    /// starts `delay` after the previous release.
    pub async fn type_text(&self, text: &str, delay: Duration) -> Result<(), SynthError> {
        let codes = text
            .chars()
            .map(|ch| self.resolve(ch))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(chars = codes.len(), "typing text");
        for (i, code) in codes.into_iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(delay).await;
            }
            press_release(self.injector.as_ref(), code, delay).await?;
        }
        Ok(())
    }

    /// Key used to type `ch`, falling back to the `.` key
    pub fn resolve(&self, ch: char) -> Result<KeyCode, SynthError> {
        if let Some(code) = self.table.code_for_char(ch) {
            return Ok(code);
        }
        debug!(?ch, "no key for character, substituting '.'");
        self.table
            .code_of(".")
            .map_err(|_| SynthError::Unresolvable(ch))
    }
}

impl std::fmt::Debug for KeySynthesizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeySynthesizer")
            .field("table_len", &self.table.len())
            .finish()
    }
}

async fn press_release(
    injector: &dyn KeyInjector,
    code: KeyCode,
    delay: Duration,
) -> Result<(), SynthError> {
    injector
        .key_down(code)
        .map_err(|source| SynthError::Inject { code, source })?;
    tokio::time::sleep(delay).await;
    injector.key_up(code).map_err(|source| {
        warn!(%code, "key-up failed, key may remain pressed");
        SynthError::Inject { code, source }
    })
}
