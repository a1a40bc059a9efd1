//! Configuration loading and management

use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::keys::{KeyCode, KeyCodeTable};
use crate::monitor::DEFAULT_POLL_INTERVAL;
use crate::synth::DEFAULT_TAP_DELAY;

pub const ENV_POLL_MS: &str = "KEYWATCH_POLL_MS";
pub const ENV_STOP_KEY: &str = "KEYWATCH_STOP_KEY";
pub const ENV_DEBUG: &str = "KEYWATCH_DEBUG";
pub const ENV_TAP_DELAY_MS: &str = "KEYWATCH_TAP_DELAY_MS";
pub const ENV_DEMO_TEXT: &str = "KEYWATCH_DEMO_TEXT";

/// Listener configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Delay between two samples of the same key
    pub poll_interval: Duration,

    /// Key whose press stops listening; `None` keeps the backend default
    pub stop_key: Option<KeyCode>,

    /// Log every transition at info level
    pub debug: bool,

    /// Hold time for synthesized taps
    pub tap_delay: Duration,

    /// Text the binary types on startup, if any
    pub demo_text: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            stop_key: None,
            debug: false,
            tap_delay: DEFAULT_TAP_DELAY,
            demo_text: None,
        }
    }
}

impl Config {
    /// Load configuration from environment and defaults.
    ///
    /// Key names resolve through `table`, which must match the backend.
    pub fn load(table: &KeyCodeTable) -> Result<Self> {
        Self::from_lookup(table, |name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(table: &KeyCodeTable, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_POLL_MS) {
            let ms: u64 = raw
                .trim()
                .parse()
                .with_context(|| format!("{ENV_POLL_MS} must be an integer, got {raw:?}"))?;
            if ms == 0 {
                bail!("{ENV_POLL_MS} must be at least 1");
            }
            config.poll_interval = Duration::from_millis(ms);
        }

        if let Some(raw) = lookup(ENV_STOP_KEY) {
            let code = table
                .code_of(raw.trim())
                .with_context(|| format!("invalid {ENV_STOP_KEY}"))?;
            config.stop_key = Some(code);
        }

        if let Some(raw) = lookup(ENV_DEBUG) {
            config.debug = parse_flag(&raw).with_context(|| format!("invalid {ENV_DEBUG}"))?;
        }

        if let Some(raw) = lookup(ENV_TAP_DELAY_MS) {
            let ms: u64 = raw
                .trim()
                .parse()
                .with_context(|| format!("{ENV_TAP_DELAY_MS} must be an integer, got {raw:?}"))?;
            config.tap_delay = Duration::from_millis(ms);
        }

        config.demo_text = lookup(ENV_DEMO_TEXT).filter(|text| !text.is_empty());

        Ok(config)
    }
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => bail!("expected a boolean, got {other:?}"),
    }
}
