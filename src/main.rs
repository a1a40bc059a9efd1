//! keywatch: watch keys and report transitions as JSON lines
//!
//! Monitors every key of the standard table until the stop key is pressed
//! or the process receives SIGTERM/SIGINT. With `KEYWATCH_DEMO_TEXT` set,
//! the text is typed through the synthesizer on startup, followed by the
//! stop key.

use anyhow::Result;
use tokio::sync::broadcast;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use keywatch::lifecycle::ShutdownSignal;
use keywatch::{Config, KeyEvent, KeyStateSource, KeySynthesizer, ListenerRegistry, StopReason};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .with_writer(std::io::stderr)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "keywatch starting");

    #[cfg(target_os = "macos")]
    let (source, injector) = {
        let keyboard = keywatch::backend::CoreGraphicsKeyboard::new();
        (keyboard, keyboard)
    };
    #[cfg(windows)]
    let (source, injector) = {
        let keyboard = keywatch::backend::Win32Keyboard::new();
        (keyboard, keyboard)
    };
    #[cfg(not(any(target_os = "macos", windows)))]
    let (source, injector) = {
        warn!("no native backend on this platform, using the virtual keyboard");
        let keyboard = keywatch::VirtualKeyboard::new();
        (keyboard.clone(), keyboard)
    };

    let table = KeyStateSource::key_table(&source);
    let config = Config::load(&table)?;
    info!(
        stop_key = ?config.stop_key,
        poll_interval = ?config.poll_interval,
        debug = config.debug,
        "configuration loaded"
    );

    let mut shutdown = ShutdownSignal::new()?;

    let registry = ListenerRegistry::builder().config(&config).start(source)?;
    let mut events = registry.subscribe();

    if let Some(text) = config.demo_text.clone() {
        let synth = KeySynthesizer::new(injector);
        let delay = config.tap_delay;
        let stop_key = registry.stop_key();
        tokio::spawn(async move {
            if let Err(e) = synth.type_text(&text, delay).await {
                error!(error = %e, "demo typing failed");
                return;
            }
            match synth.tap(stop_key, delay) {
                Ok(tap) => {
                    if let Ok(Err(e)) = tap.await {
                        error!(error = %e, "stop key tap failed");
                    }
                }
                Err(e) => error!(error = %e, "stop key tap failed"),
            }
        });
    }

    info!("listening, press the stop key to exit");

    let printer = async {
        loop {
            match events.recv().await {
                Ok(event) => print_event(&event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(skipped = n, "event receiver lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    };

    tokio::select! {
        reason = registry.stopped() => {
            info!(%reason, "listener stopped");
        }
        kind = shutdown.wait() => {
            info!(?kind, "shutdown signal received");
            registry.stop_with(StopReason::Signal);
        }
        _ = printer => {
            info!("event stream closed");
        }
    }

    // Flush events that were queued while shutting down
    while let Ok(event) = events.try_recv() {
        print_event(&event);
    }

    let joiner = registry.registry();
    tokio::task::spawn_blocking(move || joiner.join()).await??;

    info!("keywatch stopped");
    Ok(())
}

fn print_event(event: &KeyEvent) {
    match serde_json::to_string(event) {
        Ok(line) => println!("{line}"),
        Err(e) => warn!(error = %e, "failed to encode event"),
    }
}
