use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use super::*;
use crate::backend::{KeyStateSource, VirtualKeyboard};
use crate::events::{KeyEvent, StopReason};
use crate::keys::{KeyCallback, KeyCode, KeyCodeTable};
use crate::synth::KeySynthesizer;

const A: KeyCode = KeyCode(0x41);
const B: KeyCode = KeyCode(0x42);
const C: KeyCode = KeyCode(0x43);
const BACKSPACE: KeyCode = KeyCode(0x08);
const POLL: Duration = Duration::from_millis(1);
const TIMEOUT: Duration = Duration::from_secs(2);

type Log = Arc<Mutex<Vec<String>>>;

fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + TIMEOUT;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    cond()
}

/// Callback appending `"<label> <key name>"` to the log
fn logger(log: &Log, label: &'static str) -> KeyCallback {
    let log = Arc::clone(log);
    KeyCallback::infallible(move |_, key| {
        log.lock()
            .push(format!("{label} {}", key.name().unwrap_or("?")));
    })
}

/// Virtual keyboard that reports the macOS key table
struct MacKeyboard(VirtualKeyboard);

impl KeyStateSource for MacKeyboard {
    fn is_pressed(&self, code: KeyCode) -> bool {
        self.0.is_pressed(code)
    }

    fn key_table(&self) -> KeyCodeTable {
        KeyCodeTable::MACOS
    }
}

fn start(kb: &VirtualKeyboard, keys: &[KeyCode], log: &Log) -> ListenerGuard {
    ListenerRegistry::builder()
        .keys(keys.iter().copied())
        .on_press(logger(log, "press"))
        .on_release(logger(log, "release"))
        .stop_key(BACKSPACE)
        .poll_interval(POLL)
        .start(kb.clone())
        .unwrap()
}

fn entries(log: &Log) -> Vec<String> {
    log.lock().clone()
}

#[test]
fn test_press_release_then_stop_key() {
    let kb = VirtualKeyboard::new();
    let log = Log::default();
    let registry = start(&kb, &[A, B], &log);
    assert!(registry.is_listening());

    kb.press(A);
    assert!(wait_until(|| entries(&log).len() == 1));
    assert!(registry.is_held(A));
    assert_eq!(entries(&log), vec!["press a"]);

    kb.release(A);
    assert!(wait_until(|| entries(&log).len() == 2));
    assert!(!registry.is_held(A));
    assert_eq!(entries(&log), vec!["press a", "release a"]);

    kb.press(BACKSPACE);
    assert!(wait_until(|| !registry.is_listening()));
    assert_eq!(registry.stop_reason(), Some(StopReason::StopKey));
    registry.join().unwrap();

    kb.release(BACKSPACE);
    kb.press(A);
    thread::sleep(Duration::from_millis(30));
    assert_eq!(entries(&log), vec!["press a", "release a"]);
    assert!(!registry.is_held(A));
}

#[test]
fn test_callbacks_fire_in_registration_order() {
    let kb = VirtualKeyboard::new();
    let log = Log::default();
    let registry = start(&kb, &[], &log);

    registry
        .add_key_listener(C, Some(logger(&log, "first")), None)
        .unwrap();
    registry
        .add_key_listener(C, Some(logger(&log, "second")), None)
        .unwrap();

    kb.press(C);
    assert!(wait_until(|| entries(&log).len() == 2));
    thread::sleep(Duration::from_millis(20));
    assert_eq!(entries(&log), vec!["first c", "second c"]);

    registry.stop();
    registry.join().unwrap();
}

#[test]
fn test_global_callback_runs_before_added_ones() {
    let kb = VirtualKeyboard::new();
    let log = Log::default();
    let registry = start(&kb, &[A], &log);

    registry
        .add_key_listener(A, Some(logger(&log, "extra")), None)
        .unwrap();

    kb.press(A);
    assert!(wait_until(|| entries(&log).len() == 2));
    assert_eq!(entries(&log), vec!["press a", "extra a"]);

    registry.stop();
    registry.join().unwrap();
}

#[test]
fn test_added_key_tracks_held_state() {
    let kb = VirtualKeyboard::new();
    let log = Log::default();
    let registry = start(&kb, &[], &log);

    registry.add_key_listener(C, None, None).unwrap();
    assert!(!registry.is_held(C));

    kb.press(C);
    assert!(wait_until(|| registry.is_held(C)));
    kb.release(C);
    assert!(wait_until(|| !registry.is_held(C)));

    registry.stop();
    registry.join().unwrap();
}

#[test]
fn test_stop_while_held_fires_no_release() {
    let kb = VirtualKeyboard::new();
    let log = Log::default();
    let registry = start(&kb, &[A, B], &log);

    kb.press(A);
    kb.press(B);
    assert!(wait_until(|| registry.is_held(A) && registry.is_held(B)));

    registry.stop();
    registry.join().unwrap();

    kb.release(A);
    kb.release(B);
    thread::sleep(Duration::from_millis(30));

    let log = entries(&log);
    assert_eq!(log.len(), 2);
    assert!(log.iter().all(|entry| entry.starts_with("press")));
    assert!(registry.is_held(A));
    assert!(registry.is_held(B));
}

#[test]
fn test_remove_all_callbacks() {
    let kb = VirtualKeyboard::new();
    let log = Log::default();
    let registry = start(&kb, &[A], &log);

    registry.remove_key_listener(A, None).unwrap();
    assert_eq!(registry.key(A).unwrap().callback_counts(), (0, 0));

    kb.press(A);
    assert!(wait_until(|| registry.is_held(A)));
    kb.release(A);
    assert!(wait_until(|| !registry.is_held(A)));
    assert!(entries(&log).is_empty());

    registry.stop();
    registry.join().unwrap();
}

#[test]
fn test_remove_single_callback() {
    let kb = VirtualKeyboard::new();
    let log = Log::default();
    let registry = start(&kb, &[], &log);

    let keep = logger(&log, "keep");
    let gone = logger(&log, "gone");
    registry
        .add_key_listener(C, Some(keep), Some(gone.clone()))
        .unwrap();
    registry.remove_key_listener(C, Some(&gone)).unwrap();

    kb.press(C);
    assert!(wait_until(|| registry.is_held(C)));
    kb.release(C);
    assert!(wait_until(|| !registry.is_held(C)));
    thread::sleep(Duration::from_millis(10));
    assert_eq!(entries(&log), vec!["keep c"]);

    registry.stop();
    registry.join().unwrap();
}

#[test]
fn test_unknown_key_is_reported_not_fatal() {
    let kb = VirtualKeyboard::new();
    let log = Log::default();
    let registry = start(&kb, &[A], &log);

    assert!(!registry.is_held(C));
    assert!(matches!(
        registry.try_is_held(C),
        Err(RegistryError::UnknownKey(code)) if code == C
    ));
    assert!(matches!(
        registry.remove_key_listener(C, None),
        Err(RegistryError::UnknownKey(_))
    ));
    assert!(registry.is_listening());

    registry.stop();
    registry.join().unwrap();
}

#[test]
fn test_failing_callback_stops_everything() {
    let kb = VirtualKeyboard::new();
    let log = Log::default();
    let registry = start(&kb, &[A, B], &log);

    registry
        .add_key_listener(
            A,
            Some(KeyCallback::new(|_, _| anyhow::bail!("boom"))),
            None,
        )
        .unwrap();
    registry
        .add_key_listener(A, Some(logger(&log, "after")), None)
        .unwrap();

    kb.press(A);
    assert!(wait_until(|| !registry.is_listening()));
    assert_eq!(registry.stop_reason(), Some(StopReason::CallbackFault));
    registry.join().unwrap();

    // The rest of the batch still ran
    assert_eq!(entries(&log), vec!["press a", "after a"]);

    kb.press(B);
    thread::sleep(Duration::from_millis(20));
    assert_eq!(entries(&log).len(), 2);
}

#[test]
fn test_panicking_callback_stops_everything() {
    let kb = VirtualKeyboard::new();
    let log = Log::default();
    let registry = start(&kb, &[], &log);

    registry
        .add_key_listener(
            C,
            None,
            Some(KeyCallback::infallible(|_, _| panic!("release handler bug"))),
        )
        .unwrap();

    kb.press(C);
    assert!(wait_until(|| registry.is_held(C)));
    assert!(registry.is_listening());

    kb.release(C);
    assert!(wait_until(|| !registry.is_listening()));
    assert_eq!(registry.stop_reason(), Some(StopReason::CallbackFault));
    registry.join().unwrap();
}

#[test]
fn test_callback_can_register_new_key() {
    let kb = VirtualKeyboard::new();
    let log = Log::default();
    let registry = start(&kb, &[A], &log);

    let late = logger(&log, "late");
    registry
        .add_key_listener(
            A,
            Some(KeyCallback::new(move |registry, _| {
                registry.add_key_listener(C, Some(late.clone()), None)?;
                Ok(())
            })),
            None,
        )
        .unwrap();

    kb.press(A);
    assert!(wait_until(|| registry.key(C).is_some()));

    kb.press(C);
    assert!(wait_until(|| entries(&log).contains(&"late c".to_string())));
    assert!(registry.is_listening());

    registry.stop();
    registry.join().unwrap();
}

#[test]
fn test_callback_can_stop_registry() {
    let kb = VirtualKeyboard::new();
    let registry = ListenerRegistry::builder()
        .keys([A])
        .on_press(KeyCallback::infallible(|registry, key| {
            assert!(key.is_held());
            assert!(registry.is_held(key.code()));
            registry.stop();
        }))
        .poll_interval(POLL)
        .start(kb.clone())
        .unwrap();

    kb.press(A);
    assert!(wait_until(|| !registry.is_listening()));
    assert_eq!(registry.stop_reason(), Some(StopReason::Requested));
    registry.join().unwrap();
}

#[test]
fn test_stop_is_idempotent() {
    let kb = VirtualKeyboard::new();
    let log = Log::default();
    let registry = start(&kb, &[A], &log);

    registry.stop();
    registry.stop_with(StopReason::CallbackFault);
    assert!(!registry.is_listening());
    assert_eq!(registry.stop_reason(), Some(StopReason::Requested));
    registry.join().unwrap();
    registry.join().unwrap();
}

#[test]
fn test_join_requires_stop() {
    let kb = VirtualKeyboard::new();
    let log = Log::default();
    let registry = start(&kb, &[A], &log);

    assert!(matches!(registry.join(), Err(RegistryError::StillListening)));

    registry.stop();
    registry.join().unwrap();
}

#[test]
fn test_initial_keys_are_deduplicated() {
    let kb = VirtualKeyboard::new();
    let log = Log::default();
    let registry = start(&kb, &[A, A, BACKSPACE, B], &log);

    assert_eq!(registry.keys(), vec![BACKSPACE, A, B]);
    assert_eq!(registry.stop_key(), BACKSPACE);
    assert_eq!(registry.key(BACKSPACE).unwrap().callback_counts(), (1, 0));
    assert_eq!(registry.key(A).unwrap().callback_counts(), (1, 1));

    registry.stop();
    registry.join().unwrap();
}

#[test]
fn test_default_keys_cover_table() {
    let kb = VirtualKeyboard::new();
    let registry = ListenerRegistry::builder()
        .poll_interval(Duration::from_millis(5))
        .start(kb)
        .unwrap();

    assert_eq!(registry.keys().len(), KeyCodeTable::STANDARD.codes().len());
    assert_eq!(registry.stop_key(), BACKSPACE);

    registry.stop();
    registry.join().unwrap();
}

#[test]
fn test_defaults_follow_backend_table() {
    let kb = VirtualKeyboard::new();
    let log = Log::default();
    let registry = ListenerRegistry::builder()
        .on_press(logger(&log, "press"))
        .poll_interval(Duration::from_millis(5))
        .start(MacKeyboard(kb.clone()))
        .unwrap();

    let mac_backspace = KeyCode(0x33);
    assert_eq!(registry.stop_key(), mac_backspace);
    assert_eq!(registry.keys().len(), KeyCodeTable::MACOS.codes().len());
    assert_eq!(registry.key_table().name_of(KeyCode(0x00)), Some("a"));

    kb.press(KeyCode(0x00));
    assert!(wait_until(|| entries(&log) == vec!["press a"]));

    kb.press(BACKSPACE);
    thread::sleep(Duration::from_millis(30));
    assert!(registry.is_listening());

    kb.press(mac_backspace);
    assert!(wait_until(|| !registry.is_listening()));
    assert_eq!(registry.stop_reason(), Some(StopReason::StopKey));
    registry.join().unwrap();
}

#[test]
fn test_dropping_guard_stops_monitors() {
    let kb = VirtualKeyboard::new();
    let log = Log::default();
    let registry = start(&kb, &[A], &log);
    let handle = registry.registry();

    drop(registry);
    assert!(!handle.is_listening());
    assert_eq!(handle.stop_reason(), Some(StopReason::Requested));
    handle.join().unwrap();

    kb.press(A);
    thread::sleep(Duration::from_millis(30));
    assert!(entries(&log).is_empty());
}

#[test]
fn test_dropping_guard_stops_with_captured_handle() {
    let kb = VirtualKeyboard::new();
    let log = Log::default();
    let registry = start(&kb, &[A], &log);

    let captured = registry.clone();
    registry
        .add_key_listener(
            B,
            Some(KeyCallback::infallible(move |_, _| captured.stop())),
            None,
        )
        .unwrap();
    let handle = registry.registry();

    drop(registry);
    assert!(!handle.is_listening());
    handle.join().unwrap();
    assert_eq!(handle.key(B).unwrap().callback_counts(), (0, 0));

    kb.press(A);
    kb.press(B);
    thread::sleep(Duration::from_millis(30));
    assert!(entries(&log).is_empty());
}

#[tokio::test]
async fn test_events_are_broadcast() {
    let kb = VirtualKeyboard::new();
    let log = Log::default();
    let registry = start(&kb, &[A], &log);
    let mut events = registry.subscribe();

    kb.press(A);
    let pressed = tokio::time::timeout(TIMEOUT, events.recv()).await.unwrap().unwrap();
    assert_eq!(pressed, KeyEvent::pressed(A, Some("a")));

    kb.release(A);
    let released = tokio::time::timeout(TIMEOUT, events.recv()).await.unwrap().unwrap();
    assert_eq!(released, KeyEvent::released(A, Some("a")));

    registry.stop();
    let stopped = tokio::time::timeout(TIMEOUT, events.recv()).await.unwrap().unwrap();
    assert_eq!(
        stopped,
        KeyEvent::Stopped {
            reason: StopReason::Requested
        }
    );
    assert_eq!(registry.stopped().await, StopReason::Requested);
    registry.join().unwrap();
}

#[tokio::test]
async fn test_stopped_resolves_on_stop_key() {
    let kb = VirtualKeyboard::new();
    let log = Log::default();
    let registry = start(&kb, &[A], &log);

    let waiter = {
        let registry = registry.clone();
        tokio::spawn(async move { registry.stopped().await })
    };

    kb.press(BACKSPACE);
    let reason = tokio::time::timeout(TIMEOUT, waiter).await.unwrap().unwrap();
    assert_eq!(reason, StopReason::StopKey);
    registry.join().unwrap();
}

#[tokio::test]
async fn test_typed_text_triggers_monitored_keys() {
    let kb = VirtualKeyboard::new();
    let log = Log::default();
    let registry = start(&kb, &[A, B], &log);

    KeySynthesizer::new(kb.clone())
        .type_text("ab ", Duration::from_millis(15))
        .await
        .unwrap();

    let ok = wait_until(|| entries(&log).len() == 4);
    assert!(ok);
    assert_eq!(
        entries(&log),
        vec!["press a", "release a", "press b", "release b"]
    );

    registry.stop();
    registry.join().unwrap();
}

#[test]
fn test_stopped_pending_until_stop() {
    use tokio_test::{assert_pending, assert_ready_eq, task};

    let kb = VirtualKeyboard::new();
    let log = Log::default();
    let registry = start(&kb, &[A], &log);

    let mut stopped = task::spawn(registry.stopped());
    assert_pending!(stopped.poll());

    registry.stop();
    assert!(stopped.is_woken());
    assert_ready_eq!(stopped.poll(), StopReason::Requested);

    drop(stopped);
    registry.join().unwrap();
}
