//! Observe-only hotkey backend for non-macOS platforms, using `rdev::listen`.
//!
//! `rdev::listen` is a blocking OS-level call on a dedicated thread.  It can
//! watch the global key stream but cannot swallow events, so on these
//! platforms the matched hotkey is still delivered to the focused
//! application — a limitation logged once at startup.  Edge detection,
//! modifier tracking and repeat suppression are identical to the macOS
//! backend because both feed the same [`EdgeFilter`].
//!
//! `rdev::listen` has no graceful shutdown API: the stop flag makes the
//! callback discard events, but the OS thread stays blocked in the listen
//! loop until the process exits.  It holds no resources needing cleanup.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc as std_mpsc;
use std::sync::Arc;

use tokio::sync::mpsc;

use super::filter::{EdgeFilter, TapEvent, Verdict};
use super::keys::{codes, HotKey};
use super::{HotkeyError, HotkeyEvent};

/// Translate an `rdev` key into the crate's key-code space.
///
/// Only keys that make sense as push-to-talk bindings (plus the modifier
/// keys the matcher tracks) are mapped; everything else is `None` and passes
/// through the filter untouched.
fn key_code_for(key: rdev::Key) -> Option<u16> {
    use rdev::Key;
    match key {
        Key::F1 => Some(codes::F1),
        Key::F2 => Some(codes::F2),
        Key::F3 => Some(codes::F3),
        Key::F4 => Some(codes::F4),
        Key::F5 => Some(codes::F5),
        Key::F6 => Some(codes::F6),
        Key::F7 => Some(codes::F7),
        Key::F8 => Some(codes::F8),
        Key::F9 => Some(codes::F9),
        Key::F10 => Some(codes::F10),
        Key::F11 => Some(codes::F11),
        Key::F12 => Some(codes::F12),

        Key::Space => Some(codes::SPACE),
        Key::Return => Some(codes::RETURN),
        Key::Tab => Some(codes::TAB),
        Key::Escape => Some(codes::ESCAPE),

        Key::ShiftLeft => Some(codes::SHIFT),
        Key::ShiftRight => Some(codes::RIGHT_SHIFT),
        Key::ControlLeft => Some(codes::CONTROL),
        Key::ControlRight => Some(codes::RIGHT_CONTROL),
        Key::Alt => Some(codes::OPTION),
        Key::AltGr => Some(codes::RIGHT_OPTION),
        Key::MetaLeft => Some(codes::COMMAND),
        Key::MetaRight => Some(codes::RIGHT_COMMAND),

        _ => None,
    }
}

/// Spawn the `hotkey-tap` thread.
///
/// Readiness is reported before `rdev::listen` enters its loop — the call
/// blocks for the process lifetime and offers no installation handshake, so
/// a listener failure (e.g. no display server) is logged rather than
/// returned.
pub(super) fn spawn_tap(
    hotkey: HotKey,
    events: mpsc::Sender<HotkeyEvent>,
    stop: Arc<AtomicBool>,
    ready: std_mpsc::Sender<Result<(), HotkeyError>>,
) -> std::io::Result<std::thread::JoinHandle<()>> {
    std::thread::Builder::new()
        .name("hotkey-tap".into())
        .spawn(move || {
            let mut filter = EdgeFilter::new(hotkey);
            let _ = ready.send(Ok(()));

            log::warn!(
                "hotkey backend is observe-only on this platform: \
                 the hotkey still reaches the focused application"
            );

            let result = rdev::listen(move |event: rdev::Event| {
                if stop.load(Ordering::SeqCst) {
                    return;
                }

                let tap_event = match event.event_type {
                    rdev::EventType::KeyPress(key) => {
                        key_code_for(key).map(|code| TapEvent::KeyDown { code })
                    }
                    rdev::EventType::KeyRelease(key) => {
                        key_code_for(key).map(|code| TapEvent::KeyUp { code })
                    }
                    _ => None,
                };

                let Some(tap_event) = tap_event else { return };

                if let Verdict::Consume(edge) = filter.process(tap_event) {
                    // Cannot actually consume here; forward the edge only.
                    let _ = events.blocking_send(edge);
                }
            });

            if let Err(e) = result {
                log::error!("hotkey-tap: rdev::listen exited with error: {e:?}");
            }
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modifier_keys_map_to_modifier_codes() {
        assert_eq!(key_code_for(rdev::Key::ShiftLeft), Some(codes::SHIFT));
        assert_eq!(key_code_for(rdev::Key::AltGr), Some(codes::RIGHT_OPTION));
        assert_eq!(key_code_for(rdev::Key::MetaLeft), Some(codes::COMMAND));
    }

    #[test]
    fn unmapped_keys_are_none() {
        assert_eq!(key_code_for(rdev::Key::KeyA), None);
        assert_eq!(key_code_for(rdev::Key::CapsLock), None);
    }
}
