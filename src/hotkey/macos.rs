//! Consuming keyboard event tap for macOS (Quartz Event Services).
//!
//! Runs a `CGEventTap` on a dedicated thread with its own `CFRunLoop`.  The
//! tap is installed with the default (active) option so matched hotkey
//! events can be swallowed by returning `None` from the callback; everything
//! else is returned unchanged.
//!
//! When macOS disables the tap (callback timeout or a user-input storm) the
//! triggering event passes through and the tap is re-enabled on the next
//! run-loop tick, at most 100 ms later.
//!
//! Requires the Accessibility grant; [`crate::hotkey::HotkeyFilter::start`]
//! checks it before this thread is spawned.

use std::cell::RefCell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc as std_mpsc;
use std::sync::Arc;
use std::time::Duration;

use core_foundation::runloop::{kCFRunLoopCommonModes, kCFRunLoopDefaultMode, CFRunLoop};
use core_graphics::event::{
    CGEvent, CGEventFlags, CGEventTap, CGEventTapLocation, CGEventTapOptions, CGEventTapPlacement,
    CGEventType, EventField,
};
use tokio::sync::mpsc;

use super::filter::{EdgeFilter, TapEvent, Verdict};
use super::keys::{HotKey, Modifiers};
use super::{HotkeyError, HotkeyEvent};

/// Restrict a raw flag word to the four modifiers the matching rule knows.
fn modifiers_from_flags(flags: CGEventFlags) -> Modifiers {
    let mut held = Modifiers::NONE;
    if flags.contains(CGEventFlags::CGEventFlagControl) {
        held.insert(Modifiers::CONTROL);
    }
    if flags.contains(CGEventFlags::CGEventFlagAlternate) {
        held.insert(Modifiers::OPTION);
    }
    if flags.contains(CGEventFlags::CGEventFlagShift) {
        held.insert(Modifiers::SHIFT);
    }
    if flags.contains(CGEventFlags::CGEventFlagCommand) {
        held.insert(Modifiers::COMMAND);
    }
    held
}

fn keycode(event: &CGEvent) -> u16 {
    event.get_integer_value_field(EventField::KEYBOARD_EVENT_KEYCODE) as u16
}

/// Spawn the `hotkey-tap` thread.  `ready` receives `Ok(())` once the tap is
/// installed on the run loop, or the installation error.
pub(super) fn spawn_tap(
    hotkey: HotKey,
    events: mpsc::Sender<HotkeyEvent>,
    stop: Arc<AtomicBool>,
    ready: std_mpsc::Sender<Result<(), HotkeyError>>,
) -> std::io::Result<std::thread::JoinHandle<()>> {
    std::thread::Builder::new()
        .name("hotkey-tap".into())
        .spawn(move || run_tap(hotkey, events, stop, ready))
}

fn run_tap(
    hotkey: HotKey,
    events: mpsc::Sender<HotkeyEvent>,
    stop: Arc<AtomicBool>,
    ready: std_mpsc::Sender<Result<(), HotkeyError>>,
) {
    let filter = RefCell::new(EdgeFilter::new(hotkey));
    let reenable = Arc::new(AtomicBool::new(false));

    // Edges leave the callback over a std channel; the run-loop below
    // forwards them into the tokio channel.  The callback itself only
    // classifies and sends — no locks shared with other threads.
    let (edge_tx, edge_rx) = std_mpsc::channel::<HotkeyEvent>();

    let stop_cb = Arc::clone(&stop);
    let reenable_cb = Arc::clone(&reenable);
    let callback = move |_proxy: core_graphics::event::CGEventTapProxy,
                         event_type: CGEventType,
                         event: &CGEvent|
          -> Option<CGEvent> {
        if stop_cb.load(Ordering::SeqCst) {
            return Some(event.clone());
        }

        let tap_event = match event_type {
            CGEventType::KeyDown => TapEvent::KeyDown { code: keycode(event) },
            CGEventType::KeyUp => TapEvent::KeyUp { code: keycode(event) },
            CGEventType::FlagsChanged => TapEvent::ModifierFlags {
                code: keycode(event),
                held: modifiers_from_flags(event.get_flags()),
            },
            CGEventType::TapDisabledByTimeout | CGEventType::TapDisabledByUserInput => {
                TapEvent::Disabled
            }
            _ => return Some(event.clone()),
        };

        match filter.borrow_mut().process(tap_event) {
            Verdict::Pass => Some(event.clone()),
            Verdict::Consume(edge) => {
                let _ = edge_tx.send(edge);
                // Swallow the event: the hotkey never reaches other apps.
                None
            }
            Verdict::Resume => {
                reenable_cb.store(true, Ordering::SeqCst);
                Some(event.clone())
            }
        }
    };

    let tap = match CGEventTap::new(
        CGEventTapLocation::Session,
        CGEventTapPlacement::HeadInsertEventTap,
        CGEventTapOptions::Default,
        vec![
            CGEventType::KeyDown,
            CGEventType::KeyUp,
            CGEventType::FlagsChanged,
        ],
        callback,
    ) {
        Ok(tap) => tap,
        Err(_) => {
            let _ = ready.send(Err(HotkeyError::TapCreationFailed));
            return;
        }
    };

    tap.enable();

    let source = match tap.mach_port.create_runloop_source(0) {
        Ok(source) => source,
        Err(_) => {
            let _ = ready.send(Err(HotkeyError::TapCreationFailed));
            return;
        }
    };

    let run_loop = CFRunLoop::get_current();
    run_loop.add_source(&source, unsafe { kCFRunLoopCommonModes });

    let _ = ready.send(Ok(()));
    log::info!("event tap installed for {hotkey:?}");

    while !stop.load(Ordering::SeqCst) {
        CFRunLoop::run_in_mode(
            unsafe { kCFRunLoopDefaultMode },
            Duration::from_millis(100),
            true,
        );

        if reenable.swap(false, Ordering::SeqCst) {
            log::warn!("event tap disabled by the OS — re-enabling");
            tap.enable();
        }

        while let Ok(edge) = edge_rx.try_recv() {
            if events.blocking_send(edge).is_err() {
                log::warn!("hotkey event channel closed — stopping tap");
                stop.store(true, Ordering::SeqCst);
                break;
            }
        }
    }

    // The tap and its run-loop source drop here; interception ends and the
    // edge state dies with the filter.
    log::debug!("hotkey-tap thread exiting");
}
