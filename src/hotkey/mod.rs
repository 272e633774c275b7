//! Global hotkey interception for push-to-talk.
//!
//! # Design
//!
//! [`HotkeyFilter`] installs a system-wide key-event interceptor on a
//! dedicated OS thread and forwards press/release **edges** for exactly one
//! configured [`HotKey`] over a `tokio::sync::mpsc` channel.  All other
//! keyboard traffic passes through untouched.
//!
//! Matching and edge tracking live in the platform-free
//! [`EdgeFilter`](filter::EdgeFilter); the thread merely translates OS
//! events and applies the verdicts.  On macOS the backend is a consuming
//! `CGEventTap`, so the matched hotkey never reaches other applications; on
//! other platforms `rdev::listen` observes the stream but cannot swallow
//! events.
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use tokio::sync::mpsc;
//! use holdtype::hotkey::{HotKey, HotkeyFilter};
//! use holdtype::permissions::SystemPermissions;
//!
//! let (tx, mut rx) = mpsc::channel(16);
//! let mut filter = HotkeyFilter::new(HotKey::default(), Arc::new(SystemPermissions::new()));
//! filter.start(tx).expect("tap install failed");
//!
//! // In your async loop:
//! // while let Some(edge) = rx.recv().await { ... }
//! ```

pub mod filter;
pub mod keys;

#[cfg(target_os = "macos")]
mod macos;
#[cfg(not(target_os = "macos"))]
mod rdev_tap;

pub use filter::{EdgeFilter, TapEvent, Verdict};
pub use keys::{codes, parse_hotkey, parse_key_name, HotKey, Modifiers};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc as std_mpsc;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;

use crate::permissions::PermissionProvider;

// ---------------------------------------------------------------------------
// HotkeyEvent
// ---------------------------------------------------------------------------

/// Edges emitted by the interception thread.
///
/// Within one cycle `Pressed` strictly precedes `Released`, and each fires
/// at most once per physical press/release — OS key repeat never produces a
/// second `Pressed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotkeyEvent {
    /// The push-to-talk key went down.
    Pressed,
    /// The push-to-talk key came up.
    Released,
}

// ---------------------------------------------------------------------------
// FilterState / HotkeyError
// ---------------------------------------------------------------------------

/// Lifecycle of the interceptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterState {
    Stopped,
    Starting,
    Running,
}

/// Errors surfaced by [`HotkeyFilter::start`] and reconfiguration.
#[derive(Debug, Error)]
pub enum HotkeyError {
    /// Input-monitoring permission is missing.  The failed call also raises
    /// the OS permission prompt, once; it is not retried automatically.
    #[error("input monitoring permission not granted")]
    PermissionDenied,

    /// The OS refused to install the event interceptor.
    #[error("failed to install the keyboard event tap")]
    TapCreationFailed,

    #[error("failed to spawn the tap thread: {0}")]
    ThreadSpawn(String),

    /// The hotkey cannot be swapped while the interceptor is live.
    #[error("filter must be stopped before changing the hotkey")]
    StillRunning,
}

// ---------------------------------------------------------------------------
// HotkeyFilter
// ---------------------------------------------------------------------------

/// Owns the interception thread for one configured [`HotKey`].
///
/// Reconfiguring the binding is stop-then-start with a new value via
/// [`set_hotkey`](Self::set_hotkey); the active tap never sees a mutated
/// `HotKey`.
pub struct HotkeyFilter {
    hotkey: HotKey,
    permissions: Arc<dyn PermissionProvider>,
    state: FilterState,
    stop: Option<Arc<AtomicBool>>,
}

impl HotkeyFilter {
    pub fn new(hotkey: HotKey, permissions: Arc<dyn PermissionProvider>) -> Self {
        Self {
            hotkey,
            permissions,
            state: FilterState::Stopped,
            stop: None,
        }
    }

    pub fn state(&self) -> FilterState {
        self.state
    }

    pub fn hotkey(&self) -> HotKey {
        self.hotkey
    }

    /// Install the interceptor and begin forwarding edges on `events`.
    ///
    /// A no-op while already running.  Fails with
    /// [`HotkeyError::PermissionDenied`] (raising the permission prompt as a
    /// side effect) or [`HotkeyError::TapCreationFailed`] when the OS
    /// rejects the tap.
    pub fn start(&mut self, events: mpsc::Sender<HotkeyEvent>) -> Result<(), HotkeyError> {
        if self.state == FilterState::Running {
            log::debug!("hotkey filter already running — start is a no-op");
            return Ok(());
        }

        if !self.permissions.input_access() {
            self.permissions.request_input_access();
            return Err(HotkeyError::PermissionDenied);
        }

        self.state = FilterState::Starting;

        let stop = Arc::new(AtomicBool::new(false));
        let (ready_tx, ready_rx) = std_mpsc::channel();

        #[cfg(target_os = "macos")]
        let spawned = macos::spawn_tap(self.hotkey, events, Arc::clone(&stop), ready_tx);
        #[cfg(not(target_os = "macos"))]
        let spawned = rdev_tap::spawn_tap(self.hotkey, events, Arc::clone(&stop), ready_tx);

        if let Err(e) = spawned {
            self.state = FilterState::Stopped;
            return Err(HotkeyError::ThreadSpawn(e.to_string()));
        }

        match ready_rx.recv() {
            Ok(Ok(())) => {
                self.stop = Some(stop);
                self.state = FilterState::Running;
                log::info!("hotkey filter running: {:?}", self.hotkey);
                Ok(())
            }
            Ok(Err(e)) => {
                self.state = FilterState::Stopped;
                Err(e)
            }
            Err(_) => {
                // Tap thread died before reporting readiness.
                self.state = FilterState::Stopped;
                Err(HotkeyError::TapCreationFailed)
            }
        }
    }

    /// Disable the interceptor.  Idempotent.
    ///
    /// The tap thread observes the flag, releases the tap and drops its edge
    /// state, so a later `start` never begins mid-press.
    pub fn stop(&mut self) {
        if let Some(stop) = self.stop.take() {
            stop.store(true, Ordering::SeqCst);
        }
        self.state = FilterState::Stopped;
    }

    /// Replace the binding.  Only legal while stopped.
    pub fn set_hotkey(&mut self, hotkey: HotKey) -> Result<(), HotkeyError> {
        if self.state != FilterState::Stopped {
            return Err(HotkeyError::StillRunning);
        }
        self.hotkey = hotkey;
        Ok(())
    }
}

impl Drop for HotkeyFilter {
    fn drop(&mut self) {
        self.stop();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    struct DenyingInput {
        requests: AtomicUsize,
    }

    impl PermissionProvider for DenyingInput {
        fn microphone_access(&self) -> bool {
            true
        }
        fn request_microphone_access(&self) {}
        fn input_access(&self) -> bool {
            false
        }
        fn request_input_access(&self) {
            self.requests.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn start_without_permission_fails_and_prompts_once() {
        let provider = Arc::new(DenyingInput {
            requests: AtomicUsize::new(0),
        });
        let mut filter = HotkeyFilter::new(HotKey::default(), Arc::clone(&provider) as _);

        let (tx, _rx) = mpsc::channel(4);
        assert!(matches!(filter.start(tx), Err(HotkeyError::PermissionDenied)));
        assert_eq!(filter.state(), FilterState::Stopped);
        assert_eq!(provider.requests.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn stop_is_idempotent_from_stopped() {
        let provider = Arc::new(crate::permissions::SystemPermissions::new());
        let mut filter = HotkeyFilter::new(HotKey::default(), provider);

        filter.stop();
        filter.stop();
        assert_eq!(filter.state(), FilterState::Stopped);
    }

    #[test]
    fn set_hotkey_while_stopped_replaces_binding() {
        let provider = Arc::new(crate::permissions::SystemPermissions::new());
        let mut filter = HotkeyFilter::new(HotKey::default(), provider);

        let next = HotKey::new(codes::F9, Modifiers::COMMAND);
        filter.set_hotkey(next).unwrap();
        assert_eq!(filter.hotkey(), next);
    }
}
