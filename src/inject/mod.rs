//! Text injection — reproduce a transcript as input to the focused app.
//!
//! # Strategy
//!
//! 1. **Clipboard paste** (primary): snapshot the clipboard, write the text,
//!    wait for the clipboard to settle, synthesize the platform paste chord,
//!    wait for the target app to finish pasting, then restore the snapshot.
//!    Restoration is **unconditional** — a failed paste still puts the
//!    user's clipboard back, and a failed restoration never masks the paste
//!    error.
//! 2. **Direct typing** (fallback): synthesize the text key by key.  Slower
//!    and US-layout-bound, but it needs no clipboard at all.
//!
//! Both strategies block and must run off latency-sensitive threads; the
//! coordinator calls [`Injector::insert`] under `spawn_blocking`, and
//! [`TextInjector::insert_async`] wraps that for direct async callers.

pub mod clipboard;
pub mod fallback;
pub mod paste;

pub use clipboard::ClipboardSnapshot;
pub use fallback::{key_for_char, type_text};
pub use paste::send_paste_chord;

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::permissions::PermissionProvider;

// ---------------------------------------------------------------------------
// InjectError
// ---------------------------------------------------------------------------

/// All errors that can surface during text injection.
#[derive(Debug, Error)]
pub enum InjectError {
    /// Input-synthesis permission is missing — checked before any clipboard
    /// mutation, so a denied insertion leaves the clipboard untouched.
    #[error("input synthesis permission not granted")]
    PermissionDenied,

    /// Could not open the system clipboard.
    #[error("cannot access clipboard: {0}")]
    ClipboardAccess(String),

    /// Could not write text to the system clipboard.
    #[error("cannot write clipboard text: {0}")]
    ClipboardWrite(String),

    /// Could not synthesize a key event.
    #[error("cannot synthesize key event: {0}")]
    KeySynthesis(String),

    /// The blocking injection task died before reporting a result.
    #[error("injection worker failed: {0}")]
    Worker(String),
}

// ---------------------------------------------------------------------------
// Injector trait
// ---------------------------------------------------------------------------

/// Object-safe injection surface the coordinator drives.
///
/// Implemented by [`TextInjector`] and by test doubles in the coordinator's
/// unit tests.
pub trait Injector: Send + Sync {
    /// Insert `text` into the currently focused application.
    fn insert(&self, text: &str) -> Result<(), InjectError>;
}

// ---------------------------------------------------------------------------
// restore_after
// ---------------------------------------------------------------------------

/// Run `attempt`, then **always** run `restore`, returning the attempt's
/// result.
///
/// A restoration failure is logged and otherwise ignored: it must neither
/// mask an attempt error nor fail an attempt that succeeded.
fn restore_after<T>(
    attempt: impl FnOnce() -> Result<T, InjectError>,
    restore: impl FnOnce() -> Result<(), InjectError>,
) -> Result<T, InjectError> {
    let result = attempt();
    if let Err(e) = restore() {
        log::warn!("clipboard restoration failed: {e}");
    }
    result
}

// ---------------------------------------------------------------------------
// TextInjector
// ---------------------------------------------------------------------------

/// Configurable injector with the clipboard-paste primary strategy and the
/// direct-typing fallback.
#[derive(Clone)]
pub struct TextInjector {
    permissions: Arc<dyn PermissionProvider>,
    /// Wait after writing the clipboard before synthesizing paste, so the
    /// clipboard manager has flushed.
    settle_delay: Duration,
    /// Wait after paste before restoring, so the target app has read the
    /// clipboard.
    completion_delay: Duration,
    /// Pause between synthesized keys on the fallback path.
    inter_key_delay: Duration,
}

impl TextInjector {
    /// Create an injector with the default delays (50 ms settle, 100 ms
    /// completion, 10 ms between fallback keys).
    pub fn new(permissions: Arc<dyn PermissionProvider>) -> Self {
        Self {
            permissions,
            settle_delay: Duration::from_millis(50),
            completion_delay: Duration::from_millis(100),
            inter_key_delay: Duration::from_millis(10),
        }
    }

    /// Override the delays, e.g. from settings, for slow systems or sluggish
    /// clipboard managers.
    pub fn with_delays(
        mut self,
        settle: Duration,
        completion: Duration,
        inter_key: Duration,
    ) -> Self {
        self.settle_delay = settle;
        self.completion_delay = completion;
        self.inter_key_delay = inter_key;
        self
    }

    /// Async wrapper around [`Injector::insert`], run on the blocking pool.
    pub async fn insert_async(&self, text: impl Into<String>) -> Result<(), InjectError> {
        let this = self.clone();
        let text = text.into();
        tokio::task::spawn_blocking(move || this.insert(&text))
            .await
            .unwrap_or_else(|e| Err(InjectError::Worker(e.to_string())))
    }

    /// The clipboard-paste strategy: snapshot → write → settle → paste →
    /// completion → restore (always).
    fn paste_via_clipboard(&self, text: &str) -> Result<(), InjectError> {
        let snapshot = ClipboardSnapshot::capture()?;
        let settle = self.settle_delay;
        let completion = self.completion_delay;

        restore_after(
            || {
                clipboard::write_text(text)?;
                std::thread::sleep(settle);
                send_paste_chord()?;
                std::thread::sleep(completion);
                Ok(())
            },
            || snapshot.restore(),
        )
    }
}

impl Injector for TextInjector {
    fn insert(&self, text: &str) -> Result<(), InjectError> {
        if !self.permissions.input_access() {
            self.permissions.request_input_access();
            return Err(InjectError::PermissionDenied);
        }

        match self.paste_via_clipboard(text) {
            Ok(()) => Ok(()),
            Err(primary) => {
                log::warn!("clipboard paste failed ({primary}); falling back to direct typing");
                type_text(text, self.inter_key_delay).map_err(|fallback| {
                    log::error!("direct typing also failed: {fallback}");
                    fallback
                })
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // ---- restore_after -----------------------------------------------------

    #[test]
    fn restore_runs_after_a_failed_attempt() {
        let restored = Cell::new(false);
        let result: Result<(), _> = restore_after(
            || Err(InjectError::KeySynthesis("paste refused".into())),
            || {
                restored.set(true);
                Ok(())
            },
        );

        assert!(restored.get(), "restore must run even when the attempt fails");
        assert!(matches!(result, Err(InjectError::KeySynthesis(_))));
    }

    #[test]
    fn restore_failure_does_not_mask_the_attempt_error() {
        let result: Result<(), _> = restore_after(
            || Err(InjectError::ClipboardWrite("disk full, somehow".into())),
            || Err(InjectError::ClipboardAccess("gone".into())),
        );
        assert!(matches!(result, Err(InjectError::ClipboardWrite(_))));
    }

    #[test]
    fn restore_failure_does_not_fail_a_successful_attempt() {
        let result = restore_after(
            || Ok(7),
            || Err(InjectError::ClipboardAccess("gone".into())),
        );
        assert_eq!(result.unwrap(), 7);
    }

    // ---- Permission gate ---------------------------------------------------

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

    /// The permission check precedes every clipboard touch, so a denied
    /// insertion fails fast and raises the prompt.
    #[test]
    fn insert_without_permission_is_denied_before_clipboard_use() {
        let provider = Arc::new(DenyingInput {
            requests: AtomicUsize::new(0),
        });
        let injector = TextInjector::new(Arc::clone(&provider) as _);

        assert!(matches!(
            injector.insert("hello"),
            Err(InjectError::PermissionDenied)
        ));
        assert_eq!(provider.requests.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn injector_is_object_safe() {
        fn takes(_: &dyn Injector) {}
        let provider = Arc::new(crate::permissions::SystemPermissions::new());
        takes(&TextInjector::new(provider));
    }
}
