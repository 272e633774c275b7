//! Dictation state and its published, observer-visible form.
//!
//! [`DictationState`] is owned by exactly one
//! [`DictationCoordinator`](crate::coordinator::DictationCoordinator) and
//! mutated only at its transition points.  Everything outside the coordinator — UI, menu bar,
//! logs — sees the state through [`StatePublisher`], which hands out
//! snapshots and notifies a passive [`Observer`].

use std::sync::{Arc, Mutex};

// ---------------------------------------------------------------------------
// DictationState
// ---------------------------------------------------------------------------

/// States of one dictation cycle.
///
/// ```text
/// Idle ──hotkey down──▶ Recording ──hotkey up──▶ Transcribing
///                                  (empty audio)──▶ Idle
/// Transcribing ──text──▶ Inserting ──done──▶ Idle
///              ──empty─▶ Idle
/// any step ──failure──▶ Error(message) ──reload──▶ Idle
/// ```
///
/// `Error` is terminal until the external reload action runs; the
/// coordinator never retries on its own.
#[derive(Debug, Clone, PartialEq)]
pub enum DictationState {
    /// Waiting for the push-to-talk key.
    Idle,

    /// Microphone is live; samples are accumulating.
    Recording,

    /// The recognizer is running on the blocking pool.
    Transcribing,

    /// The transcript is being injected into the focused app.
    Inserting,

    /// Something failed; the message is short and human-readable.
    Error(String),
}

impl DictationState {
    /// Returns `true` while a cycle is in flight.  A hotkey down-edge is
    /// ignored in any busy state.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            DictationState::Recording | DictationState::Transcribing | DictationState::Inserting
        )
    }

    /// A short label for status displays.
    pub fn label(&self) -> &'static str {
        match self {
            DictationState::Idle => "Idle",
            DictationState::Recording => "Recording",
            DictationState::Transcribing => "Transcribing",
            DictationState::Inserting => "Inserting",
            DictationState::Error(_) => "Error",
        }
    }
}

impl Default for DictationState {
    fn default() -> Self {
        DictationState::Idle
    }
}

// ---------------------------------------------------------------------------
// Observer
// ---------------------------------------------------------------------------

/// Passive receiver of state changes and completed transcripts.
///
/// All methods default to no-ops so implementors subscribe only to what
/// they need.  Callbacks arrive on the coordinator context and must return
/// promptly.
pub trait Observer: Send + Sync {
    /// The published state changed.
    fn state_changed(&self, _state: &DictationState) {}

    /// A non-empty transcript completed recognition.
    fn transcript_ready(&self, _text: &str) {}

    /// The transcript landed in the focused application.
    fn insertion_complete(&self) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl Observer for NullObserver {}

// ---------------------------------------------------------------------------
// StatePublisher
// ---------------------------------------------------------------------------

/// Atomic publication point for [`DictationState`] and the last transcript.
///
/// State and transcript live under one mutex, so an observer snapshot never
/// interleaves a new state with an old transcript.  The observer callback
/// fires after the lock is released.
pub struct StatePublisher {
    inner: Mutex<Published>,
    observer: Arc<dyn Observer>,
}

struct Published {
    state: DictationState,
    last_transcript: Option<String>,
}

impl StatePublisher {
    pub fn new(observer: Arc<dyn Observer>) -> Self {
        Self {
            inner: Mutex::new(Published {
                state: DictationState::Idle,
                last_transcript: None,
            }),
            observer,
        }
    }

    /// Current state snapshot.
    pub fn state(&self) -> DictationState {
        self.inner.lock().unwrap().state.clone()
    }

    /// The most recent non-empty transcript, if any cycle has completed
    /// recognition.
    pub fn last_transcript(&self) -> Option<String> {
        self.inner.lock().unwrap().last_transcript.clone()
    }

    /// Transition to `next` and notify the observer.
    pub fn set(&self, next: DictationState) {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.state = next.clone();
        }
        self.observer.state_changed(&next);
    }

    /// Publish a completed transcript and transition in one atomic step.
    pub fn set_with_transcript(&self, transcript: String, next: DictationState) {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.last_transcript = Some(transcript.clone());
            inner.state = next.clone();
        }
        self.observer.transcript_ready(&transcript);
        self.observer.state_changed(&next);
    }

    /// Forward an insertion-complete notification.
    pub fn notify_insertion_complete(&self) {
        self.observer.insertion_complete();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // ---- DictationState ----------------------------------------------------

    #[test]
    fn busy_states() {
        assert!(!DictationState::Idle.is_busy());
        assert!(DictationState::Recording.is_busy());
        assert!(DictationState::Transcribing.is_busy());
        assert!(DictationState::Inserting.is_busy());
        assert!(!DictationState::Error("x".into()).is_busy());
    }

    #[test]
    fn labels() {
        assert_eq!(DictationState::Idle.label(), "Idle");
        assert_eq!(DictationState::Recording.label(), "Recording");
        assert_eq!(DictationState::Transcribing.label(), "Transcribing");
        assert_eq!(DictationState::Inserting.label(), "Inserting");
        assert_eq!(DictationState::Error("x".into()).label(), "Error");
    }

    #[test]
    fn default_state_is_idle() {
        assert_eq!(DictationState::default(), DictationState::Idle);
    }

    // ---- StatePublisher ----------------------------------------------------

    #[test]
    fn publisher_starts_idle_with_no_transcript() {
        let publisher = StatePublisher::new(Arc::new(NullObserver));
        assert_eq!(publisher.state(), DictationState::Idle);
        assert!(publisher.last_transcript().is_none());
    }

    #[test]
    fn set_updates_snapshot() {
        let publisher = StatePublisher::new(Arc::new(NullObserver));
        publisher.set(DictationState::Recording);
        assert_eq!(publisher.state(), DictationState::Recording);
    }

    #[test]
    fn transcript_and_state_move_together() {
        let publisher = StatePublisher::new(Arc::new(NullObserver));
        publisher.set_with_transcript("hello world".into(), DictationState::Inserting);

        assert_eq!(publisher.state(), DictationState::Inserting);
        assert_eq!(publisher.last_transcript().as_deref(), Some("hello world"));
    }

    #[test]
    fn observer_sees_every_transition() {
        struct Recording(Mutex<Vec<String>>);
        impl Observer for Recording {
            fn state_changed(&self, state: &DictationState) {
                self.0.lock().unwrap().push(state.label().to_string());
            }
        }

        let observer = Arc::new(Recording(Mutex::new(Vec::new())));
        let publisher = StatePublisher::new(Arc::clone(&observer) as Arc<dyn Observer>);

        publisher.set(DictationState::Recording);
        publisher.set(DictationState::Idle);

        assert_eq!(*observer.0.lock().unwrap(), vec!["Recording", "Idle"]);
    }

    #[test]
    fn publisher_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<StatePublisher>();
    }
}
