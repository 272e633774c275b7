//! Dictation orchestration — the state machine between hotkey, microphone,
//! recognizer, and injector.
//!
//! [`DictationCoordinator`] consumes [`DictationEvent`]s from a
//! `tokio::sync::mpsc` channel and drives one push-to-talk cycle at a time;
//! [`StatePublisher`] exposes the current [`DictationState`] and last
//! transcript to any passive [`Observer`].

pub mod runner;
pub mod state;

pub use runner::{DictationCoordinator, DictationEvent};
pub use state::{DictationState, NullObserver, Observer, StatePublisher};
