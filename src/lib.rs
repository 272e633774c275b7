//! Push-to-talk dictation plumbing.
//!
//! Hold the configured hotkey to record, release to transcribe, and the
//! recognized text is typed into whatever application has keyboard focus.
//! This crate is the concurrent core around that loop:
//!
//! * [`hotkey`] — a global key-event filter that fires debounced press and
//!   release edges for exactly one configured binding, swallowing only the
//!   matched events.
//! * [`audio`] — microphone capture that converts to 16 kHz mono on the
//!   hardware callback and hands the whole recording off on stop.
//! * [`coordinator`] — the state machine sequencing recording →
//!   transcription → insertion, publishing its state for any UI.
//! * [`inject`] — clipboard-mediated paste with guaranteed clipboard
//!   restoration, and a per-key typing fallback.
//! * [`recognize`] — the boundary trait for the external speech engine,
//!   with guarded scoped ownership of the engine handle.
//! * [`config`] / [`permissions`] — the settings and permission providers
//!   the rest of the crate consumes as injected collaborators.
//!
//! Speech recognition itself, model management, and UI are explicitly not
//! here: install an engine via [`recognize::EngineSlot`] and subscribe an
//! observer via [`coordinator::StatePublisher`].

pub mod audio;
pub mod config;
pub mod coordinator;
pub mod hotkey;
pub mod inject;
pub mod permissions;
pub mod recognize;

pub use audio::{AudioCapture, Capture, CaptureError, TARGET_SAMPLE_RATE};
pub use config::{FileSettings, Settings, SettingsProvider};
pub use coordinator::{
    DictationCoordinator, DictationEvent, DictationState, Observer, StatePublisher,
};
pub use hotkey::{HotKey, HotkeyEvent, HotkeyFilter, Modifiers};
pub use inject::{InjectError, Injector, TextInjector};
pub use permissions::{PermissionProvider, SystemPermissions};
pub use recognize::{EngineSlot, RecognitionError, Recognizer, TranscriptSegment};
