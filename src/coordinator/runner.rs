//! The dictation coordinator — wires hotkey edges to capture, recognition,
//! and injection.
//!
//! # Cycle flow
//!
//! ```text
//! DictationEvent::HotkeyPressed            (only while Idle)
//!   └─▶ snapshot settings, capture.start()             [Recording]
//!
//! DictationEvent::HotkeyReleased           (only while Recording)
//!   └─▶ samples = capture.stop()
//!         ├─ empty → [Idle]
//!         ├─ engine missing → [Error("model not loaded")]
//!         └─▶ spawn_blocking(recognize)                [Transcribing]
//!               ├─ Err → [Error("transcription failed")]
//!               ├─ empty text → [Idle]
//!               └─▶ publish transcript,
//!                   spawn_blocking(inject)             [Inserting]
//!                     ├─ Ok  → notify observer         [Idle]
//!                     └─ Err → [Error("insertion failed: …")]
//! ```
//!
//! The coordinator serializes its own transitions: events are handled one at
//! a time off a single mpsc receiver, and slow work runs on the blocking
//! pool while this task awaits the result.  A second recording cannot start
//! mid-cycle because a down-edge in any non-Idle state is ignored.
//!
//! There are no timeouts: a hung recognizer or injector parks the published
//! state in Transcribing/Inserting until the host reloads or restarts.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::audio::Capture;
use crate::config::SettingsProvider;
use crate::coordinator::state::{DictationState, StatePublisher};
use crate::inject::Injector;
use crate::recognize::{join_segments, EngineSlot};

// ---------------------------------------------------------------------------
// DictationEvent
// ---------------------------------------------------------------------------

/// Inputs the coordinator reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DictationEvent {
    /// The push-to-talk key went down.
    HotkeyPressed,
    /// The push-to-talk key came up.
    HotkeyReleased,
    /// External request to re-resolve recognizer availability, the only way
    /// out of the `Error` state.
    ReloadRecognizer,
}

// ---------------------------------------------------------------------------
// DictationCoordinator
// ---------------------------------------------------------------------------

/// Owns the dictation state machine.
///
/// All collaborators arrive as injected trait objects, so tests drive the
/// full state table with doubles and no hardware.
pub struct DictationCoordinator {
    publisher: Arc<StatePublisher>,
    capture: Arc<dyn Capture>,
    recognizer: Arc<EngineSlot>,
    injector: Arc<dyn Injector>,
    settings: Arc<dyn SettingsProvider>,
    /// Language snapshot taken when the current cycle began.  Settings
    /// changes mid-cycle do not affect that cycle.
    cycle_language: String,
}

impl DictationCoordinator {
    pub fn new(
        publisher: Arc<StatePublisher>,
        capture: Arc<dyn Capture>,
        recognizer: Arc<EngineSlot>,
        injector: Arc<dyn Injector>,
        settings: Arc<dyn SettingsProvider>,
    ) -> Self {
        let cycle_language = settings.language();
        Self {
            publisher,
            capture,
            recognizer,
            injector,
            settings,
            cycle_language,
        }
    }

    /// The publication point observers read.
    pub fn publisher(&self) -> Arc<StatePublisher> {
        Arc::clone(&self.publisher)
    }

    /// Run until `events` closes.  Spawn as a tokio task from `main`.
    pub async fn run(mut self, mut events: mpsc::Receiver<DictationEvent>) {
        while let Some(event) = events.recv().await {
            match event {
                DictationEvent::HotkeyPressed => self.handle_pressed(),
                DictationEvent::HotkeyReleased => self.handle_released().await,
                DictationEvent::ReloadRecognizer => self.handle_reload(),
            }
        }

        log::info!("coordinator: event channel closed, shutting down");
    }

    // -----------------------------------------------------------------------
    // Event handlers
    // -----------------------------------------------------------------------

    /// Down-edge: begin recording, but only from `Idle`.
    fn handle_pressed(&mut self) {
        let state = self.publisher.state();
        if state != DictationState::Idle {
            log::debug!("ignoring hotkey press in state {}", state.label());
            return;
        }

        // Settings snapshot for this cycle.
        self.cycle_language = self.settings.language();

        match self.capture.start() {
            Ok(()) => {
                log::debug!("recording started (language {:?})", self.cycle_language);
                self.publisher.set(DictationState::Recording);
            }
            Err(e) => {
                log::error!("capture start failed: {e}");
                self.publisher
                    .set(DictationState::Error(format!("recording failed: {e}")));
            }
        }
    }

    /// Up-edge: stop recording and run the rest of the cycle.
    async fn handle_released(&mut self) {
        if self.publisher.state() != DictationState::Recording {
            log::debug!("ignoring hotkey release outside Recording");
            return;
        }

        let samples = self.capture.stop();
        if samples.is_empty() {
            log::debug!("no audio captured — back to idle");
            self.publisher.set(DictationState::Idle);
            return;
        }

        if !self.recognizer.is_loaded() {
            self.publisher
                .set(DictationState::Error("model not loaded".into()));
            return;
        }

        // ── Recognition (blocking → thread pool) ─────────────────────────
        self.publisher.set(DictationState::Transcribing);

        let slot = Arc::clone(&self.recognizer);
        let language = self.cycle_language.clone();
        let recognized =
            tokio::task::spawn_blocking(move || slot.transcribe(&samples, &language)).await;

        let segments = match recognized {
            Ok(Ok(segments)) => segments,
            Ok(Err(e)) => {
                log::error!("recognition failed: {e}");
                self.publisher
                    .set(DictationState::Error("transcription failed".into()));
                return;
            }
            Err(e) => {
                log::error!("recognition task panicked: {e}");
                self.publisher
                    .set(DictationState::Error("transcription failed".into()));
                return;
            }
        };

        let transcript = join_segments(&segments);
        if transcript.is_empty() {
            log::debug!("recognizer returned no text — back to idle");
            self.publisher.set(DictationState::Idle);
            return;
        }

        // ── Injection (blocking → thread pool) ───────────────────────────
        self.publisher
            .set_with_transcript(transcript.clone(), DictationState::Inserting);

        let injector = Arc::clone(&self.injector);
        let injected = tokio::task::spawn_blocking(move || injector.insert(&transcript)).await;

        match injected {
            Ok(Ok(())) => {
                self.publisher.notify_insertion_complete();
                self.publisher.set(DictationState::Idle);
            }
            Ok(Err(e)) => {
                log::error!("injection failed: {e}");
                self.publisher
                    .set(DictationState::Error(format!("insertion failed: {e}")));
            }
            Err(e) => {
                log::error!("injection task panicked: {e}");
                self.publisher
                    .set(DictationState::Error(format!("insertion failed: {e}")));
            }
        }
    }

    /// External reload: re-resolve recognizer availability.
    fn handle_reload(&mut self) {
        let state = self.publisher.state();
        if state.is_busy() {
            log::debug!("ignoring reload in state {}", state.label());
            return;
        }

        if self.recognizer.is_loaded() {
            self.publisher.set(DictationState::Idle);
        } else {
            self.publisher
                .set(DictationState::Error("model not loaded".into()));
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
