//! Application entry point — the push-to-talk dictation daemon.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`Settings`] from disk (defaults on first run).
//! 3. Build the permission and settings providers.
//! 4. Spawn the audio capture thread, build the injector and the (empty)
//!    recognizer slot.
//! 5. Spawn the coordinator on a tokio runtime (multi-thread, 2 workers).
//! 6. Install the global hotkey filter and forward its edges to the
//!    coordinator.
//! 7. Block until Ctrl-C.
//!
//! This binary carries no recognition engine: integrators install one into
//! the [`EngineSlot`] (holdtype is a library first).  Without one, a cycle
//! ends in the "model not loaded" error state, which is logged.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc;

use holdtype::audio::Capture;
use holdtype::inject::Injector;
use holdtype::{
    AudioCapture, DictationCoordinator, DictationEvent, DictationState, EngineSlot, FileSettings,
    HotkeyEvent, HotkeyFilter, Observer, PermissionProvider, Settings, SettingsProvider,
    StatePublisher, SystemPermissions, TextInjector,
};

// ---------------------------------------------------------------------------
// LogObserver
// ---------------------------------------------------------------------------

/// Observer that narrates state changes to the log — the daemon's only UI.
struct LogObserver;

impl Observer for LogObserver {
    fn state_changed(&self, state: &DictationState) {
        match state {
            DictationState::Error(message) => log::error!("dictation error: {message}"),
            other => log::info!("dictation state: {}", other.label()),
        }
    }

    fn transcript_ready(&self, text: &str) {
        log::info!("transcript: {text:?}");
    }

    fn insertion_complete(&self) {
        log::debug!("transcript delivered to the focused application");
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = Settings::load();
    let hotkey = settings.hotkey();
    let (settle, completion, inter_key) = settings.injection_delays();
    let input_device = settings.audio.input_device.clone();

    let permissions: Arc<dyn PermissionProvider> = Arc::new(SystemPermissions::new());
    let provider = Arc::new(FileSettings::new(settings));

    let capture = Arc::new(
        AudioCapture::new(Arc::clone(&permissions), input_device)
            .context("spawning the audio capture thread")?,
    );
    let injector = Arc::new(
        TextInjector::new(Arc::clone(&permissions)).with_delays(settle, completion, inter_key),
    );

    let recognizer = Arc::new(EngineSlot::empty());
    log::warn!(
        "no recognizer engine installed — dictation reports \"model not loaded\" \
         until the host provides one"
    );

    let publisher = Arc::new(StatePublisher::new(Arc::new(LogObserver)));
    let coordinator = DictationCoordinator::new(
        publisher,
        capture as Arc<dyn Capture>,
        recognizer,
        injector as Arc<dyn Injector>,
        provider as Arc<dyn SettingsProvider>,
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("building the tokio runtime")?;

    let (event_tx, event_rx) = mpsc::channel::<DictationEvent>(16);
    let (edge_tx, mut edge_rx) = mpsc::channel::<HotkeyEvent>(16);

    let mut filter = HotkeyFilter::new(hotkey, Arc::clone(&permissions));
    filter
        .start(edge_tx)
        .context("installing the global hotkey filter")?;

    runtime.block_on(async move {
        tokio::spawn(coordinator.run(event_rx));

        // Bridge hotkey edges into the coordinator's event stream.
        tokio::spawn(async move {
            while let Some(edge) = edge_rx.recv().await {
                let event = match edge {
                    HotkeyEvent::Pressed => DictationEvent::HotkeyPressed,
                    HotkeyEvent::Released => DictationEvent::HotkeyReleased,
                };
                if event_tx.send(event).await.is_err() {
                    break;
                }
            }
        });

        log::info!("holdtype is running — hold {hotkey:?} to dictate, Ctrl-C to quit");
        tokio::signal::ctrl_c().await.ok();
        log::info!("shutting down");
    });

    filter.stop();
    Ok(())
}
