//! Microphone capture via `cpal`.
//!
//! [`AudioCapture`] owns the cpal host/device/stream lifecycle.  Because
//! `cpal::Stream` is not `Send` on every platform, the stream lives on a
//! dedicated control thread; the public handle talks to it over a command
//! channel and is itself `Send + Sync`, so the coordinator can hold it behind
//! an `Arc<dyn Capture>`.
//!
//! The hardware callback does the cheap O(chunk) conversion to 16 kHz mono
//! inline and appends to the session buffer under a short-held mutex.  It
//! never calls back into the recognizer, the injector, or any UI code.

use std::sync::mpsc as std_mpsc;
use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::audio::{mix_to_mono, resample, SampleBuffer, TARGET_SAMPLE_RATE};
use crate::permissions::PermissionProvider;

// ---------------------------------------------------------------------------
// CaptureError
// ---------------------------------------------------------------------------

/// Errors that can occur while setting up or running audio capture.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// Microphone access has not been granted.  `start` never proceeds
    /// silently without it; the permission prompt is requested as a side
    /// effect of the failed call.
    #[error("microphone access has not been granted")]
    PermissionDenied,

    /// No usable capture device is selected or available.
    #[error("no usable capture device: {0}")]
    DeviceUnavailable(String),

    #[error("failed to query default input config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to build input stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    /// The capture control thread is gone (spawn failed or handle outlived it).
    #[error("audio control thread unavailable: {0}")]
    ControlThread(String),
}

// ---------------------------------------------------------------------------
// Capture trait
// ---------------------------------------------------------------------------

/// Object-safe start/stop surface the coordinator drives on hotkey edges.
///
/// Implemented by [`AudioCapture`] for real hardware and by test doubles in
/// the coordinator's unit tests.
pub trait Capture: Send + Sync {
    /// Begin a capture session.  Idempotent while already capturing.
    fn start(&self) -> Result<(), CaptureError>;

    /// End the session and move the accumulated 16 kHz mono samples out.
    /// Returns an empty vector when no session was active.
    fn stop(&self) -> Vec<f32>;
}

// ---------------------------------------------------------------------------
// Control-thread plumbing
// ---------------------------------------------------------------------------

enum Command {
    Start(std_mpsc::Sender<Result<(), CaptureError>>),
    Stop(std_mpsc::Sender<Vec<f32>>),
    SetDevice(Option<String>, std_mpsc::Sender<()>),
}

/// State owned by the `audio-capture` control thread.
struct CaptureWorker {
    permissions: Arc<dyn PermissionProvider>,
    device_name: Option<String>,
    buffer: Arc<Mutex<SampleBuffer>>,
    stream: Option<cpal::Stream>,
}

impl CaptureWorker {
    fn handle(&mut self, cmd: Command) {
        match cmd {
            Command::Start(reply) => {
                let _ = reply.send(self.start_stream());
            }
            Command::Stop(reply) => {
                let _ = reply.send(self.stop_stream());
            }
            Command::SetDevice(name, reply) => {
                self.set_device(name);
                let _ = reply.send(());
            }
        }
    }

    fn start_stream(&mut self) -> Result<(), CaptureError> {
        if self.stream.is_some() {
            log::debug!("capture already active — start is a no-op");
            return Ok(());
        }

        if !self.permissions.microphone_access() {
            self.permissions.request_microphone_access();
            return Err(CaptureError::PermissionDenied);
        }

        let device = self.resolve_device()?;
        let supported = device.default_input_config()?;
        let channels = supported.channels();
        let sample_rate = supported.sample_rate().0;
        let config: cpal::StreamConfig = supported.into();

        // A fresh session never inherits samples from the previous one.
        self.buffer.lock().unwrap().clear();

        let buffer = Arc::clone(&self.buffer);
        let stream = device.build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                let mono = mix_to_mono(data, channels);
                let converted = resample(&mono, sample_rate, TARGET_SAMPLE_RATE);
                if converted.is_empty() {
                    return;
                }
                // Lock held only for the append.
                if let Ok(mut buf) = buffer.lock() {
                    buf.append(&converted);
                }
            },
            |err: cpal::StreamError| {
                log::error!("cpal stream error: {err}");
            },
            None,
        )?;

        stream.play()?;
        log::debug!("capture started: {channels} ch @ {sample_rate} Hz → {TARGET_SAMPLE_RATE} Hz mono");
        self.stream = Some(stream);
        Ok(())
    }

    fn stop_stream(&mut self) -> Vec<f32> {
        if let Some(stream) = self.stream.take() {
            // Dropping the stream stops the hardware callbacks; the buffer
            // swap below therefore happens-after the final append.
            drop(stream);
        }
        self.buffer.lock().unwrap().take_all()
    }

    fn set_device(&mut self, name: Option<String>) {
        if self.stream.is_some() {
            let discarded = self.stop_stream();
            log::warn!(
                "device changed mid-capture — discarding {} buffered samples",
                discarded.len()
            );
        }
        self.device_name = name;
    }

    fn resolve_device(&self) -> Result<cpal::Device, CaptureError> {
        let host = cpal::default_host();
        match &self.device_name {
            None => host
                .default_input_device()
                .ok_or_else(|| CaptureError::DeviceUnavailable("no default input device".into())),
            Some(want) => host
                .input_devices()
                .map_err(|e| CaptureError::DeviceUnavailable(e.to_string()))?
                .find(|d| d.name().map(|n| &n == want).unwrap_or(false))
                .ok_or_else(|| CaptureError::DeviceUnavailable(format!("no device named {want:?}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// AudioCapture
// ---------------------------------------------------------------------------

/// Public capture handle.
///
/// Construct with [`AudioCapture::new`]; the device binding is resolved at
/// each `start`, so an unplugged microphone surfaces as a
/// [`CaptureError::DeviceUnavailable`] on the next session rather than a
/// crash.  Dropping the handle shuts the control thread down and releases
/// any active stream.
pub struct AudioCapture {
    cmd_tx: mpsc::UnboundedSender<Command>,
}

impl AudioCapture {
    /// Spawn the capture control thread.
    ///
    /// `device_name` selects a specific input device by cpal name; `None`
    /// uses the system default at each `start`.
    pub fn new(
        permissions: Arc<dyn PermissionProvider>,
        device_name: Option<String>,
    ) -> Result<Self, CaptureError> {
        let (cmd_tx, mut cmd_rx) = mpsc::unbounded_channel();

        std::thread::Builder::new()
            .name("audio-capture".into())
            .spawn(move || {
                let mut worker = CaptureWorker {
                    permissions,
                    device_name,
                    buffer: Arc::new(Mutex::new(SampleBuffer::new())),
                    stream: None,
                };
                while let Some(cmd) = cmd_rx.blocking_recv() {
                    worker.handle(cmd);
                }
                // Handle dropped: the stream (if any) dies with the worker.
            })
            .map_err(|e| CaptureError::ControlThread(e.to_string()))?;

        Ok(Self { cmd_tx })
    }

    /// Rebind the input device.  An active capture is stopped first (its
    /// partial buffer is discarded); the caller decides whether to restart.
    pub fn set_device(&self, name: Option<String>) {
        let (tx, rx) = std_mpsc::channel();
        if self.cmd_tx.send(Command::SetDevice(name, tx)).is_ok() {
            let _ = rx.recv();
        }
    }
}

impl Capture for AudioCapture {
    fn start(&self) -> Result<(), CaptureError> {
        let (tx, rx) = std_mpsc::channel();
        self.cmd_tx
            .send(Command::Start(tx))
            .map_err(|e| CaptureError::ControlThread(e.to_string()))?;
        rx.recv()
            .map_err(|e| CaptureError::ControlThread(e.to_string()))?
    }

    fn stop(&self) -> Vec<f32> {
        let (tx, rx) = std_mpsc::channel();
        if self.cmd_tx.send(Command::Stop(tx)).is_err() {
            return Vec::new();
        }
        rx.recv().unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct DenyingMic {
        requests: AtomicUsize,
    }

    impl PermissionProvider for DenyingMic {
        fn microphone_access(&self) -> bool {
            false
        }
        fn request_microphone_access(&self) {
            self.requests.fetch_add(1, Ordering::SeqCst);
        }
        fn input_access(&self) -> bool {
            true
        }
        fn request_input_access(&self) {}
    }

    fn granting() -> Arc<dyn PermissionProvider> {
        Arc::new(crate::permissions::SystemPermissions::new())
    }

    #[test]
    fn handle_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AudioCapture>();
    }

    /// Denied microphone access fails `start` and fires the one-shot
    /// permission request, without touching any device.
    #[test]
    fn start_without_mic_permission_is_denied_and_requests() {
        let provider = Arc::new(DenyingMic {
            requests: AtomicUsize::new(0),
        });
        let capture = AudioCapture::new(Arc::clone(&provider) as _, None).unwrap();

        assert!(matches!(capture.start(), Err(CaptureError::PermissionDenied)));
        assert_eq!(provider.requests.load(Ordering::SeqCst), 1);
    }

    /// `stop` with no preceding `start` returns an empty recording.
    #[test]
    fn stop_without_start_returns_empty() {
        let capture = AudioCapture::new(granting(), None).unwrap();
        assert!(capture.stop().is_empty());
    }

    /// Rebinding the device while idle is a quiet no-op.
    #[test]
    fn set_device_while_idle() {
        let capture = AudioCapture::new(granting(), None).unwrap();
        capture.set_device(Some("USB Microphone".into()));
        assert!(capture.stop().is_empty());
    }
}
