//! Audio pipeline — microphone capture → mixdown/resample → session buffer.
//!
//! ```text
//! Microphone → cpal callback → mix_to_mono → resample(16 kHz)
//!            → SampleBuffer (short-held mutex) → Capture::stop() → Vec<f32>
//! ```
//!
//! [`AudioCapture`] owns the hardware stream; the coordinator drives it via
//! the [`Capture`] trait and receives the whole recording as an owned
//! `Vec<f32>` on stop.

pub mod buffer;
pub mod capture;
pub mod resample;

pub use buffer::SampleBuffer;
pub use capture::{AudioCapture, Capture, CaptureError};
pub use resample::{mix_to_mono, resample};

/// Sample rate the recognizer expects, in Hz.
pub const TARGET_SAMPLE_RATE: u32 = 16_000;
