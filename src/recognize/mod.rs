//! Speech-recognition boundary.
//!
//! This crate does not ship a recognition engine.  [`Recognizer`] is the
//! object-safe capability an engine implements; the coordinator runs it on
//! the blocking thread pool and only ever sees [`TranscriptSegment`]s.
//! [`EngineSlot`] owns whichever engine is currently installed and makes
//! calls after release fail fast instead of dereferencing a dead handle.

pub mod slot;

pub use slot::EngineSlot;

use std::time::Duration;

use thiserror::Error;

// ---------------------------------------------------------------------------
// TranscriptSegment
// ---------------------------------------------------------------------------

/// A time-aligned chunk of recognized text.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptSegment {
    /// Segment text (engines may include leading/trailing whitespace).
    pub text: String,
    /// Offset of the segment start from the beginning of the audio.
    pub start: Duration,
    /// Offset of the segment end from the beginning of the audio.
    pub end: Duration,
}

impl TranscriptSegment {
    pub fn new(text: impl Into<String>, start: Duration, end: Duration) -> Self {
        Self {
            text: text.into(),
            start,
            end,
        }
    }
}

// ---------------------------------------------------------------------------
// RecognitionError
// ---------------------------------------------------------------------------

/// Errors surfaced by the recognition boundary.
#[derive(Debug, Clone, Error)]
pub enum RecognitionError {
    /// No engine is installed in the [`EngineSlot`] (never loaded, or
    /// released).  Fails fast instead of touching a dead engine handle.
    #[error("recognizer engine is not loaded")]
    ContextNotInitialized,

    /// Opaque engine failure.
    #[error("recognition failed: {0}")]
    Engine(String),
}

// ---------------------------------------------------------------------------
// Recognizer trait
// ---------------------------------------------------------------------------

/// Object-safe, thread-safe speech-to-text capability.
///
/// # Contract
///
/// - `samples` is 16 kHz mono f32 PCM.
/// - `language` is an ISO-639-1 code (e.g. `"en"`), chosen by the settings
///   snapshot at the start of the recording cycle.
/// - The call blocks for a time proportional to the audio length; callers
///   run it on a worker context, never on the event or audio threads.
pub trait Recognizer: Send + Sync {
    fn transcribe(
        &self,
        samples: &[f32],
        language: &str,
    ) -> Result<Vec<TranscriptSegment>, RecognitionError>;
}

// Compile-time assertion: Box<dyn Recognizer> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn Recognizer>) {}
};

// ---------------------------------------------------------------------------
// join_segments
// ---------------------------------------------------------------------------

/// Concatenate segment texts into the final transcript.
///
/// Segments are trimmed, blank ones dropped, and the rest joined with single
/// spaces in emission order.
pub fn join_segments(segments: &[TranscriptSegment]) -> String {
    segments
        .iter()
        .map(|s| s.text.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

// ---------------------------------------------------------------------------
// MockRecognizer (test-only)
// ---------------------------------------------------------------------------

/// Canned recognizer for unit tests: returns a fixed segment list or a fixed
/// error, and counts invocations.
#[cfg(test)]
pub struct MockRecognizer {
    response: Result<Vec<TranscriptSegment>, RecognitionError>,
    pub calls: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl MockRecognizer {
    pub fn segments(texts: &[&str]) -> Self {
        let segments = texts
            .iter()
            .enumerate()
            .map(|(i, t)| {
                TranscriptSegment::new(
                    *t,
                    Duration::from_secs(i as u64),
                    Duration::from_secs(i as u64 + 1),
                )
            })
            .collect();
        Self {
            response: Ok(segments),
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            response: Err(RecognitionError::Engine(message.into())),
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
impl Recognizer for MockRecognizer {
    fn transcribe(
        &self,
        _samples: &[f32],
        _language: &str,
    ) -> Result<Vec<TranscriptSegment>, RecognitionError> {
        self.calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.response.clone()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(text: &str) -> TranscriptSegment {
        TranscriptSegment::new(text, Duration::ZERO, Duration::from_secs(1))
    }

    #[test]
    fn segments_join_space_separated_in_order() {
        let segments = vec![seg("hello"), seg("world")];
        assert_eq!(join_segments(&segments), "hello world");
    }

    #[test]
    fn segment_whitespace_is_trimmed_before_joining() {
        // Whisper-style segments often lead with a space.
        let segments = vec![seg(" hello"), seg(" world ")];
        assert_eq!(join_segments(&segments), "hello world");
    }

    #[test]
    fn blank_segments_are_dropped() {
        let segments = vec![seg("hello"), seg("   "), seg("world")];
        assert_eq!(join_segments(&segments), "hello world");
    }

    #[test]
    fn zero_segments_join_to_empty() {
        assert_eq!(join_segments(&[]), "");
    }
}
