//! Scoped ownership of the recognition engine.
//!
//! The engine behind [`Recognizer`](crate::recognize::Recognizer) wraps a
//! native context that is expensive to create and must be released exactly
//! once.  [`EngineSlot`] gives it a guarded home: install once, release
//! explicitly, and any transcription after release fails fast with
//! [`RecognitionError::ContextNotInitialized`] rather than reaching into a
//! dead handle.
//!
//! The coordinator's external reload action re-checks [`EngineSlot::is_loaded`]
//! after the host re-installs an engine.

use std::sync::{Arc, RwLock};

use super::{RecognitionError, Recognizer, TranscriptSegment};

// ---------------------------------------------------------------------------
// EngineSlot
// ---------------------------------------------------------------------------

/// Thread-safe holder for the currently installed recognition engine.
pub struct EngineSlot {
    inner: RwLock<Option<Arc<dyn Recognizer>>>,
}

impl EngineSlot {
    /// A slot with no engine; every transcription fails fast until
    /// [`install`](Self::install) is called.
    pub fn empty() -> Self {
        Self {
            inner: RwLock::new(None),
        }
    }

    /// A slot pre-loaded with `engine`.
    pub fn with_engine(engine: Arc<dyn Recognizer>) -> Self {
        Self {
            inner: RwLock::new(Some(engine)),
        }
    }

    /// Install (or replace) the engine.
    pub fn install(&self, engine: Arc<dyn Recognizer>) {
        *self.inner.write().unwrap() = Some(engine);
        log::info!("recognizer engine installed");
    }

    /// Release the engine.  In-flight transcriptions holding their own
    /// `Arc` finish normally; new calls fail fast.
    pub fn release(&self) {
        if self.inner.write().unwrap().take().is_some() {
            log::info!("recognizer engine released");
        }
    }

    /// Whether an engine is currently installed.
    pub fn is_loaded(&self) -> bool {
        self.inner.read().unwrap().is_some()
    }

    /// Snapshot the current engine handle, if any.
    pub fn engine(&self) -> Option<Arc<dyn Recognizer>> {
        self.inner.read().unwrap().clone()
    }

    /// Transcribe through the installed engine.
    ///
    /// The engine handle is cloned out before the (long) blocking call, so
    /// the slot's lock is never held across inference.
    pub fn transcribe(
        &self,
        samples: &[f32],
        language: &str,
    ) -> Result<Vec<TranscriptSegment>, RecognitionError> {
        let engine = self
            .engine()
            .ok_or(RecognitionError::ContextNotInitialized)?;
        engine.transcribe(samples, language)
    }
}

impl Default for EngineSlot {
    fn default() -> Self {
        Self::empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognize::MockRecognizer;

    #[test]
    fn empty_slot_fails_fast() {
        let slot = EngineSlot::empty();
        assert!(!slot.is_loaded());
        assert!(matches!(
            slot.transcribe(&[0.0; 16_000], "en"),
            Err(RecognitionError::ContextNotInitialized)
        ));
    }

    #[test]
    fn installed_engine_is_used() {
        let slot = EngineSlot::empty();
        slot.install(Arc::new(MockRecognizer::segments(&["hi"])));

        assert!(slot.is_loaded());
        let segments = slot.transcribe(&[0.0; 16_000], "en").unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text, "hi");
    }

    #[test]
    fn released_slot_fails_fast_again() {
        let slot = EngineSlot::with_engine(Arc::new(MockRecognizer::segments(&["hi"])));
        slot.release();

        assert!(!slot.is_loaded());
        assert!(matches!(
            slot.transcribe(&[], "en"),
            Err(RecognitionError::ContextNotInitialized)
        ));
    }

    #[test]
    fn release_is_idempotent() {
        let slot = EngineSlot::empty();
        slot.release();
        slot.release();
        assert!(!slot.is_loaded());
    }

    #[test]
    fn engine_errors_pass_through_opaque() {
        let slot = EngineSlot::with_engine(Arc::new(MockRecognizer::failing("bad weights")));
        assert!(matches!(
            slot.transcribe(&[], "en"),
            Err(RecognitionError::Engine(_))
        ));
    }
}
