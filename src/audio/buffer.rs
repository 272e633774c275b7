//! Accumulation buffer for one recording session.
//!
//! [`SampleBuffer`] collects 16 kHz mono samples for as long as the hotkey is
//! held.  The audio callback appends to it under a short-held lock; on stop
//! the whole recording is **moved out** with [`take_all`](SampleBuffer::take_all)
//! so the buffer is empty again for the next session and no samples are ever
//! shared between cycles.

// ---------------------------------------------------------------------------
// SampleBuffer
// ---------------------------------------------------------------------------

/// Growable buffer of mono `f32` samples at a fixed sample rate.
///
/// Unlike a ring buffer this never discards data: a push-to-talk recording is
/// bounded by how long the user holds the key, and the recognizer needs the
/// recording from its first sample, not its last.
#[derive(Debug, Default)]
pub struct SampleBuffer {
    samples: Vec<f32>,
}

impl SampleBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty buffer with room for `capacity` samples.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: Vec::with_capacity(capacity),
        }
    }

    /// Append a chunk of samples in order.
    pub fn append(&mut self, chunk: &[f32]) {
        self.samples.extend_from_slice(chunk);
    }

    /// Move the accumulated samples out, leaving the buffer empty.
    pub fn take_all(&mut self) -> Vec<f32> {
        std::mem::take(&mut self.samples)
    }

    /// Discard all samples.
    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Number of samples currently stored.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns `true` when no samples are stored.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Recording duration in seconds, assuming `sample_rate` Hz mono.
    pub fn duration_secs(&self, sample_rate: u32) -> f32 {
        if sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / sample_rate as f32
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_and_take_preserves_order() {
        let mut buf = SampleBuffer::new();
        buf.append(&[1.0_f32, 2.0]);
        buf.append(&[3.0]);

        assert_eq!(buf.len(), 3);
        assert_eq!(buf.take_all(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn take_all_leaves_buffer_empty() {
        let mut buf = SampleBuffer::new();
        buf.append(&[1.0_f32, 2.0]);
        let _ = buf.take_all();

        assert!(buf.is_empty());
        assert_eq!(buf.len(), 0);
    }

    #[test]
    fn take_all_on_empty_buffer_returns_empty() {
        let mut buf = SampleBuffer::new();
        assert_eq!(buf.take_all(), Vec::<f32>::new());
    }

    #[test]
    fn reusable_after_take() {
        let mut buf = SampleBuffer::new();
        buf.append(&[1.0_f32]);
        let _ = buf.take_all();

        buf.append(&[9.0_f32, 8.0]);
        assert_eq!(buf.take_all(), vec![9.0, 8.0]);
    }

    #[test]
    fn clear_discards_samples() {
        let mut buf = SampleBuffer::new();
        buf.append(&[1.0_f32, 2.0]);
        buf.clear();
        assert!(buf.is_empty());
    }

    #[test]
    fn duration_is_len_over_rate() {
        let mut buf = SampleBuffer::new();
        buf.append(&vec![0.0_f32; 8_000]);
        assert!((buf.duration_secs(16_000) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn duration_with_zero_rate_is_zero() {
        let buf = SampleBuffer::new();
        assert_eq!(buf.duration_secs(0), 0.0);
    }
}
