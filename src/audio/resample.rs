//! Channel mixdown and sample-rate conversion.
//!
//! The recognizer consumes **16 kHz mono `f32`** audio.  The capture stream
//! delivers whatever the device prefers (commonly 44.1 or 48 kHz, often
//! stereo), so every hardware chunk goes through two conversions:
//!
//! 1. [`mix_to_mono`] — average interleaved channels down to one.
//! 2. [`resample`] — convert from the device rate to the target rate.
//!
//! The resampler is plain linear interpolation.  It is not band-limited and
//! aliases slightly on downsampling; speech recognition downstream tolerates
//! that, and the payoff is a cheap O(n) conversion that is safe to run inside
//! the audio callback.

// ---------------------------------------------------------------------------
// mix_to_mono
// ---------------------------------------------------------------------------

/// Mix interleaved multi-channel audio down to mono by averaging each frame.
///
/// The output length is `samples.len() / channels`; a trailing partial frame
/// is dropped.
///
/// * `channels == 1` returns the input as an owned `Vec` without averaging.
/// * `channels == 0` returns an empty vector.
///
/// # Example
///
/// ```rust
/// use holdtype::audio::mix_to_mono;
///
/// let stereo = vec![0.5_f32, -0.5, 0.2, -0.2]; // L R L R
/// let mono = mix_to_mono(&stereo, 2);
/// assert_eq!(mono.len(), 2);
/// assert!((mono[0] - 0.0).abs() < 1e-6);
/// assert!((mono[1] - 0.0).abs() < 1e-6);
/// ```
pub fn mix_to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    match channels {
        0 => Vec::new(),
        1 => samples.to_vec(),
        n => {
            let n = n as usize;
            samples
                .chunks_exact(n)
                .map(|frame| frame.iter().sum::<f32>() / n as f32)
                .collect()
        }
    }
}

// ---------------------------------------------------------------------------
// resample
// ---------------------------------------------------------------------------

/// Resample mono audio from `from_rate` Hz to `to_rate` Hz using linear
/// interpolation.
///
/// * Equal rates return the input unchanged (identity fast path).
/// * Empty input returns an empty vector.
///
/// The output length is `floor(samples.len() * to_rate / from_rate)`.  An
/// input shorter than one output sample's worth simply yields an empty
/// vector — never a panic.
///
/// # Example
///
/// ```rust
/// use holdtype::audio::resample;
///
/// // 480 samples @ 48 kHz (10 ms) → 160 samples @ 16 kHz
/// let hi = vec![0.5_f32; 480];
/// let lo = resample(&hi, 48_000, 16_000);
/// assert_eq!(lo.len(), 160);
/// ```
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate {
        return samples.to_vec();
    }

    if samples.is_empty() || from_rate == 0 || to_rate == 0 {
        return Vec::new();
    }

    let output_len = (samples.len() as u64 * to_rate as u64 / from_rate as u64) as usize;
    let ratio = from_rate as f64 / to_rate as f64;
    let mut output = Vec::with_capacity(output_len);

    for i in 0..output_len {
        let src_pos = i as f64 * ratio;
        let idx = src_pos as usize;
        let frac = (src_pos - idx as f64) as f32;

        let sample = if idx + 1 < samples.len() {
            samples[idx] * (1.0 - frac) + samples[idx + 1] * frac
        } else if idx < samples.len() {
            samples[idx]
        } else {
            0.0
        };

        output.push(sample);
    }

    output
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // ---- mix_to_mono -------------------------------------------------------

    #[test]
    fn mono_input_is_passed_through() {
        let input = vec![0.1_f32, 0.2, 0.3];
        assert_eq!(mix_to_mono(&input, 1), input);
    }

    #[test]
    fn stereo_frames_are_averaged() {
        let input = vec![1.0_f32, -1.0, 0.5, 0.5];
        let out = mix_to_mono(&input, 2);
        assert_eq!(out.len(), 2);
        assert!((out[0] - 0.0).abs() < 1e-6);
        assert!((out[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn four_channel_frame_averages_to_one_sample() {
        let out = mix_to_mono(&[0.4_f32; 4], 4);
        assert_eq!(out.len(), 1);
        assert!((out[0] - 0.4).abs() < 1e-6);
    }

    #[test]
    fn zero_channels_yields_empty() {
        assert!(mix_to_mono(&[1.0_f32, 2.0], 0).is_empty());
    }

    #[test]
    fn trailing_partial_frame_is_dropped() {
        let out = mix_to_mono(&[0.2_f32, 0.4, 0.6], 2);
        assert_eq!(out.len(), 1);
    }

    // ---- resample ----------------------------------------------------------

    #[test]
    fn equal_rates_are_identity() {
        let input: Vec<f32> = (0..160).map(|i| i as f32 / 160.0).collect();
        let out = resample(&input, 16_000, 16_000);
        assert_eq!(out, input);
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(resample(&[], 48_000, 16_000).is_empty());
    }

    #[test]
    fn downsample_48k_to_16k_length() {
        let out = resample(&vec![0.5_f32; 480], 48_000, 16_000);
        assert_eq!(out.len(), 160);
    }

    #[test]
    fn downsample_44100_to_16k_length() {
        // One second of 44.1 kHz audio becomes exactly 16 000 samples.
        let out = resample(&vec![0.0_f32; 44_100], 44_100, 16_000);
        assert_eq!(out.len(), 16_000);
    }

    #[test]
    fn upsample_8k_to_16k_doubles_length() {
        let out = resample(&vec![0.0_f32; 80], 8_000, 16_000);
        assert_eq!(out.len(), 160);
    }

    #[test]
    fn constant_signal_keeps_amplitude() {
        let out = resample(&vec![0.5_f32; 480], 48_000, 16_000);
        for &s in &out {
            assert!((s - 0.5).abs() < 1e-5, "amplitude drift: {s}");
        }
    }

    #[test]
    fn input_shorter_than_ratio_yields_empty_without_panic() {
        // Two samples at 48 kHz are less than one output sample at 16 kHz.
        let out = resample(&[0.1_f32, 0.2], 48_000, 16_000);
        assert!(out.is_empty());
    }
}
