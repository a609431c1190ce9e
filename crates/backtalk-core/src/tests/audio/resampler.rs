use crate::audio::Resampler;

const INPUT_SAMPLE_RATE: u32 = 44_100;
const OUTPUT_SAMPLE_RATE: u32 = 48_000;
const ONE_SECOND_INPUT_FRAMES: usize = INPUT_SAMPLE_RATE as usize;
const ONE_SECOND_OUTPUT_FRAMES: usize = OUTPUT_SAMPLE_RATE as usize;
const LENGTH_TOLERANCE: u64 = 200;
const TEST_SIGNAL_AMPLITUDE: f32 = 0.5;
const MAX_AMPLITUDE: f32 = 1.5;

/// WHAT: Resampler converts 44.1kHz to 48kHz with the expected length
/// WHY: Decoded audio must match the output device rate before streaming
#[test]
#[allow(clippy::unwrap_used)]
fn given_mono_audio_when_upsampling_then_output_length_approximately_correct() {
    // Given: Resampler configured for 44.1kHz -> 48kHz mono
    let mut resampler = Resampler::new(INPUT_SAMPLE_RATE, OUTPUT_SAMPLE_RATE, 1).unwrap();
    let input = vec![TEST_SIGNAL_AMPLITUDE; ONE_SECOND_INPUT_FRAMES];

    // When: Resampling audio data
    let output = resampler.resample(&input).unwrap();

    // Then: Output is approximately 1 second at 48kHz, all finite
    assert!(
        (output.len() as i64 - ONE_SECOND_OUTPUT_FRAMES as i64).unsigned_abs() < LENGTH_TOLERANCE,
        "Expected ~{} samples, got {}",
        ONE_SECOND_OUTPUT_FRAMES,
        output.len()
    );
    assert!(output.iter().all(|&s| s.is_finite()));
}

/// WHAT: Empty samples return empty output
/// WHY: Edge case handling for zero-length input
#[test]
#[allow(clippy::unwrap_used)]
fn given_empty_samples_when_resampling_then_empty_output() {
    // Given: Resampler and empty input
    let mut resampler = Resampler::new(INPUT_SAMPLE_RATE, OUTPUT_SAMPLE_RATE, 1).unwrap();
    let empty: Vec<f32> = vec![];

    // When: Resampling empty data
    let output = resampler.resample(&empty).unwrap();

    // Then: Output is also empty
    assert!(output.is_empty());
}

/// WHAT: Stereo resampling preserves frame structure and signal bounds
/// WHY: Interleaved multi-channel frames must survive rate conversion
#[test]
#[allow(clippy::unwrap_used)]
fn given_stereo_tone_when_resampling_then_output_is_frame_aligned() {
    // Given: Resampler for stereo and an interleaved tone signal
    let mut resampler = Resampler::new(INPUT_SAMPLE_RATE, OUTPUT_SAMPLE_RATE, 2).unwrap();
    let frames = 4410;
    let input: Vec<f32> = (0..frames)
        .flat_map(|i| {
            let s = (i as f32 * 0.1).sin() * TEST_SIGNAL_AMPLITUDE;
            [s, -s]
        })
        .collect();

    // When: Resampling the stereo signal
    let output = resampler.resample(&input).unwrap();

    // Then: Output splits into whole frames with bounded finite samples
    assert_eq!(output.len() % 2, 0);
    let expected_frames = frames * OUTPUT_SAMPLE_RATE as usize / INPUT_SAMPLE_RATE as usize;
    assert!(
        ((output.len() / 2) as i64 - expected_frames as i64).unsigned_abs() < LENGTH_TOLERANCE,
        "Expected ~{} frames, got {}",
        expected_frames,
        output.len() / 2
    );
    assert!(
        output
            .iter()
            .all(|&s| s.is_finite() && s.abs() <= MAX_AMPLITUDE)
    );
}
