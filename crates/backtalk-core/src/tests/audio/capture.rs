use crate::audio::capture::{EncodingFormat, FormatChoice, MAX_BUFFER_SAMPLES, negotiate_format};
use crate::{BlobStore, CaptureSession};

use std::collections::VecDeque;

use cpal::SampleFormat;

/// WHAT: Format negotiation prefers f32 over everything else
/// WHY: f32 capture avoids a quantization step before WAV finalization
#[test]
fn given_f32_supported_when_negotiating_then_f32_chosen() {
    // Given: Device supporting both preferred formats
    let supported = [SampleFormat::I16, SampleFormat::F32];

    // When: Negotiating the capture format
    let choice = negotiate_format(&supported);

    // Then: f32 wins per the ordered preference list
    assert_eq!(choice, FormatChoice::Chosen(EncodingFormat::Float32));
}

/// WHAT: Format negotiation falls back to i16 when f32 is unsupported
/// WHY: The preference list must be ordered, not first-supported
#[test]
fn given_only_i16_supported_when_negotiating_then_i16_chosen() {
    // Given: Device without f32 support
    let supported = [SampleFormat::U16, SampleFormat::I16];

    // When: Negotiating the capture format
    let choice = negotiate_format(&supported);

    // Then: i16 fallback is selected
    assert_eq!(choice, FormatChoice::Chosen(EncodingFormat::Int16));
}

/// WHAT: Negotiation yields the tagged default when no preferred format exists
/// WHY: The device default path must be explicit, not a silent fallthrough
#[test]
fn given_no_preferred_format_when_negotiating_then_default_with_i16_tag() {
    // Given: Device supporting neither f32 nor i16
    let supported = [SampleFormat::U8];

    // When: Negotiating the capture format
    let choice = negotiate_format(&supported);

    // Then: Default choice, tagged with the 16-bit PCM fallback encoding
    assert_eq!(choice, FormatChoice::Default);
    assert_eq!(choice.encoding(), EncodingFormat::Int16);
}

/// WHAT: stop() with no prior start() is a no-op
/// WHY: The idle -> idle transition must not mint a handle or touch hardware
#[test]
fn given_idle_session_when_stopping_then_no_handle_produced() {
    // Given: A session that never started recording
    let store = BlobStore::new();
    let mut session = CaptureSession::new();

    // When: Stopping from idle
    let result = session.stop(&store);

    // Then: No handle, still idle
    assert!(matches!(result, Ok(None)));
    assert!(!session.is_recording());
}

/// WHAT: Capture buffer respects MAX_BUFFER_SAMPLES limit
/// WHY: Prevents unbounded memory growth if a recording is never stopped
#[test]
fn given_buffer_at_max_capacity_when_adding_samples_then_oldest_discarded() {
    // Given: A VecDeque at max capacity filled with 0.0
    let mut buf = VecDeque::with_capacity(MAX_BUFFER_SAMPLES);
    buf.extend(std::iter::repeat(0.0f32).take(MAX_BUFFER_SAMPLES));

    // When: Adding 1024 new samples (value 1.0) beyond the limit
    buf.extend(std::iter::repeat(1.0f32).take(1024));
    while buf.len() > MAX_BUFFER_SAMPLES {
        buf.pop_front();
    }

    // Then: Buffer stays at the cap and newest samples are preserved
    assert_eq!(buf.len(), MAX_BUFFER_SAMPLES);
    assert!((buf[MAX_BUFFER_SAMPLES - 1] - 1.0).abs() < f32::EPSILON);
    assert!((buf[MAX_BUFFER_SAMPLES - 1024] - 1.0).abs() < f32::EPSILON);
}

/// WHAT: A start/stop cycle produces exactly one fresh, resolvable handle
/// WHY: The full capture lifecycle needs a real microphone to verify
#[test]
#[ignore] // Requires a microphone - run manually with: cargo test -- --ignored
#[allow(clippy::unwrap_used)]
fn given_recording_session_when_stopped_then_fresh_handle_resolves() {
    // Given: A started recording
    let store = BlobStore::new();
    let mut session = CaptureSession::new();
    session.start().unwrap();
    assert!(session.is_recording());
    std::thread::sleep(std::time::Duration::from_millis(500));

    // When: Stopping the recording
    let handle = session.stop(&store).unwrap();

    // Then: Session is idle and the handle resolves to a WAV blob
    assert!(!session.is_recording());
    let handle = handle.unwrap();
    let blob = store.resolve(&handle).unwrap();
    assert!(!blob.bytes().is_empty());
    assert_eq!(blob.hint(), Some("wav"));
}
