use crate::{
    AudioError, CoreResult,
    audio::{
        Resampler,
        decoder::{DecodedBuffer, decode},
        store::{AudioHandle, BlobStore},
    },
};

use std::{
    panic::Location,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};

use cpal::{
    SampleFormat,
    traits::{DeviceTrait, HostTrait, StreamTrait},
};
use error_location::ErrorLocation;
use tracing::{debug, error, info, instrument};

/// Completion callback invoked exactly once when playback naturally ends
/// (or the output stream fails after starting).
pub type OnComplete = Box<dyn FnOnce() + Send + 'static>;

/// Plays decoded audio on the default output device at full volume.
///
/// Playback has no pause/seek/cancel: once started it runs to completion.
/// Concurrent calls are not coordinated — each opens an independent output
/// stream.
pub struct Player {
    store: BlobStore,
}

impl Player {
    /// Creates a player over a blob store.
    pub fn new(store: BlobStore) -> Self {
        Self { store }
    }

    /// Forward playback of the audio behind `handle` at natural speed.
    ///
    /// Resolves and decodes the bytes (uncached — forward playback never
    /// touches the reversed-buffer cache), then streams them. Returns once
    /// playback has started; `on_complete` fires when it ends.
    ///
    /// # Errors
    ///
    /// Returns [`AudioError::UnresolvedHandle`], [`AudioError::DecodeFailed`],
    /// or [`AudioError::PlaybackError`] when the output device is missing.
    #[track_caller]
    #[instrument(skip(self, on_complete), fields(handle = %handle))]
    pub fn play(&self, handle: &AudioHandle, on_complete: OnComplete) -> CoreResult<()> {
        let blob = self.store.resolve(handle)?;
        let buffer = Arc::new(decode(&blob)?);
        self.play_buffer(buffer, on_complete)
    }

    /// Streams an already-decoded buffer to the output device.
    ///
    /// Sample values pass through unscaled (full volume). The cpal stream
    /// is `!Send`, so it is built and owned by a dedicated thread; this
    /// call returns once that thread is spawned with playable samples.
    /// `on_complete` always runs on a playback thread, never on the
    /// caller's thread, so callers on an async runtime may block in it.
    ///
    /// # Errors
    ///
    /// Returns [`AudioError::PlaybackError`] when no output device exists
    /// or its configuration cannot be read, [`AudioError::ResamplingError`]
    /// when rate conversion fails.
    #[track_caller]
    #[instrument(skip(self, buffer, on_complete), fields(frames = buffer.frames()))]
    pub fn play_buffer(&self, buffer: Arc<DecodedBuffer>, on_complete: OnComplete) -> CoreResult<()> {
        if buffer.frames() == 0 {
            // Nothing to stream; no device needed. Completion still fires
            // off-thread to keep the callback contract.
            debug!("Empty buffer, completing on a detached thread");
            std::thread::spawn(on_complete);
            return Ok(());
        }

        let host = cpal::default_host();

        let device = host
            .default_output_device()
            .ok_or(AudioError::PlaybackError {
                reason: "No output device found".to_string(),
                location: ErrorLocation::from(Location::caller()),
            })?;

        let supported = device
            .default_output_config()
            .map_err(|e| AudioError::PlaybackError {
                reason: format!("Failed to get output config: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        let out_rate = supported.sample_rate();
        let out_channels = usize::from(supported.channels());

        // Adapt the buffer to the device on the calling thread so rate
        // conversion errors surface synchronously.
        let mut samples = buffer.interleaved();
        if buffer.sample_rate() != out_rate {
            let mut resampler =
                Resampler::new(buffer.sample_rate(), out_rate, buffer.channel_count())?;
            samples = resampler.resample(&samples)?;
        }
        let samples = map_channels(&samples, buffer.channel_count(), out_channels);

        let total_frames = samples.len() / out_channels;
        let expected = Duration::from_secs_f64(total_frames as f64 / f64::from(out_rate));

        info!(
            frames = total_frames,
            sample_rate = out_rate,
            channels = out_channels,
            duration_ms = expected.as_millis(),
            "Playback starting"
        );

        std::thread::spawn(move || {
            let done = Arc::new(AtomicBool::new(false));
            let done_cb = Arc::clone(&done);
            let mut position = 0usize;

            let sample_format = supported.sample_format();
            let config: cpal::StreamConfig = supported.into();

            let stream = match sample_format {
                SampleFormat::F32 => device.build_output_stream(
                    &config,
                    move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                        for slot in data.iter_mut() {
                            *slot = match samples.get(position) {
                                Some(&s) => {
                                    position += 1;
                                    s
                                }
                                None => {
                                    done_cb.store(true, Ordering::Release);
                                    0.0
                                }
                            };
                        }
                    },
                    |err| error!("Output stream error: {}", err),
                    None,
                ),
                SampleFormat::I16 => device.build_output_stream(
                    &config,
                    move |data: &mut [i16], _: &cpal::OutputCallbackInfo| {
                        for slot in data.iter_mut() {
                            *slot = match samples.get(position) {
                                Some(&s) => {
                                    position += 1;
                                    (s.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16
                                }
                                None => {
                                    done_cb.store(true, Ordering::Release);
                                    0
                                }
                            };
                        }
                    },
                    |err| error!("Output stream error: {}", err),
                    None,
                ),
                other => {
                    error!(format = ?other, "Unsupported output sample format");
                    on_complete();
                    return;
                }
            };

            let stream = match stream {
                Ok(s) => s,
                Err(e) => {
                    error!("Failed to build output stream: {}", e);
                    on_complete();
                    return;
                }
            };

            if let Err(e) = stream.play() {
                error!("Failed to start output stream: {}", e);
                on_complete();
                return;
            }

            // Wait for the callback to drain the samples. The deadline is a
            // backstop for backends that stall without reporting an error.
            let deadline = Instant::now() + expected + Duration::from_secs(2);
            while !done.load(Ordering::Acquire) && Instant::now() < deadline {
                std::thread::sleep(Duration::from_millis(20));
            }

            drop(stream);
            debug!("Playback complete");
            on_complete();
        });

        Ok(())
    }
}

/// Maps interleaved frames from `in_channels` to `out_channels`, repeating
/// the last source channel when the device has more channels and dropping
/// extras when it has fewer.
fn map_channels(samples: &[f32], in_channels: usize, out_channels: usize) -> Vec<f32> {
    if in_channels == out_channels || in_channels == 0 {
        return samples.to_vec();
    }
    let frames = samples.len() / in_channels;
    let mut out = Vec::with_capacity(frames * out_channels);
    for frame in 0..frames {
        let base = frame * in_channels;
        for ch in 0..out_channels {
            out.push(samples[base + ch.min(in_channels - 1)]);
        }
    }
    out
}
