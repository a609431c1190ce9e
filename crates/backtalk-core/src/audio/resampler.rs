use crate::{AudioError, CoreResult};

use std::panic::Location;

use audioadapter_buffers::direct::InterleavedSlice;
use error_location::ErrorLocation;
use rubato::{Fft, FixedSync, Resampler as RubatoResampler};
use tracing::{debug, instrument};

/// Converts interleaved multi-channel audio between sample rates.
///
/// Used at the playback boundary to match a decoded buffer's rate to the
/// output device's rate.
pub(crate) struct Resampler {
    resampler: Fft<f32>,
    input_rate: u32,
    output_rate: u32,
    channels: usize,
    chunk_frames: usize,
}

impl Resampler {
    #[track_caller]
    #[instrument]
    pub fn new(input_rate: u32, output_rate: u32, channels: usize) -> CoreResult<Self> {
        let chunk_frames = 1024;
        let sub_chunks = 2;

        let resampler = Fft::<f32>::new(
            input_rate as usize,
            output_rate as usize,
            chunk_frames,
            sub_chunks,
            channels,
            FixedSync::Input,
        )
        .map_err(|e| AudioError::ResamplingError {
            reason: format!("Failed to create resampler: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        debug!(
            input_rate = input_rate,
            output_rate = output_rate,
            channels = channels,
            chunk_frames = chunk_frames,
            "Resampler initialized"
        );

        Ok(Self {
            resampler,
            input_rate,
            output_rate,
            channels,
            chunk_frames,
        })
    }

    /// Resamples interleaved frames. Empty input yields empty output.
    #[track_caller]
    #[instrument(skip(self, samples))]
    pub fn resample(&mut self, samples: &[f32]) -> CoreResult<Vec<f32>> {
        if samples.is_empty() {
            return Ok(Vec::new());
        }

        let input_frames = samples.len() / self.channels;
        let estimated_frames =
            (input_frames as f64 * self.output_rate as f64 / self.input_rate as f64) as usize;
        let mut output = Vec::with_capacity(estimated_frames * self.channels);

        let chunk_samples = self.chunk_frames * self.channels;
        for chunk in samples.chunks(chunk_samples) {
            let input_chunk = if chunk.len() < chunk_samples {
                let mut padded = chunk.to_vec();
                padded.resize(chunk_samples, 0.0);
                padded
            } else {
                chunk.to_vec()
            };

            let input_adapter = InterleavedSlice::new(&input_chunk, self.channels, self.chunk_frames)
                .map_err(|e| AudioError::ResamplingError {
                    reason: format!("Failed to create input adapter: {}", e),
                    location: ErrorLocation::from(Location::caller()),
                })?;

            let output_frames = self.resampler.output_frames_max();
            let mut output_chunk = vec![0.0f32; output_frames * self.channels];

            let mut output_adapter =
                InterleavedSlice::new_mut(&mut output_chunk, self.channels, output_frames)
                    .map_err(|e| AudioError::ResamplingError {
                        reason: format!("Failed to create output adapter: {}", e),
                        location: ErrorLocation::from(Location::caller()),
                    })?;

            let (_input_frames, output_frames_written) = self
                .resampler
                .process_into_buffer(&input_adapter, &mut output_adapter, None)
                .map_err(|e| AudioError::ResamplingError {
                    reason: format!("Resampling failed: {}", e),
                    location: ErrorLocation::from(Location::caller()),
                })?;

            output.extend_from_slice(&output_chunk[..output_frames_written * self.channels]);
        }

        output.truncate(estimated_frames * self.channels);

        debug!(
            input_len = samples.len(),
            output_len = output.len(),
            input_rate = self.input_rate,
            output_rate = self.output_rate,
            "Resampled audio"
        );

        Ok(output)
    }
}
