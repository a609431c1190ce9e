use crate::{AudioError, CoreResult, audio::store::AudioBlob};

use std::{io::Cursor, panic::Location};

use error_location::ErrorLocation;
use symphonia::core::{
    audio::SampleBuffer,
    codecs::{CODEC_TYPE_NULL, DecoderOptions},
    errors::Error as SymphoniaError,
    formats::FormatOptions,
    io::MediaSourceStream,
    meta::MetadataOptions,
    probe::Hint,
};
use tracing::{debug, instrument, warn};

/// Decoded multi-channel audio, planar f32 samples tagged with sample rate.
///
/// Produced only by [`decode`]. Once reversed and cached the buffer is
/// never mutated again.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedBuffer {
    channels: Vec<Vec<f32>>,
    sample_rate: u32,
}

impl DecodedBuffer {
    /// Builds a buffer from planar channel data.
    pub fn new(channels: Vec<Vec<f32>>, sample_rate: u32) -> Self {
        Self {
            channels,
            sample_rate,
        }
    }

    /// Number of channels.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Frames per channel.
    pub fn frames(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Samples of one channel.
    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    /// Reverses the sample order independently within every channel,
    /// in place. Sample values, per-channel length, channel count, and
    /// sample rate are unchanged; applying twice restores the original.
    pub fn reverse_channels(&mut self) {
        for channel in &mut self.channels {
            channel.reverse();
        }
    }

    /// Interleaves the planar channels for output streaming.
    pub fn interleaved(&self) -> Vec<f32> {
        let frames = self.frames();
        let mut out = Vec::with_capacity(frames * self.channels.len());
        for frame in 0..frames {
            for channel in &self.channels {
                out.push(channel.get(frame).copied().unwrap_or(0.0));
            }
        }
        out
    }
}

/// Decodes a blob's encoded bytes into a planar [`DecodedBuffer`].
///
/// The container format is probed from the bytes, helped by the blob's
/// extension hint when one was recorded.
///
/// # Errors
///
/// Returns [`AudioError::DecodeFailed`] when the bytes are not valid audio
/// (unprobeable, no audio track, or decoding fails outright).
#[track_caller]
#[instrument(skip(blob), fields(bytes = blob.bytes().len()))]
pub fn decode(blob: &AudioBlob) -> CoreResult<DecodedBuffer> {
    let caller = Location::caller();
    let decode_err = move |reason: String| AudioError::DecodeFailed {
        reason,
        location: ErrorLocation::from(caller),
    };

    let cursor = Cursor::new(blob.bytes().to_vec());
    let mss = MediaSourceStream::new(Box::new(cursor), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = blob.hint() {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| decode_err(format!("Unrecognized audio format: {}", e)))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| decode_err("No audio track found".to_string()))?;

    let track_id = track.id;
    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| decode_err(format!("Failed to create decoder: {}", e)))?;

    let mut channels: Vec<Vec<f32>> = Vec::new();
    let mut sample_rate = track.codec_params.sample_rate.unwrap_or(0);
    let mut sample_buf: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(SymphoniaError::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(SymphoniaError::ResetRequired) => {
                decoder.reset();
                continue;
            }
            Err(e) => return Err(decode_err(format!("Failed to read packet: {}", e))),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(SymphoniaError::DecodeError(e)) => {
                // Recoverable per-packet corruption; skip and continue
                warn!("Decode error in packet, skipping: {}", e);
                continue;
            }
            Err(e) => return Err(decode_err(format!("Decode failed: {}", e))),
        };

        let spec = *decoded.spec();
        sample_rate = spec.rate;
        let channel_count = spec.channels.count();
        if channels.len() < channel_count {
            channels.resize_with(channel_count, Vec::new);
        }

        let needed = decoded.capacity() * channel_count;
        if sample_buf.as_ref().map_or(true, |b| b.capacity() < needed) {
            sample_buf = Some(SampleBuffer::new(decoded.capacity() as u64, spec));
        }
        let Some(buf) = sample_buf.as_mut() else {
            continue;
        };
        buf.copy_interleaved_ref(decoded);

        // De-interleave into the planar accumulator
        for (i, &sample) in buf.samples().iter().enumerate() {
            channels[i % channel_count].push(sample);
        }
    }

    if sample_rate == 0 {
        return Err(decode_err("Sample rate unknown after decode".to_string()));
    }

    let buffer = DecodedBuffer::new(channels, sample_rate);
    debug!(
        channels = buffer.channel_count(),
        frames = buffer.frames(),
        sample_rate = buffer.sample_rate(),
        "Audio decoded"
    );

    Ok(buffer)
}
