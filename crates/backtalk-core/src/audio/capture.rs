use crate::{
    AudioError, CoreResult,
    audio::store::{AudioBlob, AudioHandle, BlobStore},
};

use std::{
    collections::VecDeque,
    io::Cursor,
    panic::Location,
    sync::{
        atomic::{AtomicBool, Ordering},
        {Arc, Mutex},
    },
};

use cpal::{
    Device, SampleFormat, Stream, StreamConfig,
    traits::{DeviceTrait, HostTrait, StreamTrait},
};
use error_location::ErrorLocation;
use hound::{SampleFormat as WavSampleFormat, WavSpec, WavWriter};
use tracing::{debug, error, info, instrument};

/// Maximum samples to buffer (5 minutes at 48kHz mono).
/// Prevents unbounded memory growth if a recording is never stopped.
pub(crate) const MAX_BUFFER_SAMPLES: usize = 48_000 * 60 * 5;

/// Sample encoding used when finalizing a recording blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingFormat {
    /// 32-bit float WAV samples.
    Float32,
    /// 16-bit signed integer WAV samples.
    Int16,
}

/// Outcome of capture format negotiation.
///
/// Negotiation walks an ordered preference list over the formats the input
/// device supports; when none of the preferred formats are available the
/// platform default is used and the blob gets the default encoding tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatChoice {
    /// A preferred format was supported and selected.
    Chosen(EncodingFormat),
    /// No preferred format supported; the device default is used.
    Default,
}

impl FormatChoice {
    /// The encoding tag for the finalized blob. The default choice falls
    /// back to 16-bit PCM.
    pub fn encoding(self) -> EncodingFormat {
        match self {
            FormatChoice::Chosen(format) => format,
            FormatChoice::Default => EncodingFormat::Int16,
        }
    }
}

/// Selects a capture format from the device's supported sample formats.
///
/// Preference order: f32, then i16, otherwise the device default.
pub(crate) fn negotiate_format(supported: &[SampleFormat]) -> FormatChoice {
    if supported.contains(&SampleFormat::F32) {
        FormatChoice::Chosen(EncodingFormat::Float32)
    } else if supported.contains(&SampleFormat::I16) {
        FormatChoice::Chosen(EncodingFormat::Int16)
    } else {
        FormatChoice::Default
    }
}

/// Owns the microphone for the record/stop lifecycle.
///
/// States: `idle` (no stream) and `recording` (live input stream). The
/// device is acquired lazily on the first [`start`](Self::start) and kept
/// for the session's lifetime, so the permission prompt happens at most
/// once. Dropping the stream in [`stop`](Self::stop) releases the hardware
/// exactly once per recording.
pub struct CaptureSession {
    device: Option<Device>,
    config: Option<StreamConfig>,
    choice: Option<FormatChoice>,
    stream: Option<Stream>,
    samples: Arc<Mutex<VecDeque<f32>>>,
    /// Signals the audio callback to stop writing. Set to `true` before
    /// dropping the stream so no in-flight callback writes after the lock
    /// is acquired in `stop()`.
    shutdown: Arc<AtomicBool>,
}

impl Default for CaptureSession {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureSession {
    /// Creates an idle session. Does not touch the hardware.
    pub fn new() -> Self {
        Self {
            device: None,
            config: None,
            choice: None,
            stream: None,
            samples: Arc::new(Mutex::new(VecDeque::with_capacity(MAX_BUFFER_SAMPLES))),
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether a recording is currently in progress.
    pub fn is_recording(&self) -> bool {
        self.stream.is_some()
    }

    /// Acquires the input device and negotiates the capture format.
    /// Called once, lazily, from the first `start()`.
    #[track_caller]
    fn acquire(&mut self) -> CoreResult<()> {
        if self.device.is_some() {
            return Ok(());
        }

        let host = cpal::default_host();

        let device = host
            .default_input_device()
            .ok_or(AudioError::MicrophoneUnavailable {
                location: ErrorLocation::from(Location::caller()),
            })?;

        let default_config = device
            .default_input_config()
            .map_err(|e| AudioError::DeviceError {
                reason: format!("Failed to get input config: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        let supported: Vec<SampleFormat> = match device.supported_input_configs() {
            Ok(ranges) => ranges.map(|r| r.sample_format()).collect(),
            Err(_) => vec![default_config.sample_format()],
        };
        let choice = negotiate_format(&supported);

        info!(
            device_id = ?device.id(),
            sample_rate = default_config.sample_rate(),
            channels = default_config.channels(),
            format = ?choice,
            "Microphone acquired"
        );

        self.device = Some(device);
        self.config = Some(default_config.into());
        self.choice = Some(choice);

        Ok(())
    }

    /// Starts capturing from the microphone. No-op when already recording.
    ///
    /// # Errors
    ///
    /// Returns [`AudioError::MicrophoneUnavailable`] when no input device
    /// exists, or [`AudioError::DeviceError`] when the stream cannot be
    /// built or started.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn start(&mut self) -> CoreResult<()> {
        if self.stream.is_some() {
            debug!("start() while recording, ignoring");
            return Ok(());
        }

        self.acquire()?;

        let samples = Arc::clone(&self.samples);
        let shutdown = Arc::clone(&self.shutdown);

        // Reset shutdown flag for the new recording
        self.shutdown.store(false, Ordering::Release);

        // Clear any samples from a previous session so no chunk leaks
        // into the next blob
        samples
            .lock()
            .map_err(|e| AudioError::DeviceError {
                reason: format!("Failed to lock samples: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?
            .clear();

        let (device, config, choice) = match (&self.device, &self.config, self.choice) {
            (Some(d), Some(c), Some(f)) => (d, c, f),
            _ => {
                return Err(AudioError::DeviceError {
                    reason: "Microphone not acquired".to_string(),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        };

        let err_fn = |err| {
            error!("Audio stream error: {}", err);
        };

        let stream = match choice.encoding() {
            EncodingFormat::Float32 => device.build_input_stream(
                config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    push_samples(&samples, &shutdown, data.iter().copied());
                },
                err_fn,
                None,
            ),
            EncodingFormat::Int16 => device.build_input_stream(
                config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    push_samples(
                        &samples,
                        &shutdown,
                        data.iter().map(|&s| f32::from(s) / 32_768.0),
                    );
                },
                err_fn,
                None,
            ),
        }
        .map_err(|e| AudioError::DeviceError {
            reason: format!("Failed to build stream: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        stream.play().map_err(|e| AudioError::DeviceError {
            reason: format!("Failed to start stream: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        self.stream = Some(stream);
        info!("Recording started");

        Ok(())
    }

    /// Stops the recording, finalizes the captured samples into a WAV blob,
    /// and stores it under a fresh handle.
    ///
    /// No-op from `idle`: returns `Ok(None)` without producing a handle.
    ///
    /// # Errors
    ///
    /// Returns [`AudioError::DeviceError`] when the sample buffer cannot be
    /// drained or the blob cannot be finalized.
    #[track_caller]
    #[instrument(skip(self, store))]
    pub fn stop(&mut self, store: &BlobStore) -> CoreResult<Option<AudioHandle>> {
        let Some(stream) = self.stream.take() else {
            debug!("stop() while idle, ignoring");
            return Ok(None);
        };

        // Signal the callback to stop writing BEFORE dropping the stream,
        // so no write lands after we drain the buffer below.
        self.shutdown.store(true, Ordering::Release);

        drop(stream);
        // Brief yield so any in-flight callback observes the shutdown flag.
        std::thread::sleep(std::time::Duration::from_millis(5));
        info!("Recording stopped, microphone released");

        let samples: Vec<f32> = {
            let mut buf = self.samples.lock().map_err(|e| AudioError::DeviceError {
                reason: format!("Failed to lock samples: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;
            let drained = buf.iter().copied().collect();
            buf.clear();
            drained
        };

        let (channels, sample_rate) = match &self.config {
            Some(config) => (config.channels, config.sample_rate),
            None => {
                return Err(AudioError::DeviceError {
                    reason: "Stream config missing after capture".to_string(),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        };

        // Default tag when negotiation fell through to the device default.
        let encoding = self.choice.map_or(EncodingFormat::Int16, FormatChoice::encoding);
        let bytes = encode_wav(&samples, channels, sample_rate, encoding)?;

        let handle = store.insert(AudioBlob::new(bytes, Some("wav".to_string())));

        debug!(
            handle = %handle,
            sample_count = samples.len(),
            encoding = ?encoding,
            "Recording finalized"
        );

        Ok(Some(handle))
    }
}

/// Appends callback samples to the shared buffer, respecting the shutdown
/// flag and the ring cap.
fn push_samples(
    samples: &Arc<Mutex<VecDeque<f32>>>,
    shutdown: &Arc<AtomicBool>,
    data: impl Iterator<Item = f32>,
) {
    // Once stop() sets this flag, no new samples are written even if CPAL
    // fires one more callback before the stream is dropped.
    if shutdown.load(Ordering::Acquire) {
        return;
    }
    // Recover from lock poison rather than silently dropping audio.
    let mut buf = samples.lock().unwrap_or_else(|e| {
        error!("Sample buffer lock poisoned, recovering: {}", e);
        e.into_inner()
    });
    buf.extend(data);
    while buf.len() > MAX_BUFFER_SAMPLES {
        buf.pop_front();
    }
}

/// Encodes captured f32 samples into an in-memory WAV blob.
#[track_caller]
pub(crate) fn encode_wav(
    samples: &[f32],
    channels: u16,
    sample_rate: u32,
    encoding: EncodingFormat,
) -> CoreResult<Vec<u8>> {
    let spec = match encoding {
        EncodingFormat::Float32 => WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 32,
            sample_format: WavSampleFormat::Float,
        },
        EncodingFormat::Int16 => WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: WavSampleFormat::Int,
        },
    };

    let finalize_err = |e: hound::Error| AudioError::DeviceError {
        reason: format!("Failed to finalize recording: {}", e),
        location: ErrorLocation::from(Location::caller()),
    };

    let mut bytes = Vec::new();
    let mut writer = WavWriter::new(Cursor::new(&mut bytes), spec).map_err(finalize_err)?;

    match encoding {
        EncodingFormat::Float32 => {
            for &sample in samples {
                writer.write_sample(sample).map_err(finalize_err)?;
            }
        }
        EncodingFormat::Int16 => {
            for &sample in samples {
                let quantized = (sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16;
                writer.write_sample(quantized).map_err(finalize_err)?;
            }
        }
    }

    writer.finalize().map_err(finalize_err)?;

    Ok(bytes)
}
