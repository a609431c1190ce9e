use error_location::ErrorLocation;
use thiserror::Error;

/// Audio pipeline errors with source location tracking.
#[derive(Error, Debug)]
pub enum AudioError {
    /// Microphone access denied or no input device present.
    #[error("Microphone unavailable {location}")]
    MicrophoneUnavailable {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Audio device operation failed.
    #[error("Audio device error: {reason} {location}")]
    DeviceError {
        /// Description of the device error.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Bytes behind a handle could not be decoded as audio.
    #[error("Decode failed: {reason} {location}")]
    DecodeFailed {
        /// Description of the decode failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Handle does not resolve to any stored audio bytes.
    #[error("No audio stored for handle {handle:?} {location}")]
    UnresolvedHandle {
        /// The handle that failed to resolve.
        handle: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Sample-rate conversion failed.
    #[error("Resampling error: {reason} {location}")]
    ResamplingError {
        /// Description of the resampling error.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Audio output stream could not be opened or started.
    #[error("Playback error: {reason} {location}")]
    PlaybackError {
        /// Description of the playback failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },
}

/// Result type alias using [`AudioError`].
pub type Result<T> = std::result::Result<T, AudioError>;
