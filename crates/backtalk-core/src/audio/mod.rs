pub(crate) mod capture;
mod decoder;
mod playback;
mod resampler;
mod reverser;
mod store;

pub(crate) use resampler::Resampler;

pub use {
    capture::{CaptureSession, EncodingFormat, FormatChoice},
    decoder::{DecodedBuffer, decode},
    playback::Player,
    reverser::{ReversalEngine, ReversedBufferCache},
    store::{AudioBlob, AudioHandle, BlobStore},
};
