//! BackTalk Core Library
//!
//! Audio capture, decode, time-reversal, and playback pipeline built on
//! CPAL, Symphonia, Hound, and Rubato.
//!
//! # Example
//!
//! ```no_run
//! use backtalk_core::{BlobStore, CaptureSession, CoreResult, ReversalEngine, ReversedBufferCache};
//!
//! use std::{thread::sleep, time::Duration};
//!
//! fn main() -> CoreResult<()> {
//!     let store = BlobStore::new();
//!     let mut session = CaptureSession::new();
//!
//!     session.start()?;
//!     sleep(Duration::from_secs(2));
//!     let handle = session.stop(&store)?;
//!
//!     if let Some(handle) = handle {
//!         let engine = ReversalEngine::new(store.clone(), ReversedBufferCache::new());
//!         let reversed = engine.reversed(&handle)?;
//!         println!("Reversed {} frames", reversed.frames());
//!     }
//!     Ok(())
//! }
//! ```

mod audio;
mod error;

pub use {
    audio::{
        AudioBlob, AudioHandle, BlobStore, CaptureSession, DecodedBuffer, EncodingFormat,
        FormatChoice, Player, ReversalEngine, ReversedBufferCache, decode,
    },
    error::{AudioError, Result as CoreResult},
};
