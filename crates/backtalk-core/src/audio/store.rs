use crate::{AudioError, CoreResult};

use std::{
    collections::HashMap,
    fmt,
    panic::Location,
    sync::{Arc, Mutex},
};

use error_location::ErrorLocation;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Opaque reference to a byte-backed audio resource.
///
/// Fresh recordings get a unique handle; static resources (the prompt
/// phrase) are registered under a fixed, stable handle.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AudioHandle(String);

impl AudioHandle {
    /// Mints a fresh, unique handle for a new recording.
    pub fn fresh() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// A fixed handle for a static resource.
    pub fn fixed(name: &str) -> Self {
        Self(name.to_string())
    }

    /// The underlying identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AudioHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Encoded audio bytes plus an optional container hint for the decoder.
#[derive(Debug, Clone)]
pub struct AudioBlob {
    bytes: Arc<Vec<u8>>,
    hint: Option<String>,
}

impl AudioBlob {
    /// Wraps encoded bytes, optionally tagged with a container extension
    /// hint (`"wav"`, `"mp3"`, ...) for format probing.
    pub fn new(bytes: Vec<u8>, hint: Option<String>) -> Self {
        Self {
            bytes: Arc::new(bytes),
            hint,
        }
    }

    /// The encoded bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Container extension hint recorded at capture or registration time.
    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }
}

/// Shared in-memory mapping from [`AudioHandle`] to [`AudioBlob`].
///
/// Recorded blobs and statically registered resources resolve through the
/// same path, so every caller gets the same byte-decoding contract. Clones
/// share the underlying map.
#[derive(Debug, Clone, Default)]
pub struct BlobStore {
    blobs: Arc<Mutex<HashMap<AudioHandle, AudioBlob>>>,
}

impl BlobStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a blob under a fresh handle and returns the handle.
    pub fn insert(&self, blob: AudioBlob) -> AudioHandle {
        let handle = AudioHandle::fresh();
        let mut blobs = self.lock();
        blobs.insert(handle.clone(), blob);
        debug!(handle = %handle, count = blobs.len(), "Blob stored");
        handle
    }

    /// Binds a blob to a fixed handle, replacing any previous binding.
    ///
    /// Used for static resources such as the prompt phrase audio.
    pub fn register(&self, handle: AudioHandle, blob: AudioBlob) {
        info!(handle = %handle, bytes = blob.bytes().len(), "Static audio registered");
        self.lock().insert(handle, blob);
    }

    /// Resolves a handle to its blob.
    ///
    /// # Errors
    ///
    /// Returns [`AudioError::UnresolvedHandle`] when nothing is stored
    /// under `handle`.
    #[track_caller]
    pub fn resolve(&self, handle: &AudioHandle) -> CoreResult<AudioBlob> {
        self.lock()
            .get(handle)
            .cloned()
            .ok_or_else(|| AudioError::UnresolvedHandle {
                handle: handle.to_string(),
                location: ErrorLocation::from(Location::caller()),
            })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<AudioHandle, AudioBlob>> {
        // Recover from lock poison; the map data is still valid.
        self.blobs.lock().unwrap_or_else(|e| {
            error!("Blob store lock poisoned, recovering: {}", e);
            e.into_inner()
        })
    }
}
