use crate::{
    CoreResult,
    audio::{
        decoder::{DecodedBuffer, decode},
        store::{AudioHandle, BlobStore},
    },
};

use std::{
    collections::{HashMap, hash_map::Entry},
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use tracing::{debug, error, info, instrument};

/// Shareable mapping from source handle to its decoded, reversed buffer.
///
/// At most one entry exists per handle and once present its value never
/// changes. This is the correctness mechanism that prevents re-reversing a
/// buffer that was already reversed in place: repeat callers get the stored
/// result instead of running the transform again. Population happens under
/// the cache lock, so concurrent first callers for the same handle cannot
/// duplicate the decode.
#[derive(Debug, Clone, Default)]
pub struct ReversedBufferCache {
    entries: Arc<Mutex<HashMap<AudioHandle, Arc<DecodedBuffer>>>>,
}

impl ReversedBufferCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a reversed buffer is cached for `handle`.
    pub fn contains(&self, handle: &AudioHandle) -> bool {
        self.lock().contains_key(handle)
    }

    /// Returns the cached entry for `handle`, or computes, inserts, and
    /// returns it. A failed computation inserts nothing.
    pub fn get_or_try_insert(
        &self,
        handle: &AudioHandle,
        compute: impl FnOnce() -> CoreResult<DecodedBuffer>,
    ) -> CoreResult<Arc<DecodedBuffer>> {
        let mut entries = self.lock();
        match entries.entry(handle.clone()) {
            Entry::Occupied(entry) => Ok(Arc::clone(entry.get())),
            Entry::Vacant(entry) => {
                let buffer = Arc::new(compute()?);
                entry.insert(Arc::clone(&buffer));
                Ok(buffer)
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<AudioHandle, Arc<DecodedBuffer>>> {
        self.entries.lock().unwrap_or_else(|e| {
            error!("Reversed buffer cache lock poisoned, recovering: {}", e);
            e.into_inner()
        })
    }
}

/// Produces time-reversed decoded audio for a handle, memoized per handle.
pub struct ReversalEngine {
    store: BlobStore,
    cache: ReversedBufferCache,
    decodes: AtomicUsize,
}

impl ReversalEngine {
    /// Creates an engine over a blob store with an injected cache.
    pub fn new(store: BlobStore, cache: ReversedBufferCache) -> Self {
        Self {
            store,
            cache,
            decodes: AtomicUsize::new(0),
        }
    }

    /// Returns the reversed buffer for `handle`.
    ///
    /// Cache hit: returns the stored buffer, no decode. Cache miss:
    /// resolves the handle's bytes, decodes them, reverses every channel
    /// in place, caches the result, and returns it. The decode/reverse
    /// work runs at most once per handle.
    ///
    /// # Errors
    ///
    /// Returns [`crate::AudioError::UnresolvedHandle`] when the handle has
    /// no stored bytes, or [`crate::AudioError::DecodeFailed`] when the
    /// bytes are not valid audio. Neither inserts a cache entry.
    #[instrument(skip(self), fields(handle = %handle))]
    pub fn reversed(&self, handle: &AudioHandle) -> CoreResult<Arc<DecodedBuffer>> {
        self.cache.get_or_try_insert(handle, || {
            debug!(handle = %handle, "Cache miss, decoding");
            let blob = self.store.resolve(handle)?;
            self.decodes.fetch_add(1, Ordering::Relaxed);
            let mut buffer = decode(&blob)?;
            buffer.reverse_channels();
            info!(
                handle = %handle,
                frames = buffer.frames(),
                channels = buffer.channel_count(),
                "Reversed buffer cached"
            );
            Ok(buffer)
        })
    }

    /// Number of decode calls the engine has performed. At most one per
    /// distinct handle; cache hits do not increment it.
    pub fn decode_count(&self) -> usize {
        self.decodes.load(Ordering::Relaxed)
    }
}
