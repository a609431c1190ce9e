use crate::{AudioBlob, AudioError, AudioHandle, BlobStore};

/// WHAT: Every inserted blob gets a unique fresh handle
/// WHY: Each completed recording must be independently addressable
#[test]
#[allow(clippy::unwrap_used)]
fn given_two_inserts_when_comparing_handles_then_unique() {
    // Given: A store
    let store = BlobStore::new();

    // When: Inserting two blobs
    let first = store.insert(AudioBlob::new(vec![1], None));
    let second = store.insert(AudioBlob::new(vec![2], None));

    // Then: Handles differ and each resolves to its own bytes
    assert_ne!(first, second);
    assert_eq!(store.resolve(&first).unwrap().bytes(), &[1]);
    assert_eq!(store.resolve(&second).unwrap().bytes(), &[2]);
}

/// WHAT: Unknown handles fail with UnresolvedHandle
/// WHY: Resolution failures are part of the error taxonomy, not panics
#[test]
fn given_empty_store_when_resolving_then_unresolved_error() {
    // Given: An empty store and a handle nobody registered
    let store = BlobStore::new();
    let handle = AudioHandle::fixed("prompt");

    // When: Resolving the handle
    let result = store.resolve(&handle);

    // Then: UnresolvedHandle error naming the handle
    assert!(matches!(
        result,
        Err(AudioError::UnresolvedHandle { ref handle, .. }) if handle == "prompt"
    ));
}

/// WHAT: Static registration binds a fixed, stable handle
/// WHY: The prompt phrase must resolve under the same handle every time
#[test]
#[allow(clippy::unwrap_used)]
fn given_registered_resource_when_resolving_fixed_handle_then_bytes_match() {
    // Given: A store with a statically registered prompt
    let store = BlobStore::new();
    let handle = AudioHandle::fixed("prompt");
    store.register(handle.clone(), AudioBlob::new(vec![9, 8, 7], Some("wav".to_string())));

    // When: Resolving through a clone of the store (shared map)
    let shared = store.clone();
    let blob = shared.resolve(&handle).unwrap();

    // Then: Same bytes and hint come back
    assert_eq!(blob.bytes(), &[9, 8, 7]);
    assert_eq!(blob.hint(), Some("wav"));
}
