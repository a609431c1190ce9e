use crate::{BlobStore, DecodedBuffer, Player};

use std::{sync::Arc, time::Duration};

const SAMPLE_RATE: u32 = 48_000;

fn empty_buffer() -> Arc<DecodedBuffer> {
    Arc::new(DecodedBuffer::new(vec![Vec::new()], SAMPLE_RATE))
}

/// WHAT: A zero-frame buffer completes without an output device and
///       without blocking the caller
/// WHY: Stopping a recording right after starting mints a silent
///      zero-frame blob; playing it back must still start cleanly and
///      report completion even when the callback blocks on a runtime
///      channel
#[tokio::test]
async fn given_zero_frame_buffer_when_played_then_completion_delivered() {
    // Given: A player and an empty decoded buffer
    let player = Player::new(BlobStore::new());
    let (tx, mut rx) = tokio::sync::mpsc::channel::<()>(1);

    // When: Playing from a runtime thread with a blocking-send callback,
    // the shape the orchestrator hands to the playback service
    let result = player.play_buffer(
        empty_buffer(),
        Box::new(move || {
            let _ = tx.blocking_send(());
        }),
    );

    // Then: Playback starts and completion arrives; the blocking send
    // never ran on this runtime thread
    assert!(result.is_ok());
    let completed = tokio::time::timeout(Duration::from_secs(1), rx.recv()).await;
    assert_eq!(completed.ok().flatten(), Some(()));
}

/// WHAT: The completion callback never runs on the caller's thread
/// WHY: Callers may sit on an async runtime where blocking is forbidden
#[test]
#[allow(clippy::unwrap_used)]
fn given_zero_frame_buffer_when_played_then_callback_runs_off_thread() {
    // Given: A player, an empty buffer, and the calling thread's id
    let player = Player::new(BlobStore::new());
    let caller = std::thread::current().id();
    let (tx, rx) = std::sync::mpsc::channel();

    // When: Playing with a callback that reports its thread
    player
        .play_buffer(
            empty_buffer(),
            Box::new(move || {
                let _ = tx.send(std::thread::current().id());
            }),
        )
        .unwrap();

    // Then: Completion fired from a different thread
    let callback_thread = rx.recv_timeout(Duration::from_secs(1)).unwrap();
    assert_ne!(callback_thread, caller);
}
