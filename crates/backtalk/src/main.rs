//! BackTalk: speak the prompt phrase, then hear it — and yourself — in reverse.

mod config;
mod error;
mod game;
mod game_command;
mod game_event;
mod game_state;

pub(crate) use {
    error::{AppError, Result as AppResult},
    game::Game,
    game_command::GameCommand,
    game_event::GameEvent,
    game_state::GameState,
};

use crate::config::Config;

use std::io::BufRead;

use backtalk_core::{AudioBlob, AudioHandle, BlobStore};
use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};

/// Fixed handle the prompt phrase audio is registered under.
const PROMPT_HANDLE: &str = "prompt";

/// Application entry point.
fn main() {
    tracing_subscriber::fmt()
        .with_env_filter("backtalk=info")
        .init();

    if let Err(e) = run() {
        error!("BackTalk failed to start: {:?}", e);
        std::process::exit(1);
    }
}

fn run() -> AppResult<()> {
    let config = Config::load()?;
    config.validate_media_path()?;

    // Register the static prompt under its fixed handle. Recorded blobs
    // land in the same store, so both resolve through one contract.
    let store = BlobStore::new();
    let prompt_handle = AudioHandle::fixed(PROMPT_HANDLE);
    let bytes = std::fs::read(&config.phrase.media_path)?;
    let hint = config
        .phrase
        .media_path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase);
    store.register(prompt_handle.clone(), AudioBlob::new(bytes, hint));

    let (command_tx, command_rx) = mpsc::channel(32);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    println!("BackTalk — phrase: {}", config.phrase.text);
    println!("  [1] play phrase        [2] phrase reversed");
    println!("  [3] start/stop record  [4] play recording   [5] recording reversed");
    println!("  [q] quit");

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        // Key reader on a blocking task: stdin has no async story worth the
        // dependency, and one parked thread is fine here.
        let reader = tokio::task::spawn_blocking(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                if *shutdown_rx.borrow() {
                    break;
                }
                match GameCommand::parse(line.trim()) {
                    Some(cmd) => {
                        let quit = cmd == GameCommand::Quit;
                        if command_tx.blocking_send(cmd).is_err() || quit {
                            break;
                        }
                    }
                    None => warn!(key = %line.trim(), "Unknown key, ignoring"),
                }
            }
        });

        let game = Game::new(&config, store, prompt_handle, command_rx, shutdown_tx);
        game.run().await;

        match tokio::time::timeout(std::time::Duration::from_secs(1), reader).await {
            Ok(Ok(())) => info!("Key reader stopped cleanly"),
            Ok(Err(e)) => error!(error = ?e, "Key reader task panicked"),
            Err(_) => info!("Key reader still blocked on stdin, will be cleaned up on exit"),
        }
    });

    Ok(())
}
