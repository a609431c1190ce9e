use crate::{GameCommand, GameEvent, GameState, config::Config};

use backtalk_core::{
    AudioHandle, BlobStore, CaptureSession, Player, ReversalEngine, ReversedBufferCache,
};
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, instrument};

/// The game orchestrator.
///
/// Owns [`GameState`] exclusively and wires user actions to the capture
/// session, the playback service, and the reversal engine. Every failure
/// in those services is converted into feedback text here; nothing
/// propagates further and nothing is retried.
pub struct Game {
    state: GameState,
    capture: CaptureSession,
    player: Player,
    engine: ReversalEngine,
    prompt_handle: AudioHandle,
    recording_handle: Option<AudioHandle>,
    store: BlobStore,
    command_rx: mpsc::Receiver<GameCommand>,
    event_tx: mpsc::Sender<GameEvent>,
    event_rx: mpsc::Receiver<GameEvent>,
    shutdown_tx: watch::Sender<bool>,
}

impl Game {
    /// Builds a game session around a store holding the prompt blob.
    pub fn new(
        config: &Config,
        store: BlobStore,
        prompt_handle: AudioHandle,
        command_rx: mpsc::Receiver<GameCommand>,
        shutdown_tx: watch::Sender<bool>,
    ) -> Self {
        let (event_tx, event_rx) = mpsc::channel(32);

        Self {
            state: GameState::new(config.phrase.text.clone()),
            capture: CaptureSession::new(),
            player: Player::new(store.clone()),
            engine: ReversalEngine::new(store.clone(), ReversedBufferCache::new()),
            prompt_handle,
            recording_handle: None,
            store,
            command_rx,
            event_tx,
            event_rx,
            shutdown_tx,
        }
    }

    /// Run the main game loop until `Quit` or the command channel closes.
    #[instrument(skip(self))]
    pub async fn run(mut self) {
        info!(phrase = %self.state.current_phrase, "BackTalk ready");

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(cmd) => {
                            if self.handle_command(cmd) {
                                break;
                            }
                        }
                        // Input source is gone (stdin closed); the event
                        // channel can never close us out because we hold a
                        // sender, so this is the shutdown path.
                        None => {
                            info!("Command channel closed, shutting down");
                            break;
                        }
                    }
                }

                Some(event) = self.event_rx.recv() => {
                    self.handle_event(event);
                }
            }
        }

        let _ = self.shutdown_tx.send(true);
        info!("BackTalk shut down");
    }

    /// Dispatches one user action. Returns `true` on quit.
    pub(crate) fn handle_command(&mut self, cmd: GameCommand) -> bool {
        debug!(command = ?cmd, "Handling command");
        match cmd {
            GameCommand::PlayPhrase => self.play_forward(Some(self.prompt_handle.clone())),
            GameCommand::PlayPhraseReversed => {
                self.play_reversed(Some(self.prompt_handle.clone()));
            }
            GameCommand::ToggleRecording => self.toggle_recording(),
            GameCommand::PlayRecording => self.play_forward(self.recording_handle.clone()),
            GameCommand::PlayRecordingReversed => {
                self.play_reversed(self.recording_handle.clone());
            }
            GameCommand::Quit => {
                info!("Quit requested");
                return true;
            }
        }
        false
    }

    pub(crate) fn handle_event(&mut self, event: GameEvent) {
        match event {
            GameEvent::PlaybackFinished => self.set_feedback("Audio Complete"),
        }
    }

    /// Start or stop the capture session and fold the result into state.
    fn toggle_recording(&mut self) {
        if self.capture.is_recording() {
            match self.capture.stop(&self.store) {
                Ok(Some(handle)) => {
                    info!(handle = %handle, "Recording available");
                    self.state.is_recording = false;
                    self.state.has_recording = true;
                    self.recording_handle = Some(handle);
                    self.set_feedback("Recording captured");
                }
                Ok(None) => {
                    self.state.is_recording = false;
                }
                Err(e) => {
                    error!(error = ?e, "Failed to finalize recording");
                    self.state.is_recording = false;
                    self.set_feedback("Error saving recording");
                }
            }
        } else {
            match self.capture.start() {
                Ok(()) => {
                    self.state.is_recording = true;
                    self.set_feedback("Recording...");
                }
                Err(e) => {
                    error!(error = ?e, "Failed to start recording");
                    self.set_feedback("Please enable microphone access to play");
                }
            }
        }
    }

    /// Forward playback at natural speed. No-op without a handle.
    fn play_forward(&mut self, handle: Option<AudioHandle>) {
        let Some(handle) = handle else {
            debug!("No recording yet, ignoring play request");
            return;
        };

        match self.player.play(&handle, self.completion()) {
            Ok(()) => self.set_feedback("Playing Audio..."),
            Err(e) => {
                error!(handle = %handle, error = ?e, "Playback failed");
                self.set_feedback("Error playing audio");
            }
        }
    }

    /// Reversed playback through the memoizing reversal engine. No-op
    /// without a handle.
    fn play_reversed(&mut self, handle: Option<AudioHandle>) {
        let Some(handle) = handle else {
            debug!("No recording yet, ignoring reversed play request");
            return;
        };

        let result = self
            .engine
            .reversed(&handle)
            .and_then(|buffer| self.player.play_buffer(buffer, self.completion()));

        match result {
            Ok(()) => self.set_feedback("Playing audio in reverse"),
            Err(e) => {
                error!(handle = %handle, error = ?e, "Reversed playback failed");
                self.set_feedback("Error playing reversed audio");
            }
        }
    }

    /// Completion callback handed to the playback service; reports back
    /// on the event channel from the playback thread.
    fn completion(&self) -> Box<dyn FnOnce() + Send + 'static> {
        let tx = self.event_tx.clone();
        Box::new(move || {
            let _ = tx.blocking_send(GameEvent::PlaybackFinished);
        })
    }

    /// Current session state (read-only outside the orchestrator).
    pub(crate) fn state(&self) -> &GameState {
        &self.state
    }

    fn set_feedback(&mut self, text: &str) {
        self.state.feedback = text.to_string();
        println!("{}", text);
    }
}
