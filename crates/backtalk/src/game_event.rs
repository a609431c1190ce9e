/// Asynchronous reports from the audio services back to the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    /// A forward or reversed playback ran to its natural end.
    PlaybackFinished,
}
