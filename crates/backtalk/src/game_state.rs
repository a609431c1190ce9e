/// Session state owned exclusively by the game orchestrator.
///
/// Capture and playback never mutate this directly; they report results
/// and errors upward and the orchestrator folds them in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    /// The prompt phrase the player is asked to speak.
    pub current_phrase: String,
    /// Whether a recording is in progress.
    pub is_recording: bool,
    /// Whether a completed recording exists for this session.
    pub has_recording: bool,
    /// Placeholder for future scoring logic; never mutated.
    pub score: u32,
    /// Latest user-visible status or error text.
    pub feedback: String,
}

impl GameState {
    /// Fresh state for a session presenting `phrase`.
    pub fn new(phrase: String) -> Self {
        Self {
            current_phrase: phrase,
            is_recording: false,
            has_recording: false,
            score: 0,
            feedback: String::new(),
        }
    }
}
