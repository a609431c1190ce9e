/// User actions routed to the game orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameCommand {
    /// Play the prompt phrase forward.
    PlayPhrase,
    /// Play the prompt phrase reversed.
    PlayPhraseReversed,
    /// Start recording, or stop if one is in progress.
    ToggleRecording,
    /// Play the session's recording forward.
    PlayRecording,
    /// Play the session's recording reversed.
    PlayRecordingReversed,
    /// Shut the game down.
    Quit,
}

impl GameCommand {
    /// Parses a key entered on the action surface.
    pub fn parse(key: &str) -> Option<Self> {
        match key {
            "1" => Some(Self::PlayPhrase),
            "2" => Some(Self::PlayPhraseReversed),
            "3" => Some(Self::ToggleRecording),
            "4" => Some(Self::PlayRecording),
            "5" => Some(Self::PlayRecordingReversed),
            "q" => Some(Self::Quit),
            _ => None,
        }
    }
}
