use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Prompt phrase configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhraseConfig {
    /// Text shown to the player.
    pub text: String,
    /// Audio file holding the spoken prompt.
    pub media_path: PathBuf,
}
