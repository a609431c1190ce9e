#[allow(clippy::module_inception)]
mod config;
mod phrase_config;

pub(crate) use {config::Config, phrase_config::PhraseConfig};

pub(crate) const DEFAULT_PHRASE: &str = "Hello! How are you?";
