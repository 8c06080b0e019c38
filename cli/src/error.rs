use thiserror::Error;
use tonelink_core::{AudioModemError, Rejection};

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Modem(#[from] AudioModemError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("Config file error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Unsupported WAV format: {0}")]
    UnsupportedWav(String),

    #[error("Message rejected: {0}")]
    Rejected(Rejection),

    #[error("Session worker stopped without reporting a result")]
    NoEvent,

    #[error("Unexpected session event: {0}")]
    UnexpectedEvent(String),
}
