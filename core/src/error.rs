use thiserror::Error;

#[derive(Debug, Error)]
pub enum AudioModemError {
    #[error("Character {ch:?} at position {index} does not fit in 8 bits")]
    Encoding { index: usize, ch: char },

    #[error("Bit stream length {len} is not a multiple of 8")]
    MalformedBitstream { len: usize },

    #[error("Invalid bit symbol {symbol:?} at position {index}")]
    InvalidBitSymbol { index: usize, symbol: char },

    #[error("Audio device error: {0}")]
    AudioDevice(String),

    #[error("FFT error: {0}")]
    FftError(String),

    #[error("Invalid input size")]
    InvalidInputSize,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Session busy: another send or receive is in flight")]
    SessionBusy,

    #[error("Session worker has shut down")]
    WorkerClosed,

    #[error("Failed to start session worker: {0}")]
    WorkerSpawn(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AudioModemError>;
