//! Text over sound: binary FSK audio modem
//!
//! Each character becomes 8 bits, each bit one interval of one of two tones.
//! The receiver classifies every interval by its spectral peak. There is no
//! preamble, FEC or gain control; the channel is assumed clean and aligned.

pub mod audio;
pub mod bits;
pub mod config;
pub mod error;
pub mod fsk;
pub mod resample;
pub mod session;
pub mod validator;
pub mod worker;

pub use audio::{AudioSink, AudioSource, Loopback};
pub use config::ModemConfig;
pub use error::{AudioModemError, Result};
pub use fsk::{FskDemodulator, FskModulator};
pub use session::{ReceiveOutcome, Rejection, SendOutcome, Session, SessionState};
pub use worker::{Event, Request, RequestKind, SessionWorker};

// Default link parameters
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;
pub const DEFAULT_BAUD_RATE: f32 = 300.0; // bits/sec
pub const DEFAULT_FREQ_ZERO: f32 = 1500.0; // Hz
pub const DEFAULT_FREQ_ONE: f32 = 2500.0; // Hz
pub const DEFAULT_CAPTURE_SECS: u64 = 5;
