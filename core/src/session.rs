use crate::audio::{AudioSink, AudioSource};
use crate::bits;
use crate::config::ModemConfig;
use crate::error::Result;
use crate::fsk::{FskDemodulator, FskModulator};
use crate::validator;
use std::fmt;

/// Where the session is in a send or receive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Sending,
    Listening,
    Decoding,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Blank input, nothing was played
    Skipped,
    Sent { bits: usize, samples: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiveOutcome {
    Delivered(String),
    Rejected(Rejection),
}

/// Why decoded text was withheld from the UI
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    Empty,
    NonPrintable { index: usize, ch: char },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Empty => write!(f, "decoded message is empty"),
            Rejection::NonPrintable { index, ch } => write!(
                f,
                "decoded message contains non-printable character {:?} at position {}",
                ch, index
            ),
        }
    }
}

/// Send/receive orchestrator over one playback and one capture collaborator.
///
/// Sending runs encode -> modulate -> play. Receiving runs capture ->
/// demodulate -> decode -> validate. Both block for the physical duration of
/// the audio and always leave the session `Idle`, whatever the result.
/// Nothing is retried.
pub struct Session<P, C> {
    config: ModemConfig,
    modulator: FskModulator,
    demodulator: FskDemodulator,
    playback: P,
    capture: C,
    state: SessionState,
}

impl<P: AudioSink, C: AudioSource> Session<P, C> {
    pub fn new(config: ModemConfig, playback: P, capture: C) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            modulator: FskModulator::new(config.clone())?,
            demodulator: FskDemodulator::new(config.clone())?,
            config,
            playback,
            capture,
            state: SessionState::Idle,
        })
    }

    pub fn config(&self) -> &ModemConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    fn transition(&mut self, next: SessionState) {
        log::debug!("Session {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Encode, modulate and play `text`.
    ///
    /// Empty or whitespace-only text is skipped without touching the audio
    /// device.
    pub fn send(&mut self, text: &str) -> Result<SendOutcome> {
        if text.trim().is_empty() {
            log::debug!("Skipping blank send request");
            return Ok(SendOutcome::Skipped);
        }

        self.transition(SessionState::Sending);
        let result = self.run_send(text);
        self.transition(SessionState::Idle);
        result
    }

    fn run_send(&mut self, text: &str) -> Result<SendOutcome> {
        let bits = bits::encode(text)?;
        let samples = self.modulator.modulate(&bits);

        log::info!(
            "Sending {:?}: {} bits, {} samples ({:.2}s)",
            text,
            bits.len(),
            samples.len(),
            samples.len() as f64 / self.config.sample_rate as f64
        );

        self.playback.play(&samples, self.config.sample_rate)?;

        Ok(SendOutcome::Sent {
            bits: bits.len(),
            samples: samples.len(),
        })
    }

    /// Listen for the configured capture duration and decode what was heard.
    pub fn receive(&mut self) -> Result<ReceiveOutcome> {
        self.transition(SessionState::Listening);
        let result = self.run_receive();
        self.transition(SessionState::Idle);
        result
    }

    fn run_receive(&mut self) -> Result<ReceiveOutcome> {
        let capture_bits = self.config.capture_bits();
        if capture_bits % bits::BITS_PER_CHAR != 0 {
            log::warn!(
                "Capture window holds {} bit intervals, not a whole number of characters",
                capture_bits
            );
        }
        log::info!(
            "Listening for {:.2}s at {} Hz",
            self.config.capture_duration.as_secs_f64(),
            self.config.sample_rate
        );
        let samples = self
            .capture
            .capture(self.config.sample_rate, self.config.capture_duration)?;

        self.transition(SessionState::Decoding);
        let bits = self.demodulator.demodulate(&samples)?;
        let text = bits::decode(&bits)?;

        if let Some((index, ch)) = validator::find_invalid(&text) {
            let rejection = Rejection::NonPrintable { index, ch };
            log::warn!("Discarding message: {}", rejection);
            return Ok(ReceiveOutcome::Rejected(rejection));
        }
        if text.is_empty() {
            log::warn!("Discarding message: {}", Rejection::Empty);
            return Ok(ReceiveOutcome::Rejected(Rejection::Empty));
        }

        log::info!("Received {:?}", text);
        Ok(ReceiveOutcome::Delivered(text))
    }
}
