//! Playback and capture collaborators
//!
//! The session only talks to audio hardware through these two traits. Both
//! block the calling thread for the physical duration of the operation.
//! Audio is always mono `f32`.

use crate::error::{AudioModemError, Result};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Plays a waveform and returns once playback has finished
pub trait AudioSink {
    fn play(&mut self, samples: &[f32], sample_rate: u32) -> Result<()>;
}

/// Records for a fixed duration and returns the captured samples
///
/// Implementations return exactly [`capture_len`] samples.
pub trait AudioSource {
    fn capture(&mut self, sample_rate: u32, duration: Duration) -> Result<Vec<f32>>;
}

impl<T: AudioSink + ?Sized> AudioSink for Box<T> {
    fn play(&mut self, samples: &[f32], sample_rate: u32) -> Result<()> {
        (**self).play(samples, sample_rate)
    }
}

impl<T: AudioSource + ?Sized> AudioSource for Box<T> {
    fn capture(&mut self, sample_rate: u32, duration: Duration) -> Result<Vec<f32>> {
        (**self).capture(sample_rate, duration)
    }
}

/// Number of samples in a capture of `duration` at `sample_rate`
pub fn capture_len(sample_rate: u32, duration: Duration) -> usize {
    (sample_rate as f64 * duration.as_secs_f64()).round() as usize
}

/// Zero-pad or truncate to exactly `len` samples
pub fn fit_to_len(mut samples: Vec<f32>, len: usize) -> Vec<f32> {
    samples.resize(len, 0.0);
    samples
}

/// In-memory audio channel: whatever the sink plays, the source hears.
///
/// Useful for exercising the full send/receive pipeline without hardware.
#[derive(Clone, Default)]
pub struct Loopback {
    buffer: Arc<Mutex<Vec<f32>>>,
}

impl Loopback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sink(&self) -> LoopbackSink {
        LoopbackSink {
            buffer: Arc::clone(&self.buffer),
        }
    }

    pub fn source(&self) -> LoopbackSource {
        LoopbackSource {
            buffer: Arc::clone(&self.buffer),
        }
    }

    /// Samples played but not yet captured
    pub fn pending(&self) -> usize {
        self.buffer.lock().map(|b| b.len()).unwrap_or(0)
    }
}

pub struct LoopbackSink {
    buffer: Arc<Mutex<Vec<f32>>>,
}

impl AudioSink for LoopbackSink {
    fn play(&mut self, samples: &[f32], _sample_rate: u32) -> Result<()> {
        let mut buffer = self
            .buffer
            .lock()
            .map_err(|_| AudioModemError::AudioDevice("loopback buffer poisoned".into()))?;
        buffer.extend_from_slice(samples);
        Ok(())
    }
}

pub struct LoopbackSource {
    buffer: Arc<Mutex<Vec<f32>>>,
}

impl AudioSource for LoopbackSource {
    /// Drains everything played so far, then pads or cuts it to the window
    fn capture(&mut self, sample_rate: u32, duration: Duration) -> Result<Vec<f32>> {
        let mut buffer = self
            .buffer
            .lock()
            .map_err(|_| AudioModemError::AudioDevice("loopback buffer poisoned".into()))?;
        let heard = std::mem::take(&mut *buffer);
        Ok(fit_to_len(heard, capture_len(sample_rate, duration)))
    }
}
