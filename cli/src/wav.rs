use crate::error::CliError;
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tonelink_core::audio::{capture_len, fit_to_len};
use tonelink_core::resample::{downmix, resample_audio};
use tonelink_core::{AudioModemError, AudioSink, AudioSource};

/// Write mono samples as a 16-bit PCM WAV file
pub fn write_wav(path: &Path, samples: &[f32], sample_rate: u32) -> Result<(), CliError> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let file = File::create(path)?;
    let mut writer = WavWriter::new(std::io::BufWriter::new(file), spec)?;

    // Convert f32 samples to i16 range [-32768, 32767]
    for &sample in samples {
        let clamped = sample.clamp(-1.0, 1.0);
        writer.write_sample((clamped * 32767.0) as i16)?;
    }
    writer.finalize()?;

    tracing::info!("Wrote {} samples at {} Hz to {}", samples.len(), sample_rate, path.display());
    Ok(())
}

/// Read a WAV file as mono f32 samples at the file's own rate
pub fn read_wav(path: &Path) -> Result<(Vec<f32>, u32), CliError> {
    let mut reader = WavReader::new(BufReader::new(File::open(path)?))?;
    let spec = reader.spec();
    tracing::info!(
        "Read WAV: {} Hz, {} channels, {} bits {:?}",
        spec.sample_rate,
        spec.channels,
        spec.bits_per_sample,
        spec.sample_format
    );

    let interleaved: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, 32) => reader.samples::<f32>().collect::<Result<_, _>>()?,
        (SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .map(|s| s.map(|s| s as f32 / 32768.0))
            .collect::<Result<_, _>>()?,
        (SampleFormat::Int, bits @ (8 | 24 | 32)) => {
            let scale = (1u64 << (bits - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|s| s as f32 / scale))
                .collect::<Result<_, _>>()?
        }
        (format, bits) => {
            return Err(CliError::UnsupportedWav(format!("{} bit {:?}", bits, format)));
        }
    };

    let mono = downmix(&interleaved, spec.channels as usize)?;
    Ok((mono, spec.sample_rate))
}

/// Playback collaborator that writes the waveform to a file instead
pub struct WavSink {
    path: PathBuf,
}

impl WavSink {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl AudioSink for WavSink {
    fn play(&mut self, samples: &[f32], sample_rate: u32) -> tonelink_core::Result<()> {
        write_wav(&self.path, samples, sample_rate).map_err(|e| {
            AudioModemError::AudioDevice(format!("{}: {}", self.path.display(), e))
        })
    }
}

/// Capture collaborator that replays a recording
pub struct WavSource {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl WavSource {
    pub fn open(path: &Path) -> Result<Self, CliError> {
        let (samples, sample_rate) = read_wav(path)?;
        Ok(Self { samples, sample_rate })
    }

    /// Length of the recording
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.samples.len() as f64 / self.sample_rate as f64)
    }
}

impl AudioSource for WavSource {
    fn capture(&mut self, sample_rate: u32, duration: Duration) -> tonelink_core::Result<Vec<f32>> {
        let resampled = resample_audio(&self.samples, self.sample_rate, sample_rate);
        Ok(fit_to_len(resampled, capture_len(sample_rate, duration)))
    }
}
