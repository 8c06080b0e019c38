use crate::audio::capture_len;
use crate::error::{AudioModemError, Result};
use crate::{
    DEFAULT_BAUD_RATE, DEFAULT_CAPTURE_SECS, DEFAULT_FREQ_ONE, DEFAULT_FREQ_ZERO,
    DEFAULT_SAMPLE_RATE,
};
use std::time::Duration;

/// How far `sample_rate / baud_rate` may stray from a whole number of samples.
const SAMPLES_PER_BIT_TOLERANCE: f64 = 0.01;

/// Tone plan and timing shared by both ends of a link.
///
/// The value is immutable once handed to a modulator, demodulator or session,
/// so sessions with different tone plans can live side by side.
#[derive(Debug, Clone, PartialEq)]
pub struct ModemConfig {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Bit intervals per second
    pub baud_rate: f32,
    /// Tone for a 0 bit (Hz)
    pub freq_zero: f32,
    /// Tone for a 1 bit (Hz)
    pub freq_one: f32,
    /// How long a receive listens for. Decoding needs the window to cover a
    /// multiple of 8 bit intervals; see [`ModemConfig::capture_bits`].
    pub capture_duration: Duration,
}

impl Default for ModemConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            baud_rate: DEFAULT_BAUD_RATE,
            freq_zero: DEFAULT_FREQ_ZERO,
            freq_one: DEFAULT_FREQ_ONE,
            capture_duration: Duration::from_secs(DEFAULT_CAPTURE_SECS),
        }
    }
}

impl ModemConfig {
    pub fn with_capture_duration(mut self, duration: Duration) -> Self {
        self.capture_duration = duration;
        self
    }

    /// Check that the tone plan can round-trip.
    ///
    /// Both tones must sit strictly between 0 Hz and Nyquist with `freq_zero`
    /// below `freq_one`, and one bit interval must be a whole number of samples.
    /// The tones must also be at least one FFT bin (`sample_rate /
    /// samples_per_bit`) apart, or both can peak in the same bin.
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(AudioModemError::InvalidConfig(
                "sample rate must be positive".into(),
            ));
        }
        if !self.baud_rate.is_finite() || self.baud_rate <= 0.0 {
            return Err(AudioModemError::InvalidConfig(format!(
                "baud rate must be positive, got {}",
                self.baud_rate
            )));
        }

        let ratio = self.sample_rate as f64 / self.baud_rate as f64;
        if ratio < 1.0 {
            return Err(AudioModemError::InvalidConfig(format!(
                "baud rate {} exceeds sample rate {}",
                self.baud_rate, self.sample_rate
            )));
        }
        if (ratio - ratio.round()).abs() > SAMPLES_PER_BIT_TOLERANCE {
            return Err(AudioModemError::InvalidConfig(format!(
                "{} Hz / {} baud = {:.3} samples per bit, not a whole number",
                self.sample_rate, self.baud_rate, ratio
            )));
        }

        let nyquist = self.sample_rate as f32 / 2.0;
        for (name, freq) in [("freq_zero", self.freq_zero), ("freq_one", self.freq_one)] {
            if !freq.is_finite() || freq <= 0.0 || freq >= nyquist {
                return Err(AudioModemError::InvalidConfig(format!(
                    "{} = {} Hz must lie in (0, {}) Hz",
                    name, freq, nyquist
                )));
            }
        }
        if self.freq_zero >= self.freq_one {
            return Err(AudioModemError::InvalidConfig(format!(
                "freq_zero ({} Hz) must be below freq_one ({} Hz)",
                self.freq_zero, self.freq_one
            )));
        }

        let bin_width = self.bin_width();
        if self.freq_one - self.freq_zero < bin_width {
            return Err(AudioModemError::InvalidConfig(format!(
                "tones {} Hz and {} Hz are closer than one {} Hz FFT bin",
                self.freq_zero, self.freq_one, bin_width
            )));
        }

        if self.capture_duration.is_zero() {
            return Err(AudioModemError::InvalidConfig(
                "capture duration must be positive".into(),
            ));
        }

        Ok(())
    }

    /// Length of one bit interval in samples
    pub fn samples_per_bit(&self) -> usize {
        (self.sample_rate as f64 / self.baud_rate as f64).round() as usize
    }

    /// Frequency resolution of one bit window in Hz
    pub fn bin_width(&self) -> f32 {
        self.sample_rate as f32 / self.samples_per_bit() as f32
    }

    /// Bit intervals in one capture window, counting a trailing partial one.
    ///
    /// A receive only decodes when this is a multiple of 8.
    pub fn capture_bits(&self) -> usize {
        capture_len(self.sample_rate, self.capture_duration).div_ceil(self.samples_per_bit())
    }

    /// Decision threshold between the two tones
    pub fn midpoint(&self) -> f32 {
        (self.freq_zero + self.freq_one) / 2.0
    }

    pub fn tone_for(&self, bit: u8) -> f32 {
        if bit == 0 {
            self.freq_zero
        } else {
            self.freq_one
        }
    }

    /// Air time of `bit_count` bit intervals.
    ///
    /// Sizing a capture with this yields exactly `bit_count * samples_per_bit`
    /// samples.
    pub fn duration_for_bits(&self, bit_count: usize) -> Duration {
        let samples = bit_count * self.samples_per_bit();
        Duration::from_secs_f64(samples as f64 / self.sample_rate as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ModemConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.samples_per_bit(), 147);
        assert_eq!(config.midpoint(), 2000.0);
        assert_eq!(config.capture_duration, Duration::from_secs(5));
    }

    #[test]
    fn test_tone_for_bits() {
        let config = ModemConfig::default();
        assert_eq!(config.tone_for(0), 1500.0);
        assert_eq!(config.tone_for(1), 2500.0);
    }

    #[test]
    fn test_rejects_fractional_samples_per_bit() {
        let config = ModemConfig {
            baud_rate: 301.0,
            ..ModemConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(AudioModemError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_rejects_equal_or_swapped_tones() {
        let equal = ModemConfig {
            freq_one: 1500.0,
            ..ModemConfig::default()
        };
        assert!(equal.validate().is_err());

        let swapped = ModemConfig {
            freq_zero: 2500.0,
            freq_one: 1500.0,
            ..ModemConfig::default()
        };
        assert!(swapped.validate().is_err());
    }

    #[test]
    fn test_rejects_tones_within_one_bin() {
        // 300 Hz bins at the default rate and baud
        let config = ModemConfig {
            freq_zero: 2000.0,
            freq_one: 2100.0,
            ..ModemConfig::default()
        };
        assert_eq!(config.bin_width(), 300.0);
        assert!(matches!(
            config.validate(),
            Err(AudioModemError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_tones_one_bin_apart_round_trip() {
        use crate::fsk::{FskDemodulator, FskModulator};

        let config = ModemConfig {
            freq_zero: 1500.0,
            freq_one: 1800.0,
            ..ModemConfig::default()
        };
        config.validate().unwrap();

        let bits = vec![0, 1, 0, 1, 1, 0, 0, 1];
        let samples = FskModulator::new(config.clone()).unwrap().modulate(&bits);
        let decoded = FskDemodulator::new(config).unwrap().demodulate(&samples).unwrap();
        assert_eq!(decoded, bits);
    }

    #[test]
    fn test_capture_bits() {
        // 5 s at 300 baud is 1500 intervals, not whole characters
        let config = ModemConfig::default();
        assert_eq!(config.capture_bits(), 1500);
        assert_ne!(config.capture_bits() % 8, 0);

        let two_chars = config.clone().with_capture_duration(config.duration_for_bits(16));
        assert_eq!(two_chars.capture_bits(), 16);

        // A partial trailing interval still counts
        // 11 ms -> 485 samples -> 3 whole intervals and a partial one
        let partial = config.with_capture_duration(Duration::from_millis(11));
        assert_eq!(partial.capture_bits(), 4);
    }

    #[test]
    fn test_rejects_tone_above_nyquist() {
        let config = ModemConfig {
            freq_one: 30000.0,
            ..ModemConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_capture_duration() {
        let config = ModemConfig::default().with_capture_duration(Duration::ZERO);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duration_for_bits_matches_sample_count() {
        let config = ModemConfig::default();
        let duration = config.duration_for_bits(16);
        let samples = (config.sample_rate as f64 * duration.as_secs_f64()).round() as usize;
        assert_eq!(samples, 16 * 147);
    }
}
