use crate::config::ModemConfig;
use crate::error::{AudioModemError, Result};
use realfft::RealFftPlanner;
use std::f64::consts::PI;

// Binary FSK, one tone per bit interval
//
// - bit 0 -> freq_zero, bit 1 -> freq_one
// - each interval is samples_per_bit = sample_rate / baud_rate samples
// - every interval starts at phase 0, so consecutive tones are not phase
//   continuous; the demodulator only looks at the spectral peak and does not
//   care
//
// Demodulation takes the real FFT of each interval and compares the peak
// frequency against the midpoint between the two tones.

/// FSK modulator - one pure sinusoid per bit
pub struct FskModulator {
    config: ModemConfig,
}

impl FskModulator {
    /// Fails with [`AudioModemError::InvalidConfig`] for a plan that cannot
    /// round-trip.
    pub fn new(config: ModemConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ModemConfig {
        &self.config
    }

    /// One bit interval of a unit-amplitude tone, starting at phase 0
    pub fn tone(&self, frequency: f32) -> Vec<f32> {
        let samples_per_bit = self.config.samples_per_bit();
        let angular_freq = 2.0 * PI * frequency as f64 / self.config.sample_rate as f64;

        (0..samples_per_bit)
            .map(|i| (angular_freq * i as f64).sin() as f32)
            .collect()
    }

    /// Modulate a bit sequence into a waveform.
    ///
    /// Output length is `bits.len() * samples_per_bit`. Any nonzero entry is
    /// sent as a one.
    pub fn modulate(&self, bits: &[u8]) -> Vec<f32> {
        // Phase restarts per interval, so every interval for a given bit is
        // the same block of samples.
        let zero = self.tone(self.config.freq_zero);
        let one = self.tone(self.config.freq_one);

        let mut samples = Vec::with_capacity(bits.len() * self.config.samples_per_bit());
        for &bit in bits {
            let segment = if bit == 0 { &zero } else { &one };
            samples.extend_from_slice(segment);
        }

        samples
    }
}

/// FSK demodulator - classifies each bit interval by its spectral peak
pub struct FskDemodulator {
    config: ModemConfig,
}

impl FskDemodulator {
    pub fn new(config: ModemConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ModemConfig {
        &self.config
    }

    /// Map a dominant frequency to a bit.
    ///
    /// Below the midpoint is 0; the midpoint itself and above is 1.
    pub fn classify(&self, frequency: f32) -> u8 {
        if frequency < self.config.midpoint() {
            0
        } else {
            1
        }
    }

    /// Dominant frequency of a single window in Hz
    pub fn peak_frequency(&self, window: &[f32]) -> Result<f32> {
        let mut planner = RealFftPlanner::<f32>::new();
        self.peak_frequency_with(&mut planner, window)
    }

    fn peak_frequency_with(
        &self,
        planner: &mut RealFftPlanner<f32>,
        window: &[f32],
    ) -> Result<f32> {
        let n = window.len();
        if n < 2 {
            // Only the DC bin exists
            return Ok(0.0);
        }

        let r2c = planner.plan_fft_forward(n);
        let mut input = r2c.make_input_vec();
        input.copy_from_slice(window);
        let mut spectrum = r2c.make_output_vec();

        r2c.process(&mut input, &mut spectrum)
            .map_err(|e| AudioModemError::FftError(format!("FFT forward process failed: {:?}", e)))?;

        // First bin of maximum magnitude wins ties
        let mut peak_bin = 0;
        let mut peak_magnitude = spectrum[0].norm();
        for (bin, value) in spectrum.iter().enumerate().skip(1) {
            let magnitude = value.norm();
            if magnitude > peak_magnitude {
                peak_magnitude = magnitude;
                peak_bin = bin;
            }
        }

        Ok(peak_bin as f32 * self.config.sample_rate as f32 / n as f32)
    }

    /// Demodulate a waveform into bits, one per `samples_per_bit` window.
    ///
    /// A trailing window shorter than one interval is still classified and
    /// contributes a bit of its own.
    pub fn demodulate(&self, samples: &[f32]) -> Result<Vec<u8>> {
        let samples_per_bit = self.config.samples_per_bit();

        // Plans are cached per window length inside the planner
        let mut planner = RealFftPlanner::<f32>::new();
        let mut bits = Vec::with_capacity(samples.len().div_ceil(samples_per_bit));

        for window in samples.chunks(samples_per_bit) {
            let peak = self.peak_frequency_with(&mut planner, window)?;
            bits.push(self.classify(peak));
        }

        Ok(bits)
    }
}
