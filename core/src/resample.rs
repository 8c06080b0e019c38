//! Sample-rate and channel conversion for audio that does not arrive in the
//! modem's own format (device defaults, WAV files)

use crate::error::{AudioModemError, Result};

/// Mix interleaved multi-channel audio down to mono by averaging each frame
///
/// # Arguments
/// * `samples` - Interleaved audio samples [c0, c1, ..., c0, c1, ...]
/// * `channels` - Number of interleaved channels
///
/// # Errors
/// `InvalidInputSize` if `channels` is zero or the buffer holds a partial frame
pub fn downmix(samples: &[f32], channels: usize) -> Result<Vec<f32>> {
    if channels == 0 || samples.len() % channels != 0 {
        return Err(AudioModemError::InvalidInputSize);
    }
    if channels == 1 {
        return Ok(samples.to_vec());
    }

    Ok(samples
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect())
}

/// Resample audio to a target sample rate using linear interpolation
///
/// # Arguments
/// * `samples` - Input audio samples
/// * `from_rate` - Current sample rate in Hz
/// * `to_rate` - Target sample rate in Hz
///
/// # Returns
/// Resampled audio at the target sample rate
pub fn resample_audio(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || samples.is_empty() {
        return samples.to_vec();
    }

    let ratio = to_rate as f64 / from_rate as f64;
    let new_length = ((samples.len() as f64) * ratio).ceil() as usize;
    let last = samples.len() - 1;

    (0..new_length)
        .map(|i| {
            let src_idx = i as f64 / ratio;
            let floor = (src_idx.floor() as usize).min(last);
            let fraction = (src_idx - floor as f64) as f32;

            if floor < last {
                samples[floor] * (1.0 - fraction) + samples[floor + 1] * fraction
            } else {
                samples[last]
            }
        })
        .collect()
}
