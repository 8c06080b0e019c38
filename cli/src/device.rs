//! System audio devices
//!
//! Both collaborators open the default device per call, so they hold no
//! device state and can move to the session thread. The device runs at its
//! own default rate and channel count; audio is resampled and mixed to fit.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, SizedSample};
use std::fmt::Display;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;
use tonelink_core::audio::{capture_len, fit_to_len};
use tonelink_core::resample::{downmix, resample_audio};
use tonelink_core::{AudioModemError, AudioSink, AudioSource, Result};

/// Extra time after the last sample is handed over, so the device buffer drains
const PLAYBACK_DRAIN: Duration = Duration::from_millis(250);

fn device_error(err: impl Display) -> AudioModemError {
    AudioModemError::AudioDevice(err.to_string())
}

/// One-shot completion shared between a stream's data and error callbacks
#[derive(Clone)]
struct Completion(Arc<Mutex<Option<oneshot::Sender<Result<()>>>>>);

impl Completion {
    fn new() -> (Self, oneshot::Receiver<Result<()>>) {
        let (tx, rx) = oneshot::channel();
        (Self(Arc::new(Mutex::new(Some(tx)))), rx)
    }

    fn finish(&self, result: Result<()>) {
        if let Ok(mut slot) = self.0.lock() {
            if let Some(tx) = slot.take() {
                let _ = tx.send(result);
            }
        }
    }

    /// Block until a callback reports
    fn wait(rx: oneshot::Receiver<Result<()>>) -> Result<()> {
        rx.blocking_recv()
            .unwrap_or_else(|_| Err(device_error("audio stream closed unexpectedly")))
    }
}

/// Default output device
pub struct SpeakerSink;

impl AudioSink for SpeakerSink {
    fn play(&mut self, samples: &[f32], sample_rate: u32) -> Result<()> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| device_error("no default output device"))?;
        let supported = device.default_output_config().map_err(device_error)?;
        let sample_format = supported.sample_format();
        let config = supported.config();

        let samples = resample_audio(samples, sample_rate, config.sample_rate.0);
        tracing::info!(
            "Playing {} samples on {} @ {}Hz, {} ch",
            samples.len(),
            device.name().unwrap_or_else(|_| "Unknown".to_string()),
            config.sample_rate.0,
            config.channels
        );

        let (done, done_rx) = Completion::new();
        let stream = match sample_format {
            SampleFormat::F32 => build_playback::<f32>(&device, &config, samples, done),
            SampleFormat::I16 => build_playback::<i16>(&device, &config, samples, done),
            SampleFormat::U16 => build_playback::<u16>(&device, &config, samples, done),
            format => Err(device_error(format!("unsupported sample format {:?}", format))),
        }?;

        stream.play().map_err(device_error)?;
        let result = Completion::wait(done_rx);
        if result.is_ok() {
            std::thread::sleep(PLAYBACK_DRAIN);
        }
        drop(stream);
        result
    }
}

fn build_playback<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    samples: Vec<f32>,
    done: Completion,
) -> Result<cpal::Stream>
where
    T: SizedSample + FromSample<f32>,
{
    let channels = config.channels as usize;
    let mut position = 0;
    let error_done = done.clone();

    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                for frame in data.chunks_mut(channels) {
                    let value = match samples.get(position) {
                        Some(&value) => {
                            position += 1;
                            value
                        }
                        None => 0.0,
                    };
                    for out in frame.iter_mut() {
                        *out = T::from_sample(value);
                    }
                }
                if position >= samples.len() {
                    done.finish(Ok(()));
                }
            },
            move |err| {
                tracing::error!("Playback stream error: {}", err);
                error_done.finish(Err(device_error(err)));
            },
            None,
        )
        .map_err(device_error)
}

/// Default input device
pub struct MicrophoneSource;

impl AudioSource for MicrophoneSource {
    fn capture(&mut self, sample_rate: u32, duration: Duration) -> Result<Vec<f32>> {
        let wanted_len = capture_len(sample_rate, duration);

        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| device_error("no default input device"))?;
        let supported = device.default_input_config().map_err(device_error)?;
        let sample_format = supported.sample_format();
        let config = supported.config();
        let channels = config.channels as usize;
        let device_rate = config.sample_rate.0;

        let wanted = capture_len(device_rate, duration) * channels;
        if wanted == 0 {
            return Ok(fit_to_len(Vec::new(), wanted_len));
        }

        tracing::info!(
            "Recording {:.2}s from {} @ {}Hz, {} ch",
            duration.as_secs_f64(),
            device.name().unwrap_or_else(|_| "Unknown".to_string()),
            device_rate,
            channels
        );

        let recorded = Arc::new(Mutex::new(Vec::with_capacity(wanted)));
        let (done, done_rx) = Completion::new();
        let stream = match sample_format {
            SampleFormat::F32 => build_capture::<f32>(&device, &config, Arc::clone(&recorded), wanted, done),
            SampleFormat::I16 => build_capture::<i16>(&device, &config, Arc::clone(&recorded), wanted, done),
            SampleFormat::U16 => build_capture::<u16>(&device, &config, Arc::clone(&recorded), wanted, done),
            format => Err(device_error(format!("unsupported sample format {:?}", format))),
        }?;

        stream.play().map_err(device_error)?;
        let result = Completion::wait(done_rx);
        drop(stream);
        result?;

        let mut interleaved = std::mem::take(
            &mut *recorded
                .lock()
                .map_err(|_| device_error("capture buffer poisoned"))?,
        );
        interleaved.truncate(interleaved.len() - interleaved.len() % channels);

        let mono = downmix(&interleaved, channels)?;
        let resampled = resample_audio(&mono, device_rate, sample_rate);
        Ok(fit_to_len(resampled, wanted_len))
    }
}

fn build_capture<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    recorded: Arc<Mutex<Vec<f32>>>,
    wanted: usize,
    done: Completion,
) -> Result<cpal::Stream>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let error_done = done.clone();

    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                let Ok(mut buffer) = recorded.lock() else {
                    return;
                };
                let remaining = wanted.saturating_sub(buffer.len());
                buffer.extend(data.iter().take(remaining).map(|&s| f32::from_sample(s)));
                if buffer.len() >= wanted {
                    done.finish(Ok(()));
                }
            },
            move |err| {
                tracing::error!("Capture stream error: {}", err);
                error_done.finish(Err(device_error(err)));
            },
            None,
        )
        .map_err(device_error)
}
