use crate::error::CliError;
use clap::Args;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tonelink_core::{AudioModemError, ModemConfig};

/// Tone plan overrides read from a JSON file
///
/// ```json
/// { "sample_rate": 48000, "baud_rate": 300, "freq_zero": 1200, "freq_one": 2400, "capture_secs": 3.5 }
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub sample_rate: Option<u32>,
    pub baud_rate: Option<f32>,
    pub freq_zero: Option<f32>,
    pub freq_one: Option<f32>,
    pub capture_secs: Option<f64>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self, CliError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Link parameters shared by every subcommand
#[derive(Debug, Args)]
pub struct ModemArgs {
    /// JSON file with tone plan overrides
    #[arg(long, global = true, value_name = "FILE.JSON")]
    pub config: Option<PathBuf>,

    /// Sample rate in Hz [default: 44100]
    #[arg(long, global = true)]
    pub sample_rate: Option<u32>,

    /// Bits per second [default: 300]
    #[arg(long, global = true)]
    pub baud: Option<f32>,

    /// Tone for 0 bits in Hz [default: 1500]
    #[arg(long, global = true)]
    pub freq_zero: Option<f32>,

    /// Tone for 1 bits in Hz [default: 2500]
    #[arg(long, global = true)]
    pub freq_one: Option<f32>,

    /// How long a receive listens, in seconds [default: 5]
    ///
    /// Only a whole number of characters decodes, so seconds x baud must be a
    /// multiple of 8 bits. The 5 s default at 300 baud is 1500 bits and never
    /// decodes; 3.2 s (960 bits, 120 characters) does.
    #[arg(long, global = true)]
    pub capture_secs: Option<f64>,
}

/// Resolved configuration
pub struct Settings {
    pub modem: ModemConfig,
    /// True when the capture duration came from a flag or the config file
    pub capture_explicit: bool,
}

impl ModemArgs {
    /// Defaults, then the config file, then command-line flags.
    pub fn resolve(&self) -> Result<Settings, CliError> {
        let file = match &self.config {
            Some(path) => ConfigFile::load(path)?,
            None => ConfigFile::default(),
        };

        let mut modem = ModemConfig::default();
        if let Some(rate) = self.sample_rate.or(file.sample_rate) {
            modem.sample_rate = rate;
        }
        if let Some(baud) = self.baud.or(file.baud_rate) {
            modem.baud_rate = baud;
        }
        if let Some(freq) = self.freq_zero.or(file.freq_zero) {
            modem.freq_zero = freq;
        }
        if let Some(freq) = self.freq_one.or(file.freq_one) {
            modem.freq_one = freq;
        }

        let capture_secs = self.capture_secs.or(file.capture_secs);
        if let Some(secs) = capture_secs {
            modem.capture_duration = Duration::try_from_secs_f64(secs).map_err(|e| {
                AudioModemError::InvalidConfig(format!("capture duration {}: {}", secs, e))
            })?;
        }

        modem.validate()?;
        tracing::debug!(?modem, "Resolved modem configuration");

        Ok(Settings {
            modem,
            capture_explicit: capture_secs.is_some(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_flags() -> ModemArgs {
        ModemArgs {
            config: None,
            sample_rate: None,
            baud: None,
            freq_zero: None,
            freq_one: None,
            capture_secs: None,
        }
    }

    #[test]
    fn test_defaults() {
        let settings = no_flags().resolve().unwrap();
        assert_eq!(settings.modem, ModemConfig::default());
        assert!(!settings.capture_explicit);
    }

    #[test]
    fn test_flags_override_file() {
        let path = std::env::temp_dir().join(format!("tonelink-config-{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "sample_rate": 48000, "freq_zero": 1200, "capture_secs": 2.0 }"#)
            .unwrap();

        let args = ModemArgs {
            config: Some(path.clone()),
            freq_zero: Some(1000.0),
            ..no_flags()
        };
        let settings = args.resolve().unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(settings.modem.sample_rate, 48000);
        assert_eq!(settings.modem.freq_zero, 1000.0);
        assert_eq!(settings.modem.freq_one, 2500.0);
        assert_eq!(settings.modem.capture_duration, Duration::from_secs(2));
        assert!(settings.capture_explicit);
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        assert!(serde_json::from_str::<ConfigFile>(r#"{ "freq_two": 3000 }"#).is_err());
    }

    #[test]
    fn test_invalid_plan_is_rejected() {
        let args = ModemArgs {
            freq_zero: Some(3000.0),
            ..no_flags()
        };
        assert!(matches!(
            args.resolve(),
            Err(CliError::Modem(AudioModemError::InvalidConfig(_)))
        ));
    }

    #[test]
    fn test_negative_capture_is_rejected() {
        let args = ModemArgs {
            capture_secs: Some(-1.0),
            ..no_flags()
        };
        assert!(args.resolve().is_err());
    }
}
