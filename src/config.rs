//! Configuration for the level meter.
//!
//! Everything here is plain data with sensible defaults. A partial TOML file
//! can override any subset of fields:
//!
//! ```toml
//! [audio]
//! sample_rate = 44100
//!
//! [levels]
//! rms_response_time = 0.125
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_DISPLAY_TICK_PERIOD, DEFAULT_KERNEL_LENGTH, DEFAULT_LABEL_PERIOD,
    DEFAULT_PEAK_RESPONSE_TIME, DEFAULT_RMS_RESPONSE_TIME,
};
use crate::error::{MeterError, Result};

/// Response time specification in seconds
///
/// # Parsing formats
/// - `0.3` - seconds (no suffix)
/// - `0.3s` - seconds (explicit)
/// - `300ms` - milliseconds
///
/// # Example
/// ```
/// use levelmeter::config::ResponseTime;
///
/// let t: ResponseTime = "300ms".parse().unwrap();
/// assert!((t.as_secs() - 0.3).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResponseTime(f64);

impl ResponseTime {
    pub fn from_secs(secs: f64) -> Self {
        Self(secs)
    }

    pub fn from_millis(ms: f64) -> Self {
        Self(ms / 1000.0)
    }

    pub fn as_secs(&self) -> f64 {
        self.0
    }
}

impl fmt::Display for ResponseTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0 * 1000.0)
    }
}

impl FromStr for ResponseTime {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();

        // "ms" must be checked before the bare "s" suffix
        let (num, scale) = if let Some(num) = s.strip_suffix("ms") {
            (num, 1e-3)
        } else if let Some(num) = s.strip_suffix('s') {
            (num, 1.0)
        } else {
            (s, 1.0)
        };

        let value: f64 = num
            .trim()
            .parse()
            .map_err(|_| format!("invalid response time: {}", s))?;
        if !(value > 0.0) || !value.is_finite() {
            return Err("response time must be positive".to_string());
        }
        Ok(Self(value * scale))
    }
}

/// Standard sound level meter ballistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ResponsePreset {
    /// 25 ms, tracks individual transients
    Impulse,
    /// 125 ms
    Fast,
    /// 300 ms, classic VU meter
    Vu,
    /// 1 s
    Slow,
}

impl ResponsePreset {
    pub fn response_time(&self) -> ResponseTime {
        match self {
            Self::Impulse => ResponseTime::from_millis(25.0),
            Self::Fast => ResponseTime::from_millis(125.0),
            Self::Vu => ResponseTime::from_millis(300.0),
            Self::Slow => ResponseTime::from_secs(1.0),
        }
    }
}

/// Top-level configuration
///
/// Use `MeterConfig::default()` for the stock 48 kHz VU setup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeterConfig {
    /// Audio input configuration
    pub audio: AudioConfig,
    /// Smoothing configuration
    pub levels: LevelsConfig,
    /// Display cadence configuration
    pub display: DisplayConfig,
}

/// Audio input configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Audio sample rate in Hz
    pub sample_rate: u32,
    /// Capture buffer size in frames
    pub buffer_size: usize,
    /// Number of channels requested from the device
    pub channels: u16,
    /// Capacity of the capture-to-display hand-off queue, in blocks
    pub queue_depth: usize,
}

/// Smoothing time constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelsConfig {
    /// RMS response time in seconds
    pub rms_response_time: f64,
    /// Peak response time in seconds
    pub peak_response_time: f64,
    /// Length of the precomputed decay kernel
    pub kernel_length: usize,
}

/// Display cadence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Meter refresh period in seconds
    pub tick_period: f64,
    /// Text readout refresh period in seconds
    pub label_period: f64,
}

/// Loudness estimator configuration
///
/// Built from a [`MeterConfig`] or directly. Validated by
/// [`crate::levels::LoudnessEstimator::new`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EstimatorConfig {
    /// Sample rate in Hz
    pub sample_rate: f64,
    /// RMS response time in seconds
    pub rms_response_time: f64,
    /// Peak response time in seconds, measured against the display tick
    pub peak_response_time: f64,
    /// Cadence at which the estimator is polled, in seconds
    pub display_tick_period: f64,
    /// Length of the precomputed decay kernel
    pub kernel_length: usize,
}

impl EstimatorConfig {
    pub fn with_sample_rate(sample_rate: f64) -> Self {
        Self {
            sample_rate,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        require_positive("sample rate", self.sample_rate)?;
        require_positive("RMS response time", self.rms_response_time)?;
        require_positive("peak response time", self.peak_response_time)?;
        require_positive("display tick period", self.display_tick_period)?;
        if self.kernel_length == 0 {
            return Err(MeterError::Config("kernel length must be non-zero".into()));
        }
        Ok(())
    }
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000.0,
            rms_response_time: DEFAULT_RMS_RESPONSE_TIME,
            peak_response_time: DEFAULT_PEAK_RESPONSE_TIME,
            display_tick_period: DEFAULT_DISPLAY_TICK_PERIOD,
            kernel_length: DEFAULT_KERNEL_LENGTH,
        }
    }
}

pub(crate) fn require_positive(what: &str, value: f64) -> Result<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(MeterError::Config(format!(
            "{} must be positive and finite, got {}",
            what, value
        )))
    }
}

impl MeterConfig {
    /// Load a configuration from a TOML file; missing fields take defaults
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| MeterError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| MeterError::Config(e.to_string()))
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| MeterError::Config(e.to_string()))
    }

    /// Estimator configuration for the configured device sample rate
    pub fn estimator(&self) -> EstimatorConfig {
        EstimatorConfig {
            sample_rate: self.audio.sample_rate as f64,
            rms_response_time: self.levels.rms_response_time,
            peak_response_time: self.levels.peak_response_time,
            display_tick_period: self.display.tick_period,
            kernel_length: self.levels.kernel_length,
        }
    }

    /// Number of frames that arrive during one display tick
    pub fn frames_per_tick(&self) -> usize {
        (self.audio.sample_rate as f64 * self.display.tick_period).round() as usize
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            buffer_size: 512,
            channels: 2,
            queue_depth: 64,
        }
    }
}

impl Default for LevelsConfig {
    fn default() -> Self {
        Self {
            rms_response_time: DEFAULT_RMS_RESPONSE_TIME,
            peak_response_time: DEFAULT_PEAK_RESPONSE_TIME,
            kernel_length: DEFAULT_KERNEL_LENGTH,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            tick_period: DEFAULT_DISPLAY_TICK_PERIOD,
            label_period: DEFAULT_LABEL_PERIOD,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_time_bare_seconds() {
        let t: ResponseTime = "0.125".parse().unwrap();
        assert!((t.as_secs() - 0.125).abs() < 1e-12);
    }

    #[test]
    fn test_response_time_suffixes() {
        let t: ResponseTime = "0.3s".parse().unwrap();
        assert!((t.as_secs() - 0.3).abs() < 1e-12);

        let t: ResponseTime = "25ms".parse().unwrap();
        assert!((t.as_secs() - 0.025).abs() < 1e-12);

        let t: ResponseTime = " 1000 ms ".parse().unwrap();
        assert!((t.as_secs() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_response_time_invalid() {
        assert!("abc".parse::<ResponseTime>().is_err());
        assert!("-100ms".parse::<ResponseTime>().is_err());
        assert!("0s".parse::<ResponseTime>().is_err());
        assert!("NaN".parse::<ResponseTime>().is_err());
    }

    #[test]
    fn test_presets() {
        assert_eq!(ResponsePreset::Vu.response_time().as_secs(), 0.3);
        assert_eq!(ResponsePreset::Slow.response_time().as_secs(), 1.0);
        assert!(ResponsePreset::Impulse.response_time().as_secs() < 0.03);
    }

    #[test]
    fn test_estimator_config_validation() {
        assert!(EstimatorConfig::default().validate().is_ok());

        let bad = [
            EstimatorConfig {
                sample_rate: 0.0,
                ..Default::default()
            },
            EstimatorConfig {
                rms_response_time: -0.3,
                ..Default::default()
            },
            EstimatorConfig {
                peak_response_time: f64::NAN,
                ..Default::default()
            },
            EstimatorConfig {
                display_tick_period: 0.0,
                ..Default::default()
            },
            EstimatorConfig {
                kernel_length: 0,
                ..Default::default()
            },
        ];
        for config in bad {
            assert!(
                matches!(config.validate(), Err(MeterError::Config(_))),
                "{:?} should be rejected",
                config
            );
        }
    }

    #[test]
    fn test_partial_toml_takes_defaults() {
        let config = MeterConfig::from_toml_str(
            r#"
            [audio]
            sample_rate = 44100

            [levels]
            rms_response_time = 0.125
            "#,
        )
        .unwrap();

        assert_eq!(config.audio.sample_rate, 44100);
        assert_eq!(config.audio.buffer_size, AudioConfig::default().buffer_size);
        assert_eq!(config.levels.rms_response_time, 0.125);
        assert_eq!(config.display, DisplayConfig::default());

        let est = config.estimator();
        assert_eq!(est.sample_rate, 44100.0);
        assert_eq!(est.display_tick_period, DEFAULT_DISPLAY_TICK_PERIOD);
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = MeterConfig::default();
        config.levels.peak_response_time = 0.05;
        let text = config.to_toml_string().unwrap();
        assert_eq!(MeterConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_frames_per_tick() {
        assert_eq!(MeterConfig::default().frames_per_tick(), 1200);
    }
}
