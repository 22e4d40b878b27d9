use crate::constants::LEVEL_EPSILON;
use crate::signal_processing::{amplitude_to_db, format_level, power_to_db, smooth_block};

/// Levels of one channel after an update, in dB FS
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelLevels {
    /// Smoothed RMS level (power domain)
    pub rms_db: f64,
    /// Smoothed peak level (amplitude domain)
    pub peak_db: f64,
}

impl ChannelLevels {
    /// RMS readout text, `-Inf` below the display floor
    pub fn rms_text(&self) -> String {
        format_level(self.rms_db)
    }

    /// Peak readout text, `-Inf` below the display floor
    pub fn peak_text(&self) -> String {
        format_level(self.peak_db)
    }
}

/// Smoothing state of one channel
///
/// Both values start at and never drop below [`LEVEL_EPSILON`], so the
/// decibel levels stay finite on silence. Non-finite input is not masked:
/// once a value turns NaN it stays NaN.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelState {
    smoothed_rms: f64,
    smoothed_peak: f64,
}

impl Default for ChannelState {
    fn default() -> Self {
        Self {
            smoothed_rms: LEVEL_EPSILON,
            smoothed_peak: LEVEL_EPSILON,
        }
    }
}

impl ChannelState {
    pub fn new(smoothed_rms: f64, smoothed_peak: f64) -> Self {
        Self {
            smoothed_rms: floor(smoothed_rms),
            smoothed_peak: floor(smoothed_peak),
        }
    }

    pub fn smoothed_rms(&self) -> f64 {
        self.smoothed_rms
    }

    pub fn smoothed_peak(&self) -> f64 {
        self.smoothed_peak
    }

    /// Instant attack, exponential release
    ///
    /// `release` is the per-tick decay factor `1 - peak_alpha`. An empty
    /// block leaves the peak untouched.
    pub fn update_peak(&mut self, samples: &[f32], release: f64) {
        if samples.is_empty() {
            return;
        }

        let value_max = samples
            .iter()
            .map(|&s| (s as f64).abs())
            .fold(0.0_f64, |m, x| if x > m || x.is_nan() { x } else { m });

        let decayed = self.smoothed_peak * release;
        if value_max > decayed || value_max.is_nan() {
            self.smoothed_peak = value_max;
        } else {
            self.smoothed_peak = floor(decayed);
        }
    }

    /// One-pole smoothing of the squared samples, seeded with the previous
    /// mean square. An empty block leaves the value untouched.
    pub fn update_rms(&mut self, samples: &[f32], alpha: f64) {
        if samples.is_empty() {
            return;
        }

        let squared = samples.iter().map(|&s| {
            let s = s as f64;
            s * s
        });
        self.smoothed_rms = floor(smooth_block(alpha, self.smoothed_rms, squared));
    }

    pub fn levels(&self) -> ChannelLevels {
        ChannelLevels {
            rms_db: power_to_db(self.smoothed_rms),
            peak_db: amplitude_to_db(self.smoothed_peak),
        }
    }
}

// NaN passes through so corrupt input stays visible
fn floor(value: f64) -> f64 {
    if value < LEVEL_EPSILON {
        LEVEL_EPSILON
    } else {
        value
    }
}
