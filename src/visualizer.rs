use std::fmt;

use crate::audio::SampleSource;
use crate::error::{MeterError, Result};
use crate::settings::SettingsStore;

/// The closed set of visualizers a dock can host
///
/// The discriminant is the index persisted in settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum VisualizerKind {
    #[default]
    Levels = 0,
    Scope = 1,
    Spectrum = 2,
    Spectrogram = 3,
    OctaveSpectrum = 4,
    Generator = 5,
    DelayEstimator = 6,
}

impl VisualizerKind {
    pub const ALL: [VisualizerKind; 7] = [
        Self::Levels,
        Self::Scope,
        Self::Spectrum,
        Self::Spectrogram,
        Self::OctaveSpectrum,
        Self::Generator,
        Self::DelayEstimator,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Levels => "Levels",
            Self::Scope => "Scope",
            Self::Spectrum => "FFT Spectrum",
            Self::Spectrogram => "2D Spectrogram",
            Self::OctaveSpectrum => "Octave Spectrum",
            Self::Generator => "Generator",
            Self::DelayEstimator => "Delay Estimator",
        }
    }
}

impl fmt::Display for VisualizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<usize> for VisualizerKind {
    type Error = MeterError;

    fn try_from(index: usize) -> Result<Self> {
        Self::from_index(index)
            .ok_or_else(|| MeterError::Settings(format!("unknown visualizer index {}", index)))
    }
}

/// Capabilities shared by every visualizer
///
/// Only `kind` and `update` are required. Visualizers that can be paused
/// report it through `supports_pause` and override `pause`/`restart`;
/// everything else defaults to doing nothing.
pub trait Visualizer {
    fn kind(&self) -> VisualizerKind;

    /// One display tick; pulls whatever it needs from `source`
    fn update(&mut self, source: &mut dyn SampleSource);

    fn supports_pause(&self) -> bool {
        false
    }

    fn pause(&mut self) {}

    fn restart(&mut self) {}

    /// The user asked for this visualizer's settings
    fn settings_called(&mut self) {}

    fn save_state(&self, _settings: &mut dyn SettingsStore) -> Result<()> {
        Ok(())
    }

    fn restore_state(&mut self, _settings: &dyn SettingsStore) -> Result<()> {
        Ok(())
    }
}
