use crate::audio::SampleSource;
use crate::config::{MeterConfig, require_positive};
use crate::display::DisplaySink;
use crate::error::Result;
use crate::settings::{SettingsStore, read_f64, write_f64};
use crate::visualizer::{Visualizer, VisualizerKind};

use super::{LabelThrottle, LoudnessEstimator};

pub const RMS_RESPONSE_TIME_KEY: &str = "levels/rms_response_time";
pub const PEAK_RESPONSE_TIME_KEY: &str = "levels/peak_response_time";

/// Peak/RMS level meter driven by the display timer
///
/// Each visible tick pulls the newest samples, updates the estimator,
/// pushes meter levels for every active channel and, every
/// [`LabelThrottle::steps`] ticks, the text readouts.
pub struct LevelsMeter<S: DisplaySink> {
    estimator: LoudnessEstimator,
    throttle: LabelThrottle,
    sink: S,
    visible: bool,
}

impl<S: DisplaySink> LevelsMeter<S> {
    pub fn new(estimator: LoudnessEstimator, throttle: LabelThrottle, sink: S) -> Self {
        Self {
            estimator,
            throttle,
            sink,
            visible: true,
        }
    }

    pub fn from_config(config: &MeterConfig, sink: S) -> Result<Self> {
        let estimator = LoudnessEstimator::new(config.estimator())?;
        let throttle = LabelThrottle::new(config.display.label_period, config.display.tick_period)?;
        Ok(Self::new(estimator, throttle, sink))
    }

    pub fn estimator(&self) -> &LoudnessEstimator {
        &self.estimator
    }

    pub fn estimator_mut(&mut self) -> &mut LoudnessEstimator {
        &mut self.estimator
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Hidden meters skip ticks entirely and leave the source undrained
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Run one display tick; returns false if skipped because hidden
    pub fn tick(&mut self, source: &mut dyn SampleSource) -> bool {
        if !self.visible {
            return false;
        }

        let label_due = self.throttle.tick();
        let block = source.newest_block();

        if let Some(count) = self.estimator.update(&block) {
            self.sink.set_channel_count(count);
        }

        for (channel, levels) in self.estimator.levels().iter().enumerate() {
            self.sink.set_level(channel, levels.rms_db, levels.peak_db);
            if label_due {
                self.sink
                    .set_text(channel, &levels.rms_text(), &levels.peak_text());
            }
        }

        self.sink.end_tick();
        true
    }
}

impl<S: DisplaySink> Visualizer for LevelsMeter<S> {
    fn kind(&self) -> VisualizerKind {
        VisualizerKind::Levels
    }

    fn update(&mut self, source: &mut dyn SampleSource) {
        self.tick(source);
    }

    fn settings_called(&mut self) {
        log::info!(
            "Levels settings: RMS response {:.0} ms, peak response {:.0} ms",
            self.estimator.rms_response_time() * 1000.0,
            self.estimator.peak_response_time() * 1000.0
        );
    }

    fn save_state(&self, settings: &mut dyn SettingsStore) -> Result<()> {
        write_f64(
            settings,
            RMS_RESPONSE_TIME_KEY,
            self.estimator.rms_response_time(),
        );
        write_f64(
            settings,
            PEAK_RESPONSE_TIME_KEY,
            self.estimator.peak_response_time(),
        );
        Ok(())
    }

    /// Missing keys keep the current values; on error nothing is applied
    fn restore_state(&mut self, settings: &dyn SettingsStore) -> Result<()> {
        let rms = read_f64(settings, RMS_RESPONSE_TIME_KEY)?;
        let peak = read_f64(settings, PEAK_RESPONSE_TIME_KEY)?;
        if let Some(seconds) = rms {
            require_positive("RMS response time", seconds)?;
        }
        if let Some(seconds) = peak {
            require_positive("peak response time", seconds)?;
        }

        if let Some(seconds) = rms {
            self.estimator.set_rms_response_time(seconds)?;
        }
        if let Some(seconds) = peak {
            self.estimator.set_peak_response_time(seconds)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::SampleBlock;
    use crate::display::NullSink;
    use crate::settings::MemorySettings;
    use std::collections::VecDeque;

    fn meter() -> LevelsMeter<NullSink> {
        LevelsMeter::from_config(&MeterConfig::default(), NullSink).unwrap()
    }

    #[test]
    fn test_hidden_meter_does_not_drain_source() {
        let mut meter = meter();
        let mut source: VecDeque<SampleBlock> = VecDeque::from(vec![SampleBlock::mono(vec![1.0])]);

        meter.set_visible(false);
        assert!(!meter.tick(&mut source));
        assert_eq!(source.len(), 1);

        meter.set_visible(true);
        assert!(meter.tick(&mut source));
        assert!(source.is_empty());
        assert_eq!(meter.estimator().levels()[0].peak_db, 0.0);
    }

    #[test]
    fn test_restore_rejects_bad_values() {
        let mut meter = meter();
        let mut settings = MemorySettings::new();
        settings.set_value(RMS_RESPONSE_TIME_KEY, "-1".to_string());
        assert!(meter.restore_state(&settings).is_err());
        assert_eq!(meter.estimator().rms_response_time(), 0.3);
    }

    #[test]
    fn test_restore_is_all_or_nothing() {
        let mut meter = meter();
        let mut settings = MemorySettings::new();
        settings.set_value(RMS_RESPONSE_TIME_KEY, "0.125".to_string());
        settings.set_value(PEAK_RESPONSE_TIME_KEY, "0".to_string());
        assert!(meter.restore_state(&settings).is_err());
        assert_eq!(meter.estimator().rms_response_time(), 0.3);
        assert_eq!(meter.estimator().peak_response_time(), 0.025);

        settings.set_value(PEAK_RESPONSE_TIME_KEY, "slow".to_string());
        assert!(meter.restore_state(&settings).is_err());
        assert_eq!(meter.estimator().rms_response_time(), 0.3);
    }

    #[test]
    fn test_restore_missing_keys_keeps_values() {
        let mut meter = meter();
        meter.restore_state(&MemorySettings::new()).unwrap();
        assert_eq!(meter.estimator().rms_response_time(), 0.3);
        assert_eq!(meter.estimator().peak_response_time(), 0.025);
    }

    #[test]
    fn test_levels_meter_has_no_pause() {
        assert!(!meter().supports_pause());
        assert_eq!(meter().kind(), VisualizerKind::Levels);
    }
}
