use crate::audio::SampleBlock;
use crate::config::{EstimatorConfig, require_positive};
use crate::error::Result;
use crate::signal_processing::{decay_kernel, kernel_smoothed_value, smoothing_coefficient};

use super::{ChannelLevels, ChannelState};

/// Streaming peak/RMS loudness estimator
///
/// Keeps one [`ChannelState`] per channel ever seen and updates the active
/// ones from each tick's block. RMS smoothing runs per sample at the audio
/// rate; peak release runs per tick at the display rate.
///
/// # Example
/// ```
/// use levelmeter::audio::SampleBlock;
/// use levelmeter::config::EstimatorConfig;
/// use levelmeter::levels::LoudnessEstimator;
///
/// let mut estimator = LoudnessEstimator::new(EstimatorConfig::default()).unwrap();
/// estimator.update(&SampleBlock::mono(vec![1.0; 1200]));
/// assert_eq!(estimator.levels()[0].peak_db, 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct LoudnessEstimator {
    config: EstimatorConfig,
    rms_alpha: f64,
    peak_alpha: f64,
    decay_kernel: Vec<f64>,
    states: Vec<ChannelState>,
    channel_count: usize,
    levels: Vec<ChannelLevels>,
}

impl LoudnessEstimator {
    /// Build an estimator, rejecting non-positive rates, times or kernel
    /// length
    pub fn new(config: EstimatorConfig) -> Result<Self> {
        config.validate()?;

        let rms_alpha = Self::rms_coefficient(&config);
        let peak_alpha = Self::peak_coefficient(&config);
        let initial = ChannelState::default();

        Ok(Self {
            config,
            rms_alpha,
            peak_alpha,
            decay_kernel: decay_kernel(rms_alpha, config.kernel_length),
            states: vec![initial],
            channel_count: 1,
            levels: vec![initial.levels()],
        })
    }

    fn rms_coefficient(config: &EstimatorConfig) -> f64 {
        smoothing_coefficient(config.rms_response_time * config.sample_rate)
    }

    fn peak_coefficient(config: &EstimatorConfig) -> f64 {
        smoothing_coefficient(config.peak_response_time / config.display_tick_period)
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    pub fn rms_alpha(&self) -> f64 {
        self.rms_alpha
    }

    pub fn peak_alpha(&self) -> f64 {
        self.peak_alpha
    }

    pub fn decay_kernel(&self) -> &[f64] {
        &self.decay_kernel
    }

    pub fn rms_response_time(&self) -> f64 {
        self.config.rms_response_time
    }

    /// Change the RMS response time; recomputes the coefficient and kernel
    pub fn set_rms_response_time(&mut self, seconds: f64) -> Result<()> {
        require_positive("RMS response time", seconds)?;
        self.config.rms_response_time = seconds;
        self.rms_alpha = Self::rms_coefficient(&self.config);
        self.decay_kernel = decay_kernel(self.rms_alpha, self.config.kernel_length);
        log::debug!(
            "RMS response time {:.3}s, alpha {:.3e}",
            seconds,
            self.rms_alpha
        );
        Ok(())
    }

    pub fn peak_response_time(&self) -> f64 {
        self.config.peak_response_time
    }

    /// Change the peak response time; recomputes the coefficient
    pub fn set_peak_response_time(&mut self, seconds: f64) -> Result<()> {
        require_positive("peak response time", seconds)?;
        self.config.peak_response_time = seconds;
        self.peak_alpha = Self::peak_coefficient(&self.config);
        log::debug!(
            "Peak response time {:.3}s, alpha {:.4}",
            seconds,
            self.peak_alpha
        );
        Ok(())
    }

    /// Number of channels in the most recent non-empty layout
    pub fn channel_count(&self) -> usize {
        self.channel_count
    }

    /// State of channel `index`, if that channel was ever seen
    pub fn channel_state(&self, index: usize) -> Option<&ChannelState> {
        self.states.get(index)
    }

    /// Levels of the active channels after the last update
    pub fn levels(&self) -> &[ChannelLevels] {
        &self.levels
    }

    /// Consume one tick's block
    ///
    /// Returns `Some(n)` when the block's channel count differs from the
    /// previous one, `None` otherwise. A block with no channels carries no
    /// layout information: the previous count is kept and every active
    /// channel is treated as having received no samples.
    pub fn update(&mut self, block: &SampleBlock) -> Option<usize> {
        let mut changed = None;
        if block.channel_count() > 0 && block.channel_count() != self.channel_count {
            log::debug!(
                "Channel count changed: {} -> {}",
                self.channel_count,
                block.channel_count()
            );
            self.channel_count = block.channel_count();
            changed = Some(self.channel_count);
        }

        if self.states.len() < self.channel_count {
            self.states
                .resize(self.channel_count, ChannelState::default());
        }

        let release = 1.0 - self.peak_alpha;
        self.levels.clear();
        for (index, state) in self.states[..self.channel_count].iter_mut().enumerate() {
            let samples = block.channel(index);
            state.update_peak(samples, release);
            state.update_rms(samples, self.rms_alpha);
            self.levels.push(state.levels());
        }

        changed
    }

    /// Kernel-weighted RMS for a block of samples, seeded with `previous`
    ///
    /// Matches the incremental update for blocks no longer than the kernel;
    /// longer blocks only count their newest `kernel_length` samples. Does
    /// not touch any channel state.
    pub fn kernel_rms(&self, samples: &[f32], previous: f64) -> f64 {
        let squared: Vec<f64> = samples
            .iter()
            .map(|&s| {
                let s = s as f64;
                s * s
            })
            .collect();
        kernel_smoothed_value(&self.decay_kernel, self.rms_alpha, &squared, previous)
    }

    /// Forget all smoothing state; keeps configuration and channel count
    pub fn reset(&mut self) {
        for state in &mut self.states {
            *state = ChannelState::default();
        }
        for levels in &mut self.levels {
            *levels = ChannelState::default().levels();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn estimator() -> LoudnessEstimator {
        LoudnessEstimator::new(EstimatorConfig::with_sample_rate(44100.0)).unwrap()
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = EstimatorConfig {
            sample_rate: -1.0,
            ..Default::default()
        };
        assert!(LoudnessEstimator::new(config).is_err());
    }

    #[test]
    fn test_kernel_is_reverse_powers() {
        let est = estimator();
        let kernel = est.decay_kernel();
        assert_eq!(kernel.len(), 4096);
        assert_eq!(kernel[4095], 1.0);
        assert_relative_eq!(kernel[4094], 1.0 - est.rms_alpha(), max_relative = 1e-15);
        assert_relative_eq!(
            kernel[0],
            (1.0 - est.rms_alpha()).powi(4095),
            max_relative = 1e-9
        );
    }

    #[test]
    fn test_peak_alpha_from_tick_ratio() {
        // 25 ms response at 25 ms ticks: one-tick window
        let est = estimator();
        assert_relative_eq!(
            est.peak_alpha(),
            1.0 - 0.35_f64.powf(0.5),
            max_relative = 1e-15
        );
    }

    #[test]
    fn test_channels_grow_lazily_and_persist() {
        let mut est = estimator();
        assert!(est.channel_state(1).is_none());

        assert_eq!(est.update(&SampleBlock::stereo(vec![0.5], vec![0.25])), Some(2));
        let right = *est.channel_state(1).unwrap();

        assert_eq!(est.update(&SampleBlock::mono(vec![0.5])), Some(1));
        assert_eq!(est.levels().len(), 1);
        // dropped channel's state is kept but not touched
        assert_eq!(*est.channel_state(1).unwrap(), right);
    }

    #[test]
    fn test_channel_less_block_keeps_layout() {
        let mut est = estimator();
        est.update(&SampleBlock::stereo(vec![0.5], vec![0.5]));
        let before = est.levels().to_vec();

        assert_eq!(est.update(&SampleBlock::default()), None);
        assert_eq!(est.channel_count(), 2);
        assert_eq!(est.levels(), before.as_slice());
    }

    #[test]
    fn test_missing_channel_data_holds_levels() {
        let mut est = estimator();
        est.update(&SampleBlock::stereo(vec![0.5; 100], vec![0.5; 100]));
        let right_before = est.levels()[1];

        est.update(&SampleBlock::new(vec![vec![0.1; 100], Vec::new()]));
        assert_eq!(est.levels()[1], right_before);
    }

    #[test]
    fn test_kernel_rms_matches_update() {
        let mut est = estimator();
        let block: Vec<f32> = (0..1024).map(|i| (i as f32 * 0.05).sin()).collect();

        let previous = est.channel_state(0).unwrap().smoothed_rms();
        let batch = est.kernel_rms(&block, previous);
        est.update(&SampleBlock::mono(block));

        assert_relative_eq!(
            est.channel_state(0).unwrap().smoothed_rms(),
            batch,
            max_relative = 1e-9
        );
    }

    #[test]
    fn test_set_response_times() {
        let mut est = estimator();
        let alpha = est.rms_alpha();

        est.set_rms_response_time(1.0).unwrap();
        assert!(est.rms_alpha() < alpha);
        assert_eq!(est.decay_kernel()[4094], 1.0 - est.rms_alpha());

        est.set_peak_response_time(0.1).unwrap();
        assert_relative_eq!(
            est.peak_alpha(),
            1.0 - 0.35_f64.powf(1.0 / 5.0),
            max_relative = 1e-12
        );

        assert!(est.set_rms_response_time(0.0).is_err());
        assert!(est.set_peak_response_time(f64::INFINITY).is_err());
        assert_eq!(est.rms_response_time(), 1.0);
    }

    #[test]
    fn test_reset() {
        let mut est = estimator();
        est.update(&SampleBlock::mono(vec![0.9; 512]));
        est.reset();
        assert_eq!(*est.channel_state(0).unwrap(), ChannelState::default());
        assert!(est.levels()[0].rms_db < -150.0);
    }
}
