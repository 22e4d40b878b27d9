use crate::config::require_positive;
use crate::error::Result;

/// Fires once every `steps` ticks
///
/// Used to refresh text readouts at a slower cadence than the meter bars.
/// With the default 250 ms label period and 25 ms tick that is every 10th
/// tick.
#[derive(Debug, Clone)]
pub struct LabelThrottle {
    steps: u32,
    counter: u32,
}

impl LabelThrottle {
    /// Throttle for `label_period` seconds at `tick_period` seconds per tick
    ///
    /// The ratio is rounded to the nearest whole number of ticks, minimum 1.
    pub fn new(label_period: f64, tick_period: f64) -> Result<Self> {
        require_positive("label period", label_period)?;
        require_positive("display tick period", tick_period)?;
        let steps = (label_period / tick_period).round().max(1.0) as u32;
        Ok(Self::with_steps(steps))
    }

    pub fn with_steps(steps: u32) -> Self {
        Self {
            steps: steps.max(1),
            counter: 0,
        }
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    /// Count one tick; true on every `steps`-th call
    pub fn tick(&mut self) -> bool {
        self.counter += 1;
        if self.counter >= self.steps {
            self.counter = 0;
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.counter = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_cadence_is_ten_ticks() {
        let throttle = LabelThrottle::new(0.250, 0.025).unwrap();
        assert_eq!(throttle.steps(), 10);
    }

    #[test]
    fn test_fires_on_every_nth_tick() {
        let mut throttle = LabelThrottle::with_steps(4);
        let fired: Vec<usize> = (1..=12).filter(|_| throttle.tick()).collect();
        assert_eq!(fired, vec![4, 8, 12]);
    }

    #[test]
    fn test_label_faster_than_tick_fires_every_tick() {
        let mut throttle = LabelThrottle::new(0.01, 0.025).unwrap();
        assert_eq!(throttle.steps(), 1);
        assert!(throttle.tick());
        assert!(throttle.tick());
    }

    #[test]
    fn test_reset_restarts_count() {
        let mut throttle = LabelThrottle::with_steps(3);
        throttle.tick();
        throttle.tick();
        throttle.reset();
        assert!(!throttle.tick());
        assert!(!throttle.tick());
        assert!(throttle.tick());
    }

    #[test]
    fn test_invalid_periods() {
        assert!(LabelThrottle::new(0.0, 0.025).is_err());
        assert!(LabelThrottle::new(0.25, -1.0).is_err());
    }
}
