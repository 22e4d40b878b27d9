//! Peak and RMS level metering
//!
//! [`LoudnessEstimator`] holds the per-channel smoothing state and turns
//! each tick's samples into decibel levels. [`LevelsMeter`] drives it from
//! a [`crate::audio::SampleSource`] once per display tick and reports to a
//! [`crate::display::DisplaySink`].

mod channel;
mod estimator;
mod meter;
mod throttle;

pub use channel::{ChannelLevels, ChannelState};
pub use estimator::LoudnessEstimator;
pub use meter::{LevelsMeter, PEAK_RESPONSE_TIME_KEY, RMS_RESPONSE_TIME_KEY};
pub use throttle::LabelThrottle;
