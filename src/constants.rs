//! Numeric constants for level metering
//!
//! These define the smoothing calibration and the numerical floors that keep
//! decibel conversion finite when the input is silent.

/// Floor for smoothed mean-square and peak values.
/// Keeps `log10` finite; silence settles at -300 dB RMS and -600 dB peak.
pub const LEVEL_EPSILON: f64 = 1e-30;

/// Fraction of the smoothing filter's steady-state response carried by the
/// most recent response-time window of input.
pub const RESPONSE_ENERGY_FRACTION: f64 = 0.65;

/// Text readouts at or below this level are shown as `-Inf`.
pub const DISPLAY_FLOOR_DB: f64 = -150.0;

/// Literal shown for levels below [`DISPLAY_FLOOR_DB`].
pub const NEG_INF_LABEL: &str = "-Inf";

/// Default display refresh cadence (25 ms).
pub const DEFAULT_DISPLAY_TICK_PERIOD: f64 = 0.025;

/// Default text readout cadence (250 ms).
pub const DEFAULT_LABEL_PERIOD: f64 = 0.250;

/// Default RMS response time; 300 ms is the usual VU ballistics.
pub const DEFAULT_RMS_RESPONSE_TIME: f64 = 0.300;

/// Default peak response time, measured against the display tick.
pub const DEFAULT_PEAK_RESPONSE_TIME: f64 = 0.025;

/// Default length of the precomputed decay kernel.
pub const DEFAULT_KERNEL_LENGTH: usize = 4096;
