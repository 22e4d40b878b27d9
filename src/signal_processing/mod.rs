pub mod decibel;
pub mod smoothing;

pub use decibel::{amplitude_to_db, format_level, power_to_db};
pub use smoothing::{decay_kernel, kernel_smoothed_value, smooth_block, smoothing_coefficient};
