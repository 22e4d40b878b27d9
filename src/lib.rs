pub mod audio;
pub mod config;
pub mod constants;
pub mod display;
pub mod dock;
pub mod error;
pub mod levels;
pub mod output;
pub mod settings;
pub mod signal_processing;
pub mod visualizer;
pub mod wav;

#[cfg(feature = "simulation")]
pub mod simulation;

pub use config::{EstimatorConfig, MeterConfig};
pub use error::{MeterError, Result};
pub use levels::{LevelsMeter, LoudnessEstimator};
pub use wav::save_wav;
