mod signal;

pub use signal::{Waveform, dbfs_to_amplitude, generate_channel, generate_interleaved};
