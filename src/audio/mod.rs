pub mod block;
pub mod buffer;
pub mod capture;
pub mod source;

pub use block::SampleBlock;
pub use buffer::{AudioBuffer, AudioBufferWriter, audio_buffer};
pub use capture::AudioCapture;
pub use source::{SampleSource, WavFileSource};
