use std::collections::VecDeque;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use hound::WavReader;

use super::SampleBlock;
use crate::error::{MeterError, Result};

/// Non-blocking supplier of the newest audio data
///
/// Called once per display tick. Returns whatever arrived since the last
/// call, which may be an empty block; implementations must never wait for
/// audio I/O. The channel count may change from one call to the next.
pub trait SampleSource {
    fn newest_block(&mut self) -> SampleBlock;
}

/// Queued blocks, one per call; empty once the queue runs out
impl SampleSource for VecDeque<SampleBlock> {
    fn newest_block(&mut self) -> SampleBlock {
        self.pop_front().unwrap_or_default()
    }
}

/// WAV file replayed in fixed-size chunks
///
/// Any channel count and either sample format; integer samples are scaled
/// to [-1, 1).
pub struct WavFileSource {
    samples: Vec<f32>,
    channels: usize,
    position: usize,
    chunk_frames: usize,
    sample_rate: u32,
}

impl WavFileSource {
    pub fn new<P: AsRef<Path>>(path: P, chunk_frames: usize) -> Result<Self> {
        let reader = WavReader::open(path.as_ref())?;
        let spec = reader.spec();

        if spec.channels == 0 {
            return Err(MeterError::Config("WAV file has no channels".into()));
        }
        if chunk_frames == 0 {
            return Err(MeterError::Config("chunk size must be non-zero".into()));
        }

        let samples = Self::read_samples(reader, &spec)?;

        Ok(Self {
            samples,
            channels: spec.channels as usize,
            position: 0,
            chunk_frames,
            sample_rate: spec.sample_rate,
        })
    }

    fn read_samples(
        mut reader: WavReader<BufReader<File>>,
        spec: &hound::WavSpec,
    ) -> Result<Vec<f32>> {
        let samples = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .samples::<f32>()
                .collect::<std::result::Result<Vec<_>, _>>()?,
            hound::SampleFormat::Int => {
                let max_val = 2_i64.pow(spec.bits_per_sample as u32 - 1) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / max_val))
                    .collect::<std::result::Result<Vec<_>, _>>()?
            }
        };
        Ok(samples)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channel_count(&self) -> usize {
        self.channels
    }

    /// Total number of frames in the file
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels
    }

    pub fn is_exhausted(&self) -> bool {
        self.position >= self.samples.len()
    }
}

impl SampleSource for WavFileSource {
    fn newest_block(&mut self) -> SampleBlock {
        if self.is_exhausted() {
            return SampleBlock::silent(self.channels);
        }

        let end = (self.position + self.chunk_frames * self.channels).min(self.samples.len());
        let block = SampleBlock::from_interleaved(&self.samples[self.position..end], self.channels);
        self.position = end;
        block
    }
}
