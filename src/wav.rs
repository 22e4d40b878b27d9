use std::path::Path;

use hound::{WavSpec, WavWriter};

use crate::error::Result;

/// Write interleaved samples as a 32-bit float WAV file
pub fn save_wav<P: AsRef<Path>>(
    path: P,
    interleaved: &[f32],
    channels: u16,
    sample_rate: u32,
) -> Result<()> {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };

    let mut writer = WavWriter::create(path, spec)?;

    for &sample in interleaved {
        writer.write_sample(sample)?;
    }

    writer.finalize()?;
    Ok(())
}
