//! Calibration signals for exercising the meter
//!
//! Levels are given in dB FS of the quantity a meter would read: the peak
//! amplitude for a sine, the RMS for noise.

use std::f32::consts::PI;
use std::str::FromStr;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

use crate::error::{MeterError, Result};

#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Waveform {
    /// Sine at `frequency_hz` with peak amplitude `peak_dbfs`
    Sine { frequency_hz: f32, peak_dbfs: f32 },
    /// Gaussian white noise with RMS `rms_dbfs`
    WhiteNoise { rms_dbfs: f32 },
    Silence,
}

/// Parses `sine:<hz>:<peak dBFS>`, `noise:<rms dBFS>` or `silence`
impl FromStr for Waveform {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split(':').collect();
        let number = |p: &str| {
            p.trim()
                .parse::<f32>()
                .map_err(|_| format!("invalid number {:?} in {:?}", p, s))
        };
        match parts.as_slice() {
            ["sine", hz, db] => Ok(Self::Sine {
                frequency_hz: number(hz)?,
                peak_dbfs: number(db)?,
            }),
            ["noise", db] => Ok(Self::WhiteNoise {
                rms_dbfs: number(db)?,
            }),
            ["silence"] => Ok(Self::Silence),
            _ => Err(format!(
                "invalid waveform {:?}; use sine:<hz>:<dbfs>, noise:<dbfs> or silence",
                s
            )),
        }
    }
}

pub fn dbfs_to_amplitude(dbfs: f32) -> f32 {
    10.0_f32.powf(dbfs / 20.0)
}

fn create_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => rand::make_rng(),
    }
}

pub fn generate_channel(
    waveform: &Waveform,
    duration_secs: f32,
    sample_rate: u32,
    rng: &mut ChaCha8Rng,
) -> Result<Vec<f32>> {
    let num_samples = (duration_secs * sample_rate as f32) as usize;

    let samples = match *waveform {
        Waveform::Sine {
            frequency_hz,
            peak_dbfs,
        } => {
            let amplitude = dbfs_to_amplitude(peak_dbfs);
            let step = 2.0 * PI * frequency_hz / sample_rate as f32;
            (0..num_samples)
                .map(|i| amplitude * (step * i as f32).sin())
                .collect()
        }
        Waveform::WhiteNoise { rms_dbfs } => {
            let sigma = dbfs_to_amplitude(rms_dbfs) as f64;
            let normal = Normal::new(0.0, sigma)
                .map_err(|e| MeterError::Config(format!("noise level {}: {}", rms_dbfs, e)))?;
            (0..num_samples)
                .map(|_| normal.sample(rng) as f32)
                .collect()
        }
        Waveform::Silence => vec![0.0; num_samples],
    };
    Ok(samples)
}

/// One waveform per channel, interleaved
///
/// The same seed reproduces the same noise.
pub fn generate_interleaved(
    channels: &[Waveform],
    duration_secs: f32,
    sample_rate: u32,
    seed: Option<u64>,
) -> Result<Vec<f32>> {
    let mut rng = create_rng(seed);
    let planar = channels
        .iter()
        .map(|w| generate_channel(w, duration_secs, sample_rate, &mut rng))
        .collect::<Result<Vec<_>>>()?;

    let frames = planar.first().map_or(0, Vec::len);
    let mut out = Vec::with_capacity(frames * planar.len());
    for i in 0..frames {
        for channel in &planar {
            out.push(channel[i]);
        }
    }
    Ok(out)
}
