use anyhow::{Context, Result};
use clap::Parser;
use levelmeter::save_wav;
use levelmeter::simulation::{Waveform, generate_interleaved};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "generate_wav")]
#[command(about = "Generate calibration WAV files for checking meter readings")]
struct Args {
    /// Output WAV file
    #[arg(default_value = "calibration.wav")]
    output: PathBuf,

    /// TOML file listing one [[channel]] table per channel
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Waveform per channel: "sine:<hz>:<peak dBFS>", "noise:<rms dBFS>" or "silence".
    /// Repeat for more channels; overrides the config file.
    #[arg(short, long = "wave")]
    waves: Vec<Waveform>,

    /// Base seed for reproducible noise
    #[arg(short, long)]
    seed: Option<u64>,

    /// Signal duration in seconds
    #[arg(short, long, default_value_t = 2.0)]
    duration: f32,

    /// Sample rate in Hz
    #[arg(long, default_value_t = 48000)]
    sample_rate: u32,
}

#[derive(Debug, Deserialize, Default)]
struct TomlConfig {
    #[serde(default)]
    channel: Vec<Waveform>,
}

fn load_toml_config(path: &PathBuf) -> Result<TomlConfig> {
    let content = fs::read_to_string(path).context("Failed to read config file")?;
    toml::from_str(&content).context("Failed to parse config file")
}

fn main() -> Result<()> {
    let args = Args::parse();

    let toml_config = if let Some(ref config_path) = args.config {
        load_toml_config(config_path)?
    } else {
        TomlConfig::default()
    };

    let waves = if !args.waves.is_empty() {
        args.waves.clone()
    } else if !toml_config.channel.is_empty() {
        toml_config.channel
    } else {
        vec![Waveform::Sine {
            frequency_hz: 1000.0,
            peak_dbfs: -6.0,
        }]
    };

    if args.duration <= 0.0 {
        anyhow::bail!("Duration must be positive");
    }
    let channels = u16::try_from(waves.len()).context("Too many channels")?;

    let signal = generate_interleaved(&waves, args.duration, args.sample_rate, args.seed)
        .context("Failed to generate signal")?;

    save_wav(&args.output, &signal, channels, args.sample_rate)
        .context("Failed to write WAV file")?;

    for (i, wave) in waves.iter().enumerate() {
        eprintln!("  ch{}: {:?}", i + 1, wave);
    }
    eprintln!(
        "Wrote {} ({} channel(s), {:.2} s at {} Hz)",
        args.output.display(),
        channels,
        args.duration,
        args.sample_rate
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toml_channels() {
        let config: TomlConfig = toml::from_str(
            r#"
            [[channel]]
            type = "sine"
            frequency_hz = 440.0
            peak_dbfs = -3.0

            [[channel]]
            type = "white_noise"
            rms_dbfs = -20.0
            "#,
        )
        .unwrap();

        assert_eq!(config.channel.len(), 2);
        assert_eq!(
            config.channel[0],
            Waveform::Sine {
                frequency_hz: 440.0,
                peak_dbfs: -3.0
            }
        );
        assert_eq!(config.channel[1], Waveform::WhiteNoise { rms_dbfs: -20.0 });
    }

    #[test]
    fn test_cli_waves() {
        let args = Args::parse_from([
            "generate_wav",
            "out.wav",
            "--wave",
            "sine:1000:-6",
            "--wave",
            "silence",
        ]);
        assert_eq!(args.waves.len(), 2);
        assert_eq!(args.waves[1], Waveform::Silence);
    }
}
