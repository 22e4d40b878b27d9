use clap::Parser;
use rolling_stats::Stats;
use serde::Serialize;
use std::path::{Path, PathBuf};

use levelmeter::audio::WavFileSource;
use levelmeter::config::{MeterConfig, ResponsePreset, ResponseTime};
use levelmeter::display::DisplaySink;
use levelmeter::levels::LevelsMeter;

#[derive(Parser, Debug)]
#[command(name = "analyze_wav")]
#[command(about = "Replay WAV files through the level meter and summarize the levels", long_about = None)]
struct Args {
    /// WAV files to analyze
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Output format: text, csv, json
    #[arg(short = 'f', long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Standard RMS ballistics: impulse, fast, vu, slow
    #[arg(short = 'p', long, value_enum)]
    preset: Option<ResponsePreset>,

    /// RMS response time (e.g., "300ms", "0.3s")
    #[arg(long)]
    rms_response: Option<ResponseTime>,

    /// Peak response time (e.g., "25ms")
    #[arg(long)]
    peak_response: Option<ResponseTime>,

    /// Seconds at the start of each file excluded from the statistics
    #[arg(long, default_value = "0.0")]
    settle: f64,

    /// Increase output verbosity
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Csv,
    Json,
}

#[derive(Debug, Clone, Serialize)]
struct StatsSummary {
    count: usize,
    mean: f64,
    std_dev: f64,
    min: f64,
    max: f64,
}

impl StatsSummary {
    fn from_stats(stats: &Stats<f64>) -> Option<Self> {
        if stats.count == 0 {
            return None;
        }
        Some(Self {
            count: stats.count,
            mean: stats.mean,
            std_dev: stats.std_dev,
            min: stats.min,
            max: stats.max,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
struct ChannelAnalysis {
    channel: usize,
    rms_db: Option<StatsSummary>,
    peak_db: Option<StatsSummary>,
    /// Smoothed levels at the end of the file
    final_rms_db: f64,
    final_peak_db: f64,
}

#[derive(Debug, Clone, Serialize)]
struct FileAnalysis {
    filename: String,
    sample_rate: u32,
    frames: usize,
    ticks: usize,
    channels: Vec<ChannelAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Feeds per-tick meter levels into running statistics
///
/// Ticks before `settle_ticks` and non-finite levels are not counted.
struct StatsSink {
    settle_ticks: usize,
    tick: usize,
    rms: Vec<Stats<f64>>,
    peak: Vec<Stats<f64>>,
}

impl StatsSink {
    fn new(settle_ticks: usize) -> Self {
        Self {
            settle_ticks,
            tick: 0,
            rms: Vec::new(),
            peak: Vec::new(),
        }
    }
}

impl DisplaySink for StatsSink {
    fn set_level(&mut self, channel: usize, rms_db: f64, peak_db: f64) {
        if self.tick < self.settle_ticks {
            return;
        }
        if self.rms.len() <= channel {
            self.rms.resize_with(channel + 1, Stats::new);
            self.peak.resize_with(channel + 1, Stats::new);
        }
        if rms_db.is_finite() {
            self.rms[channel].update(rms_db);
        }
        if peak_db.is_finite() {
            self.peak[channel].update(peak_db);
        }
    }

    fn set_channel_count(&mut self, count: usize) {
        log::debug!("Channel count now {}", count);
    }

    fn set_text(&mut self, channel: usize, rms: &str, peak: &str) {
        log::trace!("ch{} RMS {} dB FS, peak {} dB FS", channel + 1, rms, peak);
    }

    fn end_tick(&mut self) {
        self.tick += 1;
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let mut config = match args.config {
        Some(ref path) => MeterConfig::from_toml_file(path)?,
        None => MeterConfig::default(),
    };
    if let Some(preset) = args.preset {
        config.levels.rms_response_time = preset.response_time().as_secs();
    }
    if let Some(rms) = args.rms_response {
        config.levels.rms_response_time = rms.as_secs();
    }
    if let Some(peak) = args.peak_response {
        config.levels.peak_response_time = peak.as_secs();
    }

    let results: Vec<FileAnalysis> = args
        .files
        .iter()
        .map(|path| analyze_file(path, &config, args.settle))
        .collect();

    match args.format {
        OutputFormat::Text => print_text(&results, &config),
        OutputFormat::Csv => print_csv(&results),
        OutputFormat::Json => print_json(&results)?,
    }

    Ok(())
}

fn analyze_file(path: &Path, config: &MeterConfig, settle: f64) -> FileAnalysis {
    let filename = path
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    match analyze_file_impl(path, config, settle) {
        Ok(mut analysis) => {
            analysis.filename = filename;
            analysis
        }
        Err(e) => FileAnalysis {
            filename,
            sample_rate: 0,
            frames: 0,
            ticks: 0,
            channels: Vec::new(),
            error: Some(e.to_string()),
        },
    }
}

fn analyze_file_impl(path: &Path, config: &MeterConfig, settle: f64) -> anyhow::Result<FileAnalysis> {
    // Each tick carries one display period of audio at the file's rate
    let mut config = config.clone();
    config.audio.sample_rate = file_sample_rate(path)?;

    let chunk_frames = config.frames_per_tick().max(1);
    let mut source = WavFileSource::new(path, chunk_frames)?;
    let settle_ticks = (settle / config.display.tick_period).ceil().max(0.0) as usize;

    log::info!(
        "{}: {} Hz, {} channel(s), {} frames, {} frames per tick",
        path.display(),
        source.sample_rate(),
        source.channel_count(),
        source.frames(),
        chunk_frames
    );

    let mut meter = LevelsMeter::from_config(&config, StatsSink::new(settle_ticks))?;
    let mut ticks = 0;
    while !source.is_exhausted() {
        meter.tick(&mut source);
        ticks += 1;
    }

    let final_levels = meter.estimator().levels().to_vec();
    let sink = meter.into_sink();

    let channels = final_levels
        .iter()
        .enumerate()
        .map(|(channel, levels)| ChannelAnalysis {
            channel: channel + 1,
            rms_db: sink.rms.get(channel).and_then(StatsSummary::from_stats),
            peak_db: sink.peak.get(channel).and_then(StatsSummary::from_stats),
            final_rms_db: levels.rms_db,
            final_peak_db: levels.peak_db,
        })
        .collect();

    Ok(FileAnalysis {
        filename: String::new(),
        sample_rate: source.sample_rate(),
        frames: source.frames(),
        ticks,
        channels,
        error: None,
    })
}

/// Sample rate from the WAV header, without decoding any samples
fn file_sample_rate(path: &Path) -> anyhow::Result<u32> {
    Ok(hound::WavReader::open(path)?.spec().sample_rate)
}

fn fmt_db(value: f64) -> String {
    if value.is_finite() {
        format!("{:.1}", value)
    } else {
        "-Inf".to_string()
    }
}

fn fmt_summary(summary: &Option<StatsSummary>) -> String {
    match summary {
        Some(s) => format!("{:>7.1} ±{:>5.1}  [{:>7.1}, {:>7.1}]", s.mean, s.std_dev, s.min, s.max),
        None => format!("{:>37}", "-"),
    }
}

fn print_text(results: &[FileAnalysis], config: &MeterConfig) {
    eprintln!(
        "RMS response {:.0} ms, peak response {:.0} ms, tick {:.0} ms",
        config.levels.rms_response_time * 1000.0,
        config.levels.peak_response_time * 1000.0,
        config.display.tick_period * 1000.0
    );
    eprintln!();

    println!(
        "{:<40} {:>3} {:>37} {:>37}",
        "File", "Ch", "RMS dB FS (mean ± sd [min, max])", "Peak dB FS (mean ± sd [min, max])"
    );
    println!("{}", "-".repeat(120));

    for result in results {
        if let Some(ref err) = result.error {
            println!("{:<40} ERROR: {}", result.filename, err);
            continue;
        }
        for channel in &result.channels {
            println!(
                "{:<40} {:>3} {} {}",
                result.filename,
                channel.channel,
                fmt_summary(&channel.rms_db),
                fmt_summary(&channel.peak_db)
            );
        }
    }

    for result in results.iter().filter(|r| r.error.is_none()) {
        eprintln!();
        eprintln!(
            "{}: {} frames at {} Hz, {} ticks",
            result.filename, result.frames, result.sample_rate, result.ticks
        );
        for channel in &result.channels {
            eprintln!(
                "  ch{} final: RMS {} dB FS, peak {} dB FS",
                channel.channel,
                fmt_db(channel.final_rms_db),
                fmt_db(channel.final_peak_db)
            );
        }
    }
}

fn print_csv(results: &[FileAnalysis]) {
    println!(
        "filename,channel,ticks,rms_mean,rms_std,rms_min,rms_max,peak_mean,peak_std,peak_min,peak_max,final_rms,final_peak,error"
    );

    fn stats_cols(summary: &Option<StatsSummary>) -> String {
        match summary {
            Some(s) => format!("{:.3},{:.3},{:.3},{:.3}", s.mean, s.std_dev, s.min, s.max),
            None => ",,,".to_string(),
        }
    }

    for result in results {
        if let Some(ref err) = result.error {
            println!("{},,,,,,,,,,,,,\"{}\"", result.filename, err.replace('"', "'"));
            continue;
        }
        for channel in &result.channels {
            println!(
                "{},{},{},{},{},{},{},",
                result.filename,
                channel.channel,
                result.ticks,
                stats_cols(&channel.rms_db),
                stats_cols(&channel.peak_db),
                fmt_db(channel.final_rms_db),
                fmt_db(channel.final_peak_db)
            );
        }
    }
}

fn print_json(results: &[FileAnalysis]) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(results)?;
    println!("{}", json);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_sample_rate_reads_header() {
        let path = std::env::temp_dir().join(format!(
            "levelmeter_analyze_rate_{}.wav",
            std::process::id()
        ));
        levelmeter::save_wav(&path, &[0.0; 441], 1, 44100).unwrap();
        let rate = file_sample_rate(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(rate, 44100);
    }

    #[test]
    fn test_analysis_uses_file_rate() {
        let path = std::env::temp_dir().join(format!(
            "levelmeter_analyze_file_{}.wav",
            std::process::id()
        ));
        levelmeter::save_wav(&path, &vec![0.5; 2 * 8000], 2, 8000).unwrap();
        let analysis = analyze_file(&path, &MeterConfig::default(), 0.0);
        std::fs::remove_file(&path).ok();

        assert!(analysis.error.is_none());
        assert_eq!(analysis.sample_rate, 8000);
        assert_eq!(analysis.frames, 8000);
        // 200 frames per 25 ms tick
        assert_eq!(analysis.ticks, 40);
        assert_eq!(analysis.channels.len(), 2);
    }

    #[test]
    fn test_missing_file_reports_error() {
        let analysis = analyze_file(
            Path::new("/nonexistent/levelmeter.wav"),
            &MeterConfig::default(),
            0.0,
        );
        assert!(analysis.error.is_some());
        assert!(analysis.channels.is_empty());
    }
}
