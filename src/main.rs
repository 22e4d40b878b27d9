use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;

use levelmeter::audio::{AudioCapture, SampleSource, audio_buffer};
use levelmeter::config::{MeterConfig, ResponsePreset, ResponseTime};
use levelmeter::display::FormattingSink;
use levelmeter::dock::{Dock, VisualizerFactory};
use levelmeter::error::MeterError;
use levelmeter::levels::{LevelsMeter, PEAK_RESPONSE_TIME_KEY, RMS_RESPONSE_TIME_KEY};
use levelmeter::output::{OutputFormat, create_formatter};
use levelmeter::settings::{MemorySettings, write_f64};
use levelmeter::visualizer::{Visualizer, VisualizerKind};

#[derive(Parser, Debug)]
#[command(name = "levelmeter")]
#[command(about = "Live peak/RMS level meter for the default input device", long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Settings file restored at start and saved on exit
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Output format: text, json, csv
    #[arg(short = 'f', long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Sample rate in Hz
    #[arg(long)]
    sample_rate: Option<u32>,

    /// Number of input channels
    #[arg(long)]
    channels: Option<u16>,

    /// Standard RMS ballistics: impulse, fast, vu, slow
    #[arg(short = 'p', long, value_enum)]
    preset: Option<ResponsePreset>,

    /// RMS response time (e.g., "300ms", "0.3s")
    #[arg(long)]
    rms_response: Option<ResponseTime>,

    /// Peak response time (e.g., "25ms")
    #[arg(long)]
    peak_response: Option<ResponseTime>,

    /// Stop after this many seconds
    #[arg(short = 'd', long)]
    duration: Option<f64>,

    /// Draw a bar graph next to the readouts
    #[arg(short = 'b', long)]
    bars: bool,

    /// Increase log verbosity
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
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

    let config = build_config(&args)?;
    let deadline = display_deadline(args.duration)?;
    let mut settings = match args.settings {
        Some(ref path) => MemorySettings::load(path)?,
        None => MemorySettings::new(),
    };
    // Command-line response times win over saved settings
    if args.preset.is_some() || args.rms_response.is_some() {
        write_f64(&mut settings, RMS_RESPONSE_TIME_KEY, config.levels.rms_response_time);
    }
    if args.peak_response.is_some() {
        write_f64(
            &mut settings,
            PEAK_RESPONSE_TIME_KEY,
            config.levels.peak_response_time,
        );
    }

    let (writer, reader) = audio_buffer(config.audio.queue_depth);
    let _capture = AudioCapture::new(&config.audio, writer).context("Failed to start capture")?;

    let factory = levels_factory(config.clone(), args.format, args.bars);
    let mut dock = Dock::new("Central dock", reader, factory, VisualizerKind::Levels)?;
    dock.restore_state(&settings)
        .context("Failed to restore settings")?;
    dock.settings_called();

    let running = Arc::new(AtomicBool::new(true));
    let handler_flag = Arc::clone(&running);
    ctrlc::set_handler(move || handler_flag.store(false, Ordering::SeqCst))
        .context("Failed to install interrupt handler")?;

    // Discard whatever queued up while the stream was starting
    dock.source_mut().discard_pending();
    run_display_loop(&mut dock, config.display.tick_period, deadline, &running);

    if let Some(ref path) = args.settings {
        dock.save_state(&mut settings)?;
        settings.save(path)?;
        log::info!("Settings saved to {}", path.display());
    }

    Ok(())
}

fn build_config(args: &Args) -> anyhow::Result<MeterConfig> {
    let mut config = match args.config {
        Some(ref path) => MeterConfig::from_toml_file(path)?,
        None => MeterConfig::default(),
    };

    if let Some(rate) = args.sample_rate {
        config.audio.sample_rate = rate;
    }
    if let Some(channels) = args.channels {
        config.audio.channels = channels;
    }
    if let Some(preset) = args.preset {
        config.levels.rms_response_time = preset.response_time().as_secs();
    }
    if let Some(rms) = args.rms_response {
        config.levels.rms_response_time = rms.as_secs();
    }
    if let Some(peak) = args.peak_response {
        config.levels.peak_response_time = peak.as_secs();
    }

    config.estimator().validate()?;
    Ok(config)
}

fn levels_factory(config: MeterConfig, format: OutputFormat, bars: bool) -> VisualizerFactory {
    Box::new(move |kind: VisualizerKind| -> levelmeter::Result<Box<dyn Visualizer>> {
        match kind {
            VisualizerKind::Levels => {
                let sink = FormattingSink::new(io::stdout(), create_formatter(format, bars));
                let meter = LevelsMeter::from_config(&config, sink)?;
                Ok(Box::new(meter))
            }
            other => Err(MeterError::Config(format!(
                "{} is not available in the terminal",
                other
            ))),
        }
    })
}

/// Validate `--duration`; `None` runs until interrupted
fn display_deadline(duration: Option<f64>) -> anyhow::Result<Option<Duration>> {
    match duration {
        None => Ok(None),
        Some(secs) if secs > 0.0 && secs.is_finite() => Ok(Some(Duration::from_secs_f64(secs))),
        Some(secs) => anyhow::bail!("Duration must be positive and finite, got {}", secs),
    }
}

/// Tick at the display period until the duration elapses or `running`
/// is cleared
///
/// Ticks are scheduled on a fixed grid; if a tick runs late the missed
/// slots are skipped rather than run back to back.
fn run_display_loop<S: SampleSource>(
    dock: &mut Dock<S>,
    tick_period: f64,
    duration: Option<Duration>,
    running: &AtomicBool,
) -> usize {
    let period = Duration::from_secs_f64(tick_period);
    let start = Instant::now();
    let deadline = duration.map(|d| start + d);
    let mut next_tick = start;
    let mut ticks = 0;

    while running.load(Ordering::SeqCst) {
        let now = Instant::now();
        if deadline.is_some_and(|d| now >= d) {
            break;
        }
        if now < next_tick {
            std::thread::sleep(next_tick - now);
        }

        dock.update();
        ticks += 1;

        next_tick += period;
        let now = Instant::now();
        if now > next_tick {
            let behind = (now - next_tick).as_secs_f64();
            let skipped = (behind / tick_period).ceil() as u32;
            log::warn!("Display tick overran, skipping {} tick(s)", skipped);
            next_tick += period * skipped;
        }
    }

    if !running.load(Ordering::SeqCst) {
        log::info!("Interrupted after {} ticks", ticks);
    }
    ticks
}

#[cfg(test)]
mod tests {
    use super::*;
    use levelmeter::audio::SampleBlock;
    use levelmeter::display::NullSink;
    use std::collections::VecDeque;

    fn test_dock() -> Dock<VecDeque<SampleBlock>> {
        let factory: VisualizerFactory = Box::new(
            |_kind: VisualizerKind| -> levelmeter::Result<Box<dyn Visualizer>> {
                let meter = LevelsMeter::from_config(&MeterConfig::default(), NullSink)?;
                Ok(Box::new(meter))
            },
        );
        Dock::new("Test dock", VecDeque::new(), factory, VisualizerKind::Levels).unwrap()
    }

    #[test]
    fn test_display_deadline_validation() {
        assert_eq!(display_deadline(None).unwrap(), None);
        assert_eq!(
            display_deadline(Some(1.5)).unwrap(),
            Some(Duration::from_millis(1500))
        );
        assert!(display_deadline(Some(-1.0)).is_err());
        assert!(display_deadline(Some(0.0)).is_err());
        assert!(display_deadline(Some(f64::NAN)).is_err());
        assert!(display_deadline(Some(f64::INFINITY)).is_err());
    }

    #[test]
    fn test_cleared_flag_skips_loop() {
        let mut dock = test_dock();
        let running = AtomicBool::new(false);
        assert_eq!(run_display_loop(&mut dock, 0.025, None, &running), 0);
    }

    #[test]
    fn test_interrupt_ends_unbounded_loop() {
        let mut dock = test_dock();
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let stopper = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(60));
            flag.store(false, Ordering::SeqCst);
        });

        let ticks = run_display_loop(&mut dock, 0.005, None, &running);
        stopper.join().unwrap();
        assert!(ticks > 0);
    }

    #[test]
    fn test_args_accept_duration() {
        let args = Args::parse_from(["levelmeter", "--duration", "2.5"]);
        assert_eq!(args.duration, Some(2.5));
    }
}
