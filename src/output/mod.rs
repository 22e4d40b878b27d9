mod csv;
mod json;
mod text;

use chrono::Utc;
use serde::Serialize;

use crate::levels::ChannelLevels;

pub use self::csv::CsvFormatter;
pub use self::json::JsonFormatter;
pub use self::text::TextFormatter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Csv,
}

/// One channel's readout at a text refresh
#[derive(Debug, Clone, Serialize)]
pub struct ChannelReadout {
    pub channel: usize,
    pub rms_db: f64,
    pub peak_db: f64,
    pub rms: String,
    pub peak: String,
}

/// All channels' readouts at a text refresh
#[derive(Debug, Clone, Serialize)]
pub struct LevelOutput {
    pub channels: Vec<ChannelReadout>,
}

impl LevelOutput {
    /// Pair continuous levels with their text readouts, channel by channel
    pub fn new(levels: &[ChannelLevels], text: &[(String, String)]) -> Self {
        let channels = levels
            .iter()
            .zip(text)
            .enumerate()
            .map(|(channel, (levels, (rms, peak)))| ChannelReadout {
                channel,
                rms_db: levels.rms_db,
                peak_db: levels.peak_db,
                rms: rms.clone(),
                peak: peak.clone(),
            })
            .collect();
        Self { channels }
    }

    pub fn from_levels(levels: &[ChannelLevels]) -> Self {
        let text: Vec<(String, String)> = levels
            .iter()
            .map(|l| (l.rms_text(), l.peak_text()))
            .collect();
        Self::new(levels, &text)
    }
}

pub trait Formatter: Send {
    fn format(&self, output: &LevelOutput) -> String;

    fn header(&self) -> Option<&'static str> {
        None
    }
}

pub fn create_formatter(format: OutputFormat, verbose: bool) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter::new(verbose)),
        OutputFormat::Json => Box::new(JsonFormatter),
        OutputFormat::Csv => Box::new(CsvFormatter),
    }
}

pub fn iso8601_timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}
