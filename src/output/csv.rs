use super::{Formatter, LevelOutput, iso8601_timestamp};

/// One row per channel
pub struct CsvFormatter;

impl Formatter for CsvFormatter {
    fn format(&self, output: &LevelOutput) -> String {
        let ts = iso8601_timestamp();
        output
            .channels
            .iter()
            .map(|c| format!("{},{},{},{}", ts, c.channel, c.rms, c.peak))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn header(&self) -> Option<&'static str> {
        Some("ts,channel,rms_db,peak_db")
    }
}
