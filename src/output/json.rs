use serde::Serialize;

use super::{ChannelReadout, Formatter, LevelOutput, iso8601_timestamp};

/// One JSON object per line; non-finite levels serialize as `null`
pub struct JsonFormatter;

#[derive(Serialize)]
struct Record<'a> {
    ts: String,
    channels: &'a [ChannelReadout],
}

impl Formatter for JsonFormatter {
    fn format(&self, output: &LevelOutput) -> String {
        let record = Record {
            ts: iso8601_timestamp(),
            channels: &output.channels,
        };
        serde_json::to_string(&record).unwrap_or_else(|e| {
            log::warn!("Failed to serialize levels: {}", e);
            String::from("{}")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::levels::ChannelLevels;

    #[test]
    fn test_json_non_finite_is_null() {
        let output = LevelOutput::from_levels(&[ChannelLevels {
            rms_db: f64::NAN,
            peak_db: -6.0,
        }]);
        let line = JsonFormatter.format(&output);
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();

        let channel = &value["channels"][0];
        assert!(channel["rms_db"].is_null());
        assert_eq!(channel["peak_db"], -6.0);
        assert_eq!(channel["rms"], "-Inf");
        assert_eq!(channel["peak"], "-06.0");
    }
}
