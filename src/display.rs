//! Receivers of meter output
//!
//! The levels meter never renders anything itself. It pushes continuous
//! levels every tick and text readouts at the label cadence to a
//! [`DisplaySink`], which may be a GUI meter, a terminal printer or a test
//! recorder.

use std::io::Write;

use crate::levels::ChannelLevels;
use crate::output::{Formatter, LevelOutput};

pub trait DisplaySink {
    /// Continuous meter values for one channel, every tick
    fn set_level(&mut self, channel: usize, rms_db: f64, peak_db: f64);

    /// Number of meter ports; called only when it changes
    fn set_channel_count(&mut self, count: usize);

    /// Text readouts for one channel, at the label cadence
    fn set_text(&mut self, channel: usize, rms: &str, peak: &str);

    /// Called after all of a tick's calls
    fn end_tick(&mut self) {}
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DisplaySink for NullSink {
    fn set_level(&mut self, _channel: usize, _rms_db: f64, _peak_db: f64) {}
    fn set_channel_count(&mut self, _count: usize) {}
    fn set_text(&mut self, _channel: usize, _rms: &str, _peak: &str) {}
}

/// Writes one formatted record per text refresh
///
/// Levels are collected during the tick; when the tick carried text
/// readouts, [`DisplaySink::end_tick`] formats and writes them.
pub struct FormattingSink<W: Write> {
    writer: W,
    formatter: Box<dyn Formatter>,
    levels: Vec<ChannelLevels>,
    text: Vec<(String, String)>,
    text_pending: bool,
    header_written: bool,
}

impl<W: Write> FormattingSink<W> {
    pub fn new(writer: W, formatter: Box<dyn Formatter>) -> Self {
        Self {
            writer,
            formatter,
            levels: Vec::new(),
            text: Vec::new(),
            text_pending: false,
            header_written: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn ensure_channel(&mut self, channel: usize) {
        if self.levels.len() <= channel {
            self.levels.resize(
                channel + 1,
                ChannelLevels {
                    rms_db: f64::NEG_INFINITY,
                    peak_db: f64::NEG_INFINITY,
                },
            );
            self.text.resize(channel + 1, Default::default());
        }
    }
}

impl<W: Write> DisplaySink for FormattingSink<W> {
    fn set_level(&mut self, channel: usize, rms_db: f64, peak_db: f64) {
        self.ensure_channel(channel);
        self.levels[channel] = ChannelLevels { rms_db, peak_db };
    }

    fn set_channel_count(&mut self, count: usize) {
        self.levels.truncate(count);
        self.text.truncate(count);
    }

    fn set_text(&mut self, channel: usize, rms: &str, peak: &str) {
        self.ensure_channel(channel);
        self.text[channel] = (rms.to_string(), peak.to_string());
        self.text_pending = true;
    }

    fn end_tick(&mut self) {
        if !self.text_pending {
            return;
        }
        self.text_pending = false;

        if !self.header_written {
            self.header_written = true;
            if let Some(header) = self.formatter.header() {
                if let Err(e) = writeln!(self.writer, "{}", header) {
                    log::warn!("Failed to write header: {}", e);
                }
            }
        }

        let output = LevelOutput::new(&self.levels, &self.text);
        let line = self.formatter.format(&output);
        if let Err(e) = writeln!(self.writer, "{}", line).and_then(|_| self.writer.flush()) {
            log::warn!("Failed to write levels: {}", e);
        }
    }
}
