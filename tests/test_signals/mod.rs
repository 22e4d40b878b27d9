#![allow(dead_code)]

use std::f32::consts::PI;

use levelmeter::audio::SampleBlock;
use levelmeter::display::DisplaySink;

/// Sine of `frames` samples with peak amplitude `amplitude`
pub fn sine(frames: usize, frequency_hz: f32, sample_rate: f32, amplitude: f32) -> Vec<f32> {
    let step = 2.0 * PI * frequency_hz / sample_rate;
    (0..frames)
        .map(|i| amplitude * (step * i as f32).sin())
        .collect()
}

pub fn mono_sine_block(frames: usize, amplitude: f32) -> SampleBlock {
    SampleBlock::mono(sine(frames, 1000.0, 48000.0, amplitude))
}

pub fn constant_block(channels: usize, frames: usize, value: f32) -> SampleBlock {
    SampleBlock::new(vec![vec![value; frames]; channels])
}

/// Everything a meter pushed, tick by tick
#[derive(Debug, Default)]
pub struct RecordingSink {
    /// `(channel, rms_db, peak_db)` per `set_level` call
    pub levels: Vec<(usize, f64, f64)>,
    pub channel_counts: Vec<usize>,
    /// `(tick, channel, rms, peak)` per `set_text` call
    pub texts: Vec<(usize, usize, String, String)>,
    pub ticks: usize,
}

impl RecordingSink {
    /// Ticks (0-based) on which text readouts arrived
    pub fn text_ticks(&self) -> Vec<usize> {
        let mut ticks: Vec<usize> = self.texts.iter().map(|t| t.0).collect();
        ticks.dedup();
        ticks
    }
}

impl DisplaySink for RecordingSink {
    fn set_level(&mut self, channel: usize, rms_db: f64, peak_db: f64) {
        self.levels.push((channel, rms_db, peak_db));
    }

    fn set_channel_count(&mut self, count: usize) {
        self.channel_counts.push(count);
    }

    fn set_text(&mut self, channel: usize, rms: &str, peak: &str) {
        self.texts
            .push((self.ticks, channel, rms.to_string(), peak.to_string()));
    }

    fn end_tick(&mut self) {
        self.ticks += 1;
    }
}
