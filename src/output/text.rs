use super::{ChannelReadout, Formatter, LevelOutput};

/// Width of the verbose bar graph in characters
const BAR_WIDTH: usize = 40;
/// Bottom of the bar graph scale in dB FS
const BAR_FLOOR_DB: f64 = -60.0;

pub struct TextFormatter {
    verbose: bool,
}

impl TextFormatter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    fn format_channel(&self, c: &ChannelReadout) -> String {
        let readout = format!("RMS: {:>6} dB FS  Peak: {:>6} dB FS", c.rms, c.peak);
        if self.verbose {
            format!("{} {}", bar(c.rms_db, c.peak_db), readout)
        } else {
            readout
        }
    }
}

impl Formatter for TextFormatter {
    fn format(&self, output: &LevelOutput) -> String {
        match output.channels.as_slice() {
            [mono] => self.format_channel(mono),
            channels => channels
                .iter()
                .map(|c| format!("{}: {}", c.channel + 1, self.format_channel(c)))
                .collect::<Vec<_>>()
                .join(" | "),
        }
    }
}

fn bar_position(db: f64) -> usize {
    if !(db > BAR_FLOOR_DB) {
        return 0;
    }
    let fraction = ((db - BAR_FLOOR_DB) / -BAR_FLOOR_DB).min(1.0);
    (fraction * BAR_WIDTH as f64).round() as usize
}

/// `[#########------|-----]`: filled to RMS, `|` at the peak
fn bar(rms_db: f64, peak_db: f64) -> String {
    let filled = bar_position(rms_db);
    let peak = bar_position(peak_db);
    let cells: String = (0..BAR_WIDTH)
        .map(|i| {
            if peak > 0 && i == peak - 1 {
                '|'
            } else if i < filled {
                '#'
            } else {
                '-'
            }
        })
        .collect();
    format!("[{}]", cells)
}
