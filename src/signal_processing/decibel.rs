use crate::constants::{DISPLAY_FLOOR_DB, NEG_INF_LABEL};

/// Power-domain value (mean square) to dB
pub fn power_to_db(power: f64) -> f64 {
    10.0 * power.log10()
}

/// Amplitude-domain value to dB
pub fn amplitude_to_db(amplitude: f64) -> f64 {
    20.0 * amplitude.log10()
}

/// Format a level for a text readout
///
/// Signed, zero-padded to five characters with one decimal (`+00.0`,
/// `-12.3`, `-100.0`). Levels at or below [`DISPLAY_FLOOR_DB`], and NaN,
/// read `-Inf`.
pub fn format_level(db: f64) -> String {
    if db > DISPLAY_FLOOR_DB {
        format!("{:+05.1}", db)
    } else {
        NEG_INF_LABEL.to_string()
    }
}
