//! Clock-style time formatting for display
//!
//! Playback positions are shown as zero-padded `mm:ss`. Minutes are not
//! wrapped into hours, so a 75 minute chapter reads `75:00`.

const SECONDS_PER_MINUTE: u64 = 60;

/// Format seconds as `mm:ss`.
///
/// Fractions are truncated. Negative, NaN and infinite inputs render as
/// `00:00` so a not-yet-loaded duration never shows garbage.
///
/// # Examples
///
/// ```
/// use abk_common::human_time::format_clock;
///
/// assert_eq!(format_clock(5.0), "00:05");
/// assert_eq!(format_clock(65.9), "01:05");
/// assert_eq!(format_clock(4500.0), "75:00");
/// assert_eq!(format_clock(f64::NAN), "00:00");
/// ```
pub fn format_clock(seconds: f64) -> String {
    let whole = if seconds.is_finite() && seconds > 0.0 {
        seconds.trunc() as u64
    } else {
        0
    };

    let minutes = whole / SECONDS_PER_MINUTE;
    let secs = whole % SECONDS_PER_MINUTE;
    format!("{:02}:{:02}", minutes, secs)
}
