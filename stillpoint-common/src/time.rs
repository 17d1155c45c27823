//! Clock display formatting
//!
//! Consistent countdown/elapsed display across UIs.

/// Format a second count as a player clock string.
///
/// Sessions run minutes, not hours, so the format is `M:SS` up to 99:59;
/// anything longer rolls over to `H:MM:SS`.
///
/// # Examples
///
/// ```
/// use stillpoint_common::time::format_clock;
///
/// assert_eq!(format_clock(0), "0:00");
/// assert_eq!(format_clock(65), "1:05");
/// assert_eq!(format_clock(300), "5:00");
/// assert_eq!(format_clock(6000), "1:40:00");
/// ```
pub fn format_clock(seconds: u64) -> String {
    if seconds < 6000 {
        format!("{}:{:02}", seconds / 60, seconds % 60)
    } else {
        let hours = seconds / 3600;
        let mins = (seconds % 3600) / 60;
        let secs = seconds % 60;
        format!("{}:{:02}:{:02}", hours, mins, secs)
    }
}

/// Remaining-time display for a countdown clock
pub fn format_remaining(elapsed: u64, duration: u64) -> String {
    format_clock(duration.saturating_sub(elapsed))
}
