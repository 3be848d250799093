//! Duration formatting for display surfaces.
//!
//! The message catalog renders its duration figures through these helpers;
//! hosts showing a live session timer can reuse them for matching text.

/// Formats whole seconds the way the session timer shows them.
///
/// - under a minute: `42s`
/// - under an hour: `12m 5s`
/// - otherwise: `3h 7m 2s`
pub fn format_seconds(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

/// Formats whole seconds as fractional hours with one decimal,
/// used beside daily goal figures.
pub fn format_hours(total_seconds: u64) -> String {
    format!("{:.1}h", total_seconds as f64 / 3600.0)
}
