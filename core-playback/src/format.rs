//! Elapsed/duration text shown next to a playing row.

/// Format whole seconds as `M:SS`. Minutes are not zero-padded and keep
/// growing past 59 (`3725` becomes `"62:05"`).
///
/// ```
/// use core_playback::format_seconds;
///
/// assert_eq!(format_seconds(125), "2:05");
/// assert_eq!(format_seconds(59), "0:59");
/// ```
pub fn format_seconds(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// `M:SS / M:SS` progress label.
pub fn format_progress(current_secs: u64, total_secs: u64) -> String {
    format!(
        "{} / {}",
        format_seconds(current_secs),
        format_seconds(total_secs)
    )
}
