//! Allotted-time helpers. Allotted time is stored in whole minutes.

/// Render minutes as `"2h 5m"`, or `"45m"` under an hour.
///
/// ```
/// use worklog_core::time::format_minutes;
///
/// assert_eq!(format_minutes(125), "2h 5m");
/// assert_eq!(format_minutes(45), "45m");
/// ```
pub fn format_minutes(minutes: i64) -> String {
    let hours = minutes / 60;
    let mins = minutes % 60;
    if hours > 0 {
        format!("{hours}h {mins}m")
    } else {
        format!("{mins}m")
    }
}

/// Sum of allotted minutes across tasks.
pub fn total_minutes<I>(allotted: I) -> i64
where
    I: IntoIterator<Item = i32>,
{
    allotted.into_iter().map(i64::from).sum()
}
