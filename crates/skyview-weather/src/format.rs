//! Display formatting for provider timestamps and the observation date label.

use chrono::{DateTime, Datelike, Local};

/// Format a UTC UNIX timestamp shifted by the city's UTC offset as a
/// 12-hour clock string, e.g. `"06:12 AM"`.
///
/// Returns `None` if the shifted timestamp is out of range.
pub fn format_local_time(unix_utc: i64, offset_secs: i64) -> Option<String> {
    let shifted = unix_utc.checked_add(offset_secs)?;
    DateTime::from_timestamp(shifted, 0).map(|dt| dt.format("%I:%M %p").to_string())
}

/// Observation date label from the client's clock, e.g.
/// `"Monday, October 19, 2026"`.
pub fn date_label<Tz>(now: &DateTime<Tz>) -> String
where
    Tz: chrono::TimeZone,
    Tz::Offset: std::fmt::Display,
{
    format!("{}, {} {}, {}", now.format("%A"), now.format("%B"), now.day(), now.year())
}

/// `date_label` for the current local day.
pub fn today_label() -> String {
    date_label(&Local::now())
}
