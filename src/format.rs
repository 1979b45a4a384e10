//! Display formatting for durations and capture timestamps

use chrono::{Local, TimeZone};

/// Format a millisecond duration as zero-padded `HH:MM:SS`
pub fn format_duration(millis: u64) -> String {
    let seconds = millis / 1000;
    let minutes = seconds / 60;
    let hours = minutes / 60;
    format!("{:02}:{:02}:{:02}", hours, minutes % 60, seconds % 60)
}

/// Format a Unix millisecond timestamp in local time, e.g. `16/10/2026 09:41 AM`
pub fn format_date_time(millis: i64) -> String {
    match Local.timestamp_millis_opt(millis).single() {
        Some(date) => date.format("%d/%m/%Y %I:%M %p").to_string(),
        None => String::from("--/--/---- --:-- --"),
    }
}
