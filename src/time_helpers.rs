use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};

pub fn local_date_string(at: NaiveDateTime) -> String {
    at.format("%Y-%m-%d").to_string()
}

pub fn local_time_string(at: NaiveDateTime) -> String {
    format!("{:02}:{:02}", at.hour(), at.minute())
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

// Accepts "HH:MM" and "HH:MM:SS"
pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .ok()
}

pub fn combine(date: &str, time: &str) -> Option<NaiveDateTime> {
    Some(parse_date(date)?.and_time(parse_time(time)?))
}

/// Human duration between two date/time pairs.
///
/// Empty when any part is missing, `"Invalid"` when the end is not after the
/// start, otherwise `"2h"`, `"45m"` or `"2h 45m"`.
pub fn calculate_duration(start_date: &str, start_time: &str, end_date: &str, end_time: &str) -> String {
    if [start_date, start_time, end_date, end_time]
        .iter()
        .any(|s| s.trim().is_empty())
    {
        return String::new();
    }
    let (Some(start), Some(end)) = (combine(start_date, start_time), combine(end_date, end_time)) else {
        return "Invalid".to_string();
    };

    let minutes_total = (end - start).num_minutes();
    if end <= start {
        return "Invalid".to_string();
    }

    let hours = minutes_total / 60;
    let minutes = minutes_total % 60;
    match (hours, minutes) {
        (0, m) => format!("{m}m"),
        (h, 0) => format!("{h}h"),
        (h, m) => format!("{h}h {m}m"),
    }
}
