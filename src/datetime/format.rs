//! Turning dates and times into words that sound natural when spoken

use chrono::{Datelike, NaiveDate, NaiveTime};

use crate::config::TimeFormat;

/// "today", "tomorrow", "yesterday", or "Monday, October 26" (with the year when it is not the current one)
pub fn nice_date(date: NaiveDate, today: NaiveDate) -> String {
    match (date - today).num_days() {
        0 => "today".to_string(),
        1 => "tomorrow".to_string(),
        -1 => "yesterday".to_string(),
        _ => {
            if date.year() == today.year() {
                date.format("%A, %B %-d").to_string()
            } else {
                date.format("%A, %B %-d, %Y").to_string()
            }
        },
    }
}

/// "3:00 PM" or "15:00", depending on the user preference
pub fn nice_time(time: NaiveTime, format: TimeFormat) -> String {
    match format {
        TimeFormat::Half => time.format("%-I:%M %p").to_string(),
        TimeFormat::Full => time.format("%H:%M").to_string(),
    }
}
