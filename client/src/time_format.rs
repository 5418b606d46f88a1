use chrono::{DateTime, Datelike, FixedOffset, NaiveDate};

/// "Apr 02, 2012"
pub fn format_date(date: NaiveDate) -> String {
    date.format("%b %d, %Y").to_string()
}

/// Slider end labels: "Apr 2012"
pub fn format_month(date: NaiveDate) -> String {
    date.format("%b %Y").to_string()
}

/// Wall clock in the event's own offset, e.g. "16:10 UTC-05:00".
pub fn format_time(instant: DateTime<FixedOffset>) -> String {
    format!("{} UTC{}", instant.format("%H:%M"), instant.format("%:z"))
}

/// "Apr 02"
pub fn format_month_day(date: NaiveDate) -> String {
    date.format("%b %d").to_string()
}

/// Position of `date` in a 366-day axis, 0-based.
pub fn day_of_year_offset(date: NaiveDate) -> u32 {
    date.ordinal0()
}
