use chrono::{NaiveDateTime, Weekday};

/// Parse an invoice timestamp in the feed's `MM/DD/YYYY HH:MM` layout.
/// The raw files do not zero-pad fields (`12/1/2010 8:26`), which
/// `%m/%d/%Y %H:%M` accepts. Anything else, including trailing seconds,
/// is rejected.
pub fn parse_invoice_datetime(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s.trim(), "%m/%d/%Y %H:%M").ok()
}

/// Calendar month bucket used as the time-series key, e.g. `2010-12`.
pub fn year_month(ts: NaiveDateTime) -> String {
    ts.format("%Y-%m").to_string()
}

/// Full English weekday name.
pub fn day_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}
