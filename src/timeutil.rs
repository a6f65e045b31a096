//! Date and time resolution helpers for the fetch orchestrator.
//!
//! Venue pages rarely carry complete timestamps: times come as loose
//! `"OPEN 18:30"` strings, hours run past midnight as `25:30`, and the year
//! is often nowhere on the page. Everything here normalizes those fragments
//! into absolute JST timestamps.

use chrono::{DateTime, Datelike, Days, FixedOffset, NaiveDate, TimeZone, Timelike, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Result, ScraperError};

/// Japan Standard Time; every venue in the catalog publishes in JST.
pub static JST: Lazy<FixedOffset> =
    Lazy::new(|| FixedOffset::east_opt(9 * 3600).expect("static offset"));

/// Reserved clock value meaning "the page had no parsable time".
///
/// 03:24 is deliberately outside plausible livehouse business hours so a
/// sentinel can never collide with a real open or start time.
pub const UNKNOWN_HOUR: u32 = 3;
pub const UNKNOWN_MINUTE: u32 = 24;

static FIRST_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("static regex"));
static CLOCK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{2}:\d{2}").expect("static regex"));

pub fn is_unknown_time(t: &DateTime<FixedOffset>) -> bool {
    t.hour() == UNKNOWN_HOUR && t.minute() == UNKNOWN_MINUTE
}

pub fn now_jst() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&*JST)
}

fn digits(bytes: &[u8]) -> String {
    bytes
        .iter()
        .filter(|b| b.is_ascii_digit())
        .map(|b| *b as char)
        .collect()
}

/// Pulls `(hour, minute, next_day)` out of a loose time string.
///
/// Looks at the two bytes on either side of the first colon, so labels and
/// surrounding prose are tolerated. Hours of 24 and above roll over into the
/// next day. Anything unparsable yields the unknown-time sentinel.
pub fn clock_from_str(s: &str) -> (u32, u32, bool) {
    let bytes = s.as_bytes();
    let colon = match bytes.iter().position(|b| *b == b':') {
        Some(i) => i,
        None => return (UNKNOWN_HOUR, UNKNOWN_MINUTE, false),
    };
    let hour_str = digits(&bytes[colon.saturating_sub(2)..colon]);
    let minute_str = digits(&bytes[colon + 1..(colon + 3).min(bytes.len())]);
    let hour: u32 = match hour_str.parse() {
        Ok(h) => h,
        Err(_) => return (UNKNOWN_HOUR, UNKNOWN_MINUTE, false),
    };
    let minute: u32 = minute_str.parse().unwrap_or(0);
    if hour >= 24 {
        (hour - 24, minute, true)
    } else {
        (hour, minute, false)
    }
}

/// Resolves a loose time string against a date into an absolute JST
/// timestamp, advancing one day when the hour rolled past midnight.
pub fn parse_time(date: NaiveDate, s: &str) -> Result<DateTime<FixedOffset>> {
    let (hour, minute, next_day) = clock_from_str(s);
    let naive = date
        .and_hms_opt(hour, minute, 0)
        .ok_or_else(|| ScraperError::Scrape {
            message: format!("invalid clock {hour:02}:{minute:02} on {date}"),
        })?;
    let mut res = JST
        .from_local_datetime(&naive)
        .single()
        .ok_or_else(|| ScraperError::Scrape {
            message: format!("ambiguous local time {naive}"),
        })?;
    if next_day {
        res = res
            .checked_add_days(Days::new(1))
            .ok_or_else(|| ScraperError::Scrape {
                message: format!("date overflow from {naive}"),
            })?;
    }
    Ok(res)
}

/// First run of consecutive digits in `s`, if any.
pub fn first_number(s: &str) -> Option<&str> {
    FIRST_NUMBER.find(s).map(|m| m.as_str())
}

pub fn pad2(s: &str) -> String {
    format!("{s:0>2}")
}

/// Year for a live whose page only shows a month. Months before the current
/// calendar month are assumed to be next year; months at or after it, this
/// year.
pub fn relevant_year(month: u32) -> i32 {
    let now = now_jst();
    if month < now.month() {
        now.year() + 1
    } else {
        now.year()
    }
}

fn find_nth_clock(s: &str, n: usize) -> String {
    match CLOCK.find_iter(s).take(n).last() {
        Some(m) => m.as_str().to_string(),
        None => format!("{UNKNOWN_HOUR:02}:{UNKNOWN_MINUTE:02}"),
    }
}

fn marker_ordinal(marker: &str) -> usize {
    match marker {
        "open" => 1,
        _ => 2,
    }
}

/// Digs a clock string out of an unstructured detail blob.
///
/// Prefers the text right after the given marker (`"open"` or `"start"`);
/// when the blob has no usable marker, falls back to the nth `hh:mm` in the
/// blob (first for open, second for start).
pub fn find_time(s: &str, marker: &str) -> String {
    let lower = s.to_lowercase();
    let after = match lower.split_once(marker) {
        Some((head, tail)) => {
            // Pages writing "OPEN/START 18:00/18:30" put both clocks after
            // the combined label; pick the half matching our marker.
            if head.trim_end().ends_with('/') {
                match tail.split_once('/') {
                    Some((_, second)) => second.trim().to_string(),
                    None => return find_nth_clock(s, marker_ordinal(marker)),
                }
            } else {
                tail.trim().to_string()
            }
        }
        None => return find_nth_clock(s, marker_ordinal(marker)),
    };
    let head: String = after.chars().take(5).collect();
    if CLOCK.is_match(&head) {
        head
    } else {
        find_nth_clock(s, marker_ordinal(marker))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_from_loose_strings() {
        assert_eq!(clock_from_str("12:34"), (12, 34, false));
        assert_eq!(clock_from_str("1:2"), (1, 2, false));
        assert_eq!(clock_from_str("OPEN 18:30 / START 19:00"), (18, 30, false));
        assert_eq!(clock_from_str("not a time"), (UNKNOWN_HOUR, UNKNOWN_MINUTE, false));
    }

    #[test]
    fn hours_past_midnight_roll_over() {
        assert_eq!(clock_from_str("25:30"), (1, 30, true));
        let date = NaiveDate::from_ymd_opt(2023, 11, 1).unwrap();
        let t = parse_time(date, "25:30").unwrap();
        assert_eq!(t, JST.with_ymd_and_hms(2023, 11, 2, 1, 30, 0).unwrap());
    }

    #[test]
    fn unparsable_time_becomes_sentinel() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        let t = parse_time(date, "TBA").unwrap();
        assert!(is_unknown_time(&t));
        assert_eq!(t.date_naive(), date);
    }

    #[test]
    fn first_number_isolates_digits() {
        assert_eq!(first_number("2024年"), Some("2024"));
        assert_eq!(first_number("第3回"), Some("3"));
        assert_eq!(first_number("none"), None);
        assert_eq!(pad2("7"), "07");
    }

    #[test]
    fn find_time_prefers_marker() {
        assert_eq!(find_time("OPEN 18:00 / START 19:00", "open"), "18:00");
        assert_eq!(find_time("OPEN 18:00 / START 19:00", "start"), "19:00");
        assert_eq!(find_time("OPEN/START 18:00/18:30", "start"), "18:30");
        // No marker at all: nth clock fallback.
        assert_eq!(find_time("18:00 19:00", "start"), "19:00");
        assert_eq!(find_time("no clocks here", "open"), "03:24");
    }
}
