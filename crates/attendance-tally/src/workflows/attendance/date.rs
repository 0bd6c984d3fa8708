use super::domain::ParsedDate;
use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;

static FILENAME_DATE: OnceLock<Regex> = OnceLock::new();
static MONTH_DAY: OnceLock<Regex> = OnceLock::new();

fn filename_date_pattern() -> &'static Regex {
    FILENAME_DATE.get_or_init(|| {
        Regex::new(r"(\d{4}[.-]?\d{2}[.-]?\d{2}|\d{1,2}월\s*\d{1,2}일|\d{4})")
            .expect("filename date pattern is valid")
    })
}

fn month_day_pattern() -> &'static Regex {
    MONTH_DAY.get_or_init(|| {
        Regex::new(r"(\d{1,2})월\s*(\d{1,2})일").expect("month/day pattern is valid")
    })
}

/// Reads the attendance date encoded in a log's file name.
///
/// Only the first date-like run in the name is considered. Full dates
/// (`20240509`, `2024-05-09`, `2024.05.09`) keep their own year; `5월 9일` and
/// bare `0509` codes are placed in `assumed_year`. A match that is not a real
/// calendar day yields `None`.
pub fn parse_filename_date(filename: &str, assumed_year: i32) -> Option<ParsedDate> {
    let matched = filename_date_pattern().find(filename)?.as_str();

    if matched.contains('월') {
        let captures = month_day_pattern().captures(matched)?;
        let month = captures.get(1)?.as_str().parse::<u32>().ok()?;
        let day = captures.get(2)?.as_str().parse::<u32>().ok()?;
        return NaiveDate::from_ymd_opt(assumed_year, month, day).map(ParsedDate::assumed);
    }

    // `\d` also matches non-ASCII digits, which never form a usable date.
    if !matched.is_ascii() {
        return None;
    }

    if matched.len() == 4 {
        let (month, day) = matched.split_at(2);
        let month = month.parse::<u32>().ok()?;
        let day = day.parse::<u32>().ok()?;
        return NaiveDate::from_ymd_opt(assumed_year, month, day).map(ParsedDate::assumed);
    }

    let digits: String = matched.chars().filter(char::is_ascii_digit).collect();
    if digits.len() != 8 {
        return None;
    }

    let year = digits[..4].parse::<i32>().ok()?;
    let month = digits[4..6].parse::<u32>().ok()?;
    let day = digits[6..].parse::<u32>().ok()?;
    NaiveDate::from_ymd_opt(year, month, day).map(ParsedDate::explicit)
}
