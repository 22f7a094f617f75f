use crate::error::{Result, SimulationError};
use chrono::{Datelike, NaiveDate};

/// Parses a month string in the format "YYYY-MM".
/// Returns the first day of that month.
pub fn parse_month(month: &str) -> Result<NaiveDate> {
    let trimmed = month.trim();
    let date_str = format!("{}-01", trimmed);
    NaiveDate::parse_from_str(&date_str, "%Y-%m-%d")
        .map_err(|_| SimulationError::InvalidMonth(month.to_string()))
}

pub fn first_of_next_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };

    // Day 1 exists in every month.
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(date)
}

pub fn months_between(start: NaiveDate, end: NaiveDate) -> i32 {
    let year_diff = end.year() - start.year();
    let month_diff = end.month() as i32 - start.month() as i32;
    year_diff * 12 + month_diff
}

/// Calendar quarter (1-4) of a month-of-year (1-12).
pub fn quarter_of_month(month: u32) -> u32 {
    (month - 1) / 3 + 1
}

pub fn month_label(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

/// Quarter period label in the "2018Q1" form.
pub fn quarter_label(year: i32, quarter: u32) -> String {
    format!("{:04}Q{}", year, quarter)
}

pub fn year_label(year: i32) -> String {
    format!("{:04}", year)
}
