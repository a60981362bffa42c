//! Calendar arithmetic: leap years, year fractions, month shifts.

use crate::domain::error::FundbenchError;
use chrono::{Datelike, NaiveDate};

/// Gregorian leap year rule.
pub fn is_leap_year(year: i32) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

pub fn days_in_year(year: i32) -> u32 {
    if is_leap_year(year) { 366 } else { 365 }
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        _ if is_leap_year(year) => 29,
        _ => 28,
    }
}

/// Elapsed calendar years between two dates.
///
/// The remaining fraction of the start year, plus the elapsed fraction of the
/// end year, plus every whole year in between. Day-of-year is 0-based, so
/// `2020-01-01 .. 2021-01-01` is exactly 1.0 and a same-day span is 0.0.
///
/// The common textbook form uses 1-based day-of-year. Across years of
/// different length that shifts the result by `1/days(end) - 1/days(start)`,
/// so a whole-year span starting in a leap year would not come out as 1.0.
pub fn years_between(start: NaiveDate, end: NaiveDate) -> Result<f64, FundbenchError> {
    FundbenchError::check_order(start, end)?;

    let start_year = start.year();
    let end_year = end.year();

    let mut years = 1.0 - start.ordinal0() as f64 / days_in_year(start_year) as f64;
    years += end.ordinal0() as f64 / days_in_year(end_year) as f64;
    years += (end_year - start_year - 1) as f64;
    Ok(years)
}

/// Shift `date` by `months` (negative shifts back), keeping the day of month.
///
/// When the day does not exist in the target month it is clamped to that
/// month's last day, so Mar 31 shifted back one month is Feb 28 (or 29).
pub fn shift_months(date: NaiveDate, months: i32) -> NaiveDate {
    let index = date.year() * 12 + date.month0() as i32 + months;
    let year = index.div_euclid(12);
    let month = index.rem_euclid(12) as u32 + 1;
    let day = date.day().min(days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(date)
}

pub fn first_of_year(date: NaiveDate) -> NaiveDate {
    date.with_ordinal(1).unwrap_or(date)
}

/// First day of the calendar quarter containing `date`.
pub fn first_of_quarter(date: NaiveDate) -> NaiveDate {
    let month = (date.month() - 1) / 3 * 3 + 1;
    NaiveDate::from_ymd_opt(date.year(), month, 1).unwrap_or(date)
}

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}
