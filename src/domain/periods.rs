//! Evaluation period menu anchored to a series' last date.

use crate::domain::calendar::{first_of_month, first_of_quarter, first_of_year, shift_months};
use crate::domain::error::FundbenchError;
use chrono::NaiveDate;
use serde::{Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeriodLabel {
    InceptionToDate,
    YearToDate,
    QuarterToDate,
    MonthToDate,
    OneMonth,
    ThreeMonths,
    SixMonths,
    OneYear,
    ThreeYears,
    FiveYears,
    TenYears,
}

impl PeriodLabel {
    /// Generation order, before sorting by start date.
    pub const ALL: [PeriodLabel; 11] = [
        PeriodLabel::InceptionToDate,
        PeriodLabel::YearToDate,
        PeriodLabel::QuarterToDate,
        PeriodLabel::MonthToDate,
        PeriodLabel::OneMonth,
        PeriodLabel::ThreeMonths,
        PeriodLabel::SixMonths,
        PeriodLabel::OneYear,
        PeriodLabel::ThreeYears,
        PeriodLabel::FiveYears,
        PeriodLabel::TenYears,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PeriodLabel::InceptionToDate => "ITD",
            PeriodLabel::YearToDate => "YTD",
            PeriodLabel::QuarterToDate => "QTD",
            PeriodLabel::MonthToDate => "MTD",
            PeriodLabel::OneMonth => "1M",
            PeriodLabel::ThreeMonths => "3M",
            PeriodLabel::SixMonths => "6M",
            PeriodLabel::OneYear => "1Y",
            PeriodLabel::ThreeYears => "3Y",
            PeriodLabel::FiveYears => "5Y",
            PeriodLabel::TenYears => "10Y",
        }
    }

    /// Length of a trailing window in months.
    pub fn trailing_months(self) -> Option<i32> {
        match self {
            PeriodLabel::OneMonth => Some(1),
            PeriodLabel::ThreeMonths => Some(3),
            PeriodLabel::SixMonths => Some(6),
            PeriodLabel::OneYear => Some(12),
            PeriodLabel::ThreeYears => Some(36),
            PeriodLabel::FiveYears => Some(60),
            PeriodLabel::TenYears => Some(120),
            _ => None,
        }
    }

    /// Period start for a series spanning `start..=end`.
    fn start_for(self, start: NaiveDate, end: NaiveDate) -> NaiveDate {
        match self {
            PeriodLabel::InceptionToDate => start,
            PeriodLabel::YearToDate => first_of_year(end),
            PeriodLabel::QuarterToDate => first_of_quarter(end),
            PeriodLabel::MonthToDate => first_of_month(end),
            trailing => shift_months(end, -trailing.trailing_months().unwrap_or(0)),
        }
    }
}

impl fmt::Display for PeriodLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for PeriodLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EvaluationPeriod {
    pub label: PeriodLabel,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Periods for a series spanning `start..=end`, ascending by start date.
///
/// A period is included only when its start falls on or after `start`;
/// windows reaching back before the data are dropped, never truncated.
pub fn periods_for(
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<EvaluationPeriod>, FundbenchError> {
    FundbenchError::check_order(start, end)?;

    let mut periods: Vec<EvaluationPeriod> = PeriodLabel::ALL
        .iter()
        .map(|&label| EvaluationPeriod {
            label,
            start_date: label.start_for(start, end),
            end_date: end,
        })
        .filter(|p| p.start_date >= start)
        .collect();

    periods.sort_by_key(|p| p.start_date);
    Ok(periods)
}
