//! Dated value series: raw security prices or a blended benchmark.

use crate::domain::error::FundbenchError;
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Ordered `(date, value)` pairs with strictly increasing dates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueSeries {
    points: Vec<SeriesPoint>,
}

/// A series produced by blending constituent prices with schedule weights.
pub type BlendedSeries = ValueSeries;

impl ValueSeries {
    pub fn new(points: Vec<SeriesPoint>) -> Result<Self, FundbenchError> {
        if let Some(w) = points.windows(2).find(|w| w[0].date >= w[1].date) {
            return Err(FundbenchError::integrity(format!(
                "series dates must be strictly increasing: {} then {}",
                w[0].date, w[1].date
            )));
        }
        if let Some(p) = points.iter().find(|p| !p.value.is_finite()) {
            return Err(FundbenchError::integrity(format!(
                "series value on {} is not finite",
                p.date
            )));
        }
        Ok(Self { points })
    }

    /// Build from pairs that are already known to be ordered and finite.
    pub(crate) fn from_ordered(points: Vec<SeriesPoint>) -> Self {
        debug_assert!(points.windows(2).all(|w| w[0].date < w[1].date));
        Self { points }
    }

    pub fn points(&self) -> &[SeriesPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }

    pub fn get(&self, date: NaiveDate) -> Option<f64> {
        self.points
            .binary_search_by_key(&date, |p| p.date)
            .ok()
            .map(|i| self.points[i].value)
    }

    /// Observations with `start <= date <= end`.
    pub fn slice(&self, start: NaiveDate, end: NaiveDate) -> &[SeriesPoint] {
        let lo = self.points.partition_point(|p| p.date < start);
        let hi = self.points.partition_point(|p| p.date <= end);
        if lo >= hi { &[] } else { &self.points[lo..hi] }
    }

    pub fn into_points(self) -> Vec<SeriesPoint> {
        self.points
    }
}
