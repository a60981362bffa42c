//! Daily price panel: date -> (security -> price or missing).

use crate::domain::error::FundbenchError;
use crate::domain::value_series::{SeriesPoint, ValueSeries};
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// One observation from a price provider. `price` is `None` when the
/// provider has a row for the date but no value.
#[derive(Debug, Clone, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub security: String,
    pub price: Option<f64>,
}

impl PricePoint {
    pub fn new(date: NaiveDate, security: impl Into<String>, price: Option<f64>) -> Self {
        Self {
            date,
            security: security.into(),
            price,
        }
    }
}

/// Immutable, time-ordered panel. Every date holds at least one price.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PricePanel {
    rows: BTreeMap<NaiveDate, BTreeMap<String, Option<f64>>>,
}

impl PricePanel {
    pub fn from_points(points: Vec<PricePoint>) -> Result<Self, FundbenchError> {
        let mut rows: BTreeMap<NaiveDate, BTreeMap<String, Option<f64>>> = BTreeMap::new();

        for point in points {
            if let Some(price) = point.price {
                if !price.is_finite() || price <= 0.0 {
                    return Err(FundbenchError::integrity(format!(
                        "price for {} on {} must be positive, got {}",
                        point.security, point.date, price
                    )));
                }
            }
            let row = rows.entry(point.date).or_default();
            if row.insert(point.security.clone(), point.price).is_some() {
                return Err(FundbenchError::integrity(format!(
                    "duplicate observation for {} on {}",
                    point.security, point.date
                )));
            }
        }

        rows.retain(|_, row| row.values().any(Option::is_some));
        Ok(Self { rows })
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of dates in the panel.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.rows.keys().copied()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.rows.keys().next().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.rows.keys().next_back().copied()
    }

    /// Price of `security` on `date`; `None` covers both a missing marker and
    /// a security the panel knows nothing about.
    pub fn price(&self, date: NaiveDate, security: &str) -> Option<f64> {
        self.rows.get(&date).and_then(|row| row.get(security).copied().flatten())
    }

    pub fn row(&self, date: NaiveDate) -> Option<&BTreeMap<String, Option<f64>>> {
        self.rows.get(&date)
    }

    pub fn securities(&self) -> BTreeSet<&str> {
        self.rows
            .values()
            .flat_map(|row| row.keys().map(String::as_str))
            .collect()
    }

    /// Raw value series for one security, skipping missing observations.
    pub fn column(&self, security: &str) -> ValueSeries {
        let points = self
            .rows
            .iter()
            .filter_map(|(&date, row)| {
                row.get(security)
                    .copied()
                    .flatten()
                    .map(|value| SeriesPoint { date, value })
            })
            .collect();
        ValueSeries::from_ordered(points)
    }

    /// Keep only the given securities, dropping dates left without a price.
    pub fn restrict_to(&self, securities: &[String]) -> Self {
        let wanted: HashSet<&str> = securities.iter().map(String::as_str).collect();
        let mut rows = self.rows.clone();
        for row in rows.values_mut() {
            row.retain(|security, _| wanted.contains(security.as_str()));
        }
        rows.retain(|_, row| row.values().any(Option::is_some));
        Self { rows }
    }
}
