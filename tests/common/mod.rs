#![allow(dead_code)]

use chrono::NaiveDate;
use fundbench::domain::error::FundbenchError;
pub use fundbench::domain::price_panel::{PricePanel, PricePoint};
pub use fundbench::domain::security::{Security, SecurityQuery};
pub use fundbench::domain::value_series::{SeriesPoint, ValueSeries};
pub use fundbench::domain::weight_schedule::WeightSegment;
use fundbench::ports::price_port::PricePort;
use fundbench::ports::schedule_port::SchedulePort;
use fundbench::ports::security_port::SecurityPort;
use std::cell::RefCell;
use std::collections::HashMap;

/// In-memory data source serving all three data ports.
pub struct MockDataSource {
    pub prices: HashMap<String, Vec<(NaiveDate, Option<f64>)>>,
    pub schedules: HashMap<i64, Vec<WeightSegment>>,
    pub securities: Vec<Security>,
    pub price_error: Option<String>,
    pub price_requests: RefCell<Vec<Vec<String>>>,
}

impl MockDataSource {
    pub fn new() -> Self {
        Self {
            prices: HashMap::new(),
            schedules: HashMap::new(),
            securities: Vec::new(),
            price_error: None,
            price_requests: RefCell::new(Vec::new()),
        }
    }

    pub fn with_prices(mut self, security: &str, prices: Vec<(NaiveDate, Option<f64>)>) -> Self {
        self.prices.insert(security.to_string(), prices);
        self
    }

    pub fn with_series(self, security: &str, start: &str, values: &[f64]) -> Self {
        let start = parse(start);
        let prices = values
            .iter()
            .enumerate()
            .map(|(i, &v)| (start + chrono::Duration::days(i as i64), Some(v)))
            .collect();
        self.with_prices(security, prices)
    }

    pub fn with_schedule(mut self, id: i64, segments: Vec<WeightSegment>) -> Self {
        self.schedules.insert(id, segments);
        self
    }

    pub fn with_securities(mut self, securities: Vec<Security>) -> Self {
        self.securities = securities;
        self
    }

    pub fn with_price_error(mut self, reason: &str) -> Self {
        self.price_error = Some(reason.to_string());
        self
    }
}

impl PricePort for MockDataSource {
    fn get_prices(
        &self,
        securities: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PricePanel, FundbenchError> {
        self.price_requests.borrow_mut().push(securities.to_vec());
        if let Some(reason) = &self.price_error {
            return Err(FundbenchError::Database {
                reason: reason.clone(),
            });
        }
        let points = securities
            .iter()
            .filter_map(|s| self.prices.get(s).map(|rows| (s, rows)))
            .flat_map(|(s, rows)| {
                rows.iter()
                    .filter(|(d, _)| *d >= start && *d <= end)
                    .map(move |&(d, p)| PricePoint::new(d, s.as_str(), p))
            })
            .collect();
        PricePanel::from_points(points)
    }
}

impl SchedulePort for MockDataSource {
    fn load_weight_segments(&self, id: i64) -> Result<Vec<WeightSegment>, FundbenchError> {
        Ok(self.schedules.get(&id).cloned().unwrap_or_default())
    }
}

impl SecurityPort for MockDataSource {
    fn list_securities(&self, query: &SecurityQuery) -> Result<Vec<Security>, FundbenchError> {
        Ok(query.apply(self.securities.clone()))
    }
}

pub fn parse(date: &str) -> NaiveDate {
    NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn segment(group_id: i64, security: &str, weight: f64, start: &str, end: &str) -> WeightSegment {
    WeightSegment {
        group_id,
        security: security.to_string(),
        weight,
        effective_start: parse(start),
        effective_end: parse(end),
    }
}

pub fn security(code: &str, security_type: &str, name: &str) -> Security {
    Security {
        code: code.to_string(),
        symbol: code.split('.').next().unwrap_or(code).to_string(),
        exchange: code.rsplit('.').next().unwrap_or("").to_string(),
        security_type: security_type.to_string(),
        name: name.to_string(),
        full_name: format!("{name} Index"),
    }
}

/// Daily series with a deterministic wiggle around a gentle trend.
pub fn generate_values(count: usize, start_value: f64) -> Vec<f64> {
    (0..count)
        .map(|i| start_value * (1.0 + 0.0003 * i as f64) + (i as f64 * 0.7).sin())
        .collect()
}

pub fn daily_series(start: &str, values: &[f64]) -> ValueSeries {
    let start = parse(start);
    ValueSeries::new(
        values
            .iter()
            .enumerate()
            .map(|(i, &value)| SeriesPoint {
                date: start + chrono::Duration::days(i as i64),
                value,
            })
            .collect(),
    )
    .unwrap()
}
