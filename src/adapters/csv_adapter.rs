//! CSV directory data adapter.
//!
//! Layout under the base directory:
//!
//! - `prices/<SECURITY>.csv` with header `date,adj_close` (empty cell = missing)
//! - `weights.csv` with header
//!   `schedule_id,group_id,security,weight,effective_start,effective_end`
//! - `securities.csv` with header `code,symbol,exchange,type,name,full_name`

use crate::domain::error::FundbenchError;
use crate::domain::price_panel::{PricePanel, PricePoint};
use crate::domain::security::{Security, SecurityQuery};
use crate::domain::weight_schedule::WeightSegment;
use crate::ports::price_port::PricePort;
use crate::ports::schedule_port::SchedulePort;
use crate::ports::security_port::SecurityPort;
use chrono::NaiveDate;
use serde::Deserialize;
use std::fs::File;
use std::path::{Path, PathBuf};

pub struct CsvAdapter {
    base_path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct PriceRow {
    date: NaiveDate,
    adj_close: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct SegmentRow {
    schedule_id: i64,
    group_id: i64,
    security: String,
    weight: f64,
    effective_start: NaiveDate,
    effective_end: NaiveDate,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// `prices/<security>.csv`; codes that could leave `prices/` are rejected.
    fn price_path(&self, security: &str) -> Result<PathBuf, FundbenchError> {
        if security.is_empty()
            || security.contains(['/', '\\'])
            || security.contains("..")
            || Path::new(security).is_absolute()
        {
            return Err(FundbenchError::integrity(format!(
                "security code '{security}' is not a valid price file name"
            )));
        }
        Ok(self.base_path.join("prices").join(format!("{security}.csv")))
    }

    fn open(path: &Path) -> Result<csv::Reader<File>, FundbenchError> {
        csv::Reader::from_path(path).map_err(|e| FundbenchError::Database {
            reason: format!("failed to read {}: {}", path.display(), e),
        })
    }

    fn parse_error(path: &Path, e: csv::Error) -> FundbenchError {
        FundbenchError::Database {
            reason: format!("CSV parse error in {}: {}", path.display(), e),
        }
    }
}

impl PricePort for CsvAdapter {
    fn get_prices(
        &self,
        securities: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PricePanel, FundbenchError> {
        let mut points = Vec::new();

        for security in securities {
            let path = self.price_path(security)?;
            if !path.exists() {
                tracing::debug!(%security, path = %path.display(), "no price file");
                continue;
            }

            let mut rdr = Self::open(&path)?;
            for row in rdr.deserialize::<PriceRow>() {
                let row = row.map_err(|e| Self::parse_error(&path, e))?;
                if row.date < start || row.date > end {
                    continue;
                }
                points.push(PricePoint::new(row.date, security.as_str(), row.adj_close));
            }
        }

        PricePanel::from_points(points)
    }
}

impl SchedulePort for CsvAdapter {
    fn load_weight_segments(&self, id: i64) -> Result<Vec<WeightSegment>, FundbenchError> {
        let path = self.base_path.join("weights.csv");
        let mut rdr = Self::open(&path)?;
        let mut segments = Vec::new();

        for row in rdr.deserialize::<SegmentRow>() {
            let row = row.map_err(|e| Self::parse_error(&path, e))?;
            if row.schedule_id != id {
                continue;
            }
            segments.push(WeightSegment {
                group_id: row.group_id,
                security: row.security,
                weight: row.weight,
                effective_start: row.effective_start,
                effective_end: row.effective_end,
            });
        }

        Ok(segments)
    }
}

impl SecurityPort for CsvAdapter {
    fn list_securities(&self, query: &SecurityQuery) -> Result<Vec<Security>, FundbenchError> {
        let path = self.base_path.join("securities.csv");
        let mut rdr = Self::open(&path)?;
        let securities = rdr
            .deserialize::<Security>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| Self::parse_error(&path, e))?;

        Ok(query.apply(securities))
    }
}
