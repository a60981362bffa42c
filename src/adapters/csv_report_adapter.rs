//! CSV report adapter implementing ReportPort.
//!
//! One row per evaluated period; empty cells mark statistics that could not
//! be computed.

use std::fs;
use std::io::Write;
use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::error::FundbenchError;
use crate::domain::evaluator::EvaluationResult;
use crate::domain::value_series::ValueSeries;
use crate::ports::report_port::ReportPort;

pub struct CsvReportAdapter;

#[derive(Serialize)]
struct ResultRow<'a> {
    label: &'a str,
    start_date: NaiveDate,
    end_date: NaiveDate,
    observation_count: usize,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    annualized_return: Option<f64>,
    annualized_volatility: Option<f64>,
    sharpe_ratio: Option<f64>,
    max_drawdown: Option<f64>,
}

impl<'a> From<&'a EvaluationResult> for ResultRow<'a> {
    fn from(r: &'a EvaluationResult) -> Self {
        Self {
            label: r.period.label.as_str(),
            start_date: r.period.start_date,
            end_date: r.period.end_date,
            observation_count: r.observation_count,
            open: r.open,
            high: r.high,
            low: r.low,
            close: r.close,
            annualized_return: r.annualized_return,
            annualized_volatility: r.annualized_volatility,
            sharpe_ratio: r.sharpe_ratio,
            max_drawdown: r.max_drawdown,
        }
    }
}

const RESULT_HEADER: [&str; 12] = [
    "label",
    "start_date",
    "end_date",
    "observation_count",
    "open",
    "high",
    "low",
    "close",
    "annualized_return",
    "annualized_volatility",
    "sharpe_ratio",
    "max_drawdown",
];

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self
    }

    pub fn write_results_to<W: Write>(
        results: &[EvaluationResult],
        writer: W,
    ) -> Result<(), FundbenchError> {
        let mut wtr = csv::Writer::from_writer(writer);
        if results.is_empty() {
            wtr.write_record(RESULT_HEADER).map_err(csv_error)?;
        }
        for result in results {
            wtr.serialize(ResultRow::from(result)).map_err(csv_error)?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn write_series_to<W: Write>(series: &ValueSeries, writer: W) -> Result<(), FundbenchError> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(["date", "value"]).map_err(csv_error)?;
        for point in series.points() {
            wtr.write_record([point.date.format("%Y-%m-%d").to_string(), point.value.to_string()])
                .map_err(csv_error)?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn create(output_path: &Path) -> Result<fs::File, FundbenchError> {
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(fs::File::create(output_path)?)
    }
}

impl Default for CsvReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

fn csv_error(e: csv::Error) -> FundbenchError {
    FundbenchError::Io(std::io::Error::other(e.to_string()))
}

impl ReportPort for CsvReportAdapter {
    fn write_results(
        &self,
        results: &[EvaluationResult],
        output_path: &Path,
    ) -> Result<(), FundbenchError> {
        Self::write_results_to(results, Self::create(output_path)?)
    }

    fn write_series(&self, series: &ValueSeries, output_path: &Path) -> Result<(), FundbenchError> {
        Self::write_series_to(series, Self::create(output_path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::evaluator::PerformanceEvaluator;
    use crate::domain::value_series::SeriesPoint;
    use tempfile::tempdir;

    fn flat_series() -> ValueSeries {
        let start = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        ValueSeries::new(
            (0..3)
                .map(|i| SeriesPoint {
                    date: start + chrono::Duration::days(i),
                    value: 100.0,
                })
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn writes_one_row_per_result() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.csv");
        let start = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        let series = ValueSeries::new(vec![
            SeriesPoint { date: start, value: 100.0 },
            SeriesPoint { date: start + chrono::Duration::days(1), value: 104.0 },
        ])
        .unwrap();
        let evaluation = PerformanceEvaluator::default().evaluate(&series);

        CsvReportAdapter::new()
            .write_results(&evaluation.results, &path)
            .unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert!(lines[0].starts_with("label,start_date,end_date,observation_count"));
        assert_eq!(lines.len(), 1 + evaluation.results.len());
        // Two observations: volatility and Sharpe cells are empty.
        assert!(lines[1].starts_with("ITD,2024-03-05,2024-03-06,2,100.0,104.0"));
        assert!(lines[1].contains(",,"));
    }

    #[test]
    fn empty_results_still_have_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        CsvReportAdapter::new().write_results(&[], &path).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap().lines().count(),
            1
        );
    }

    #[test]
    fn writes_to_any_stream() {
        let mut buf = Vec::new();
        CsvReportAdapter::write_series_to(&flat_series(), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("date,value\n2024-03-05,100\n"));
    }

    #[test]
    fn writes_series_as_date_value() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out/series.csv");
        CsvReportAdapter::new()
            .write_series(&flat_series(), &path)
            .unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents,
            "date,value\n2024-03-05,100\n2024-03-06,100\n2024-03-07,100\n"
        );
    }
}
