//! JSON report adapter implementing ReportPort.
//!
//! Results are written as a pretty-printed array of flat records; statistics
//! that could not be computed appear as `null`.

use std::fs;
use std::path::Path;

use crate::domain::error::FundbenchError;
use crate::domain::evaluator::EvaluationResult;
use crate::domain::value_series::ValueSeries;
use crate::ports::report_port::ReportPort;

pub struct JsonReportAdapter;

impl JsonReportAdapter {
    pub fn new() -> Self {
        Self
    }

    pub fn results_to_string(results: &[EvaluationResult]) -> Result<String, FundbenchError> {
        serde_json::to_string_pretty(results).map_err(json_error)
    }

    pub fn series_to_string(series: &ValueSeries) -> Result<String, FundbenchError> {
        serde_json::to_string_pretty(series.points()).map_err(json_error)
    }
}

impl Default for JsonReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

fn json_error(e: serde_json::Error) -> FundbenchError {
    FundbenchError::Io(std::io::Error::other(e.to_string()))
}

fn write_file(output_path: &Path, contents: String) -> Result<(), FundbenchError> {
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(output_path, contents)?;
    Ok(())
}

impl ReportPort for JsonReportAdapter {
    fn write_results(
        &self,
        results: &[EvaluationResult],
        output_path: &Path,
    ) -> Result<(), FundbenchError> {
        write_file(output_path, Self::results_to_string(results)?)
    }

    fn write_series(&self, series: &ValueSeries, output_path: &Path) -> Result<(), FundbenchError> {
        write_file(output_path, Self::series_to_string(series)?)
    }
}
