//! Report generation port.

use crate::domain::error::FundbenchError;
use crate::domain::evaluator::EvaluationResult;
use crate::domain::value_series::ValueSeries;
use std::path::Path;

/// Port for writing evaluation results and value series.
pub trait ReportPort {
    fn write_results(
        &self,
        results: &[EvaluationResult],
        output_path: &Path,
    ) -> Result<(), FundbenchError>;

    fn write_series(&self, series: &ValueSeries, output_path: &Path)
    -> Result<(), FundbenchError>;
}
