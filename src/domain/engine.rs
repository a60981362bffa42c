//! Caller-facing entry points: load inputs through the ports, then run the
//! pure builder and evaluator over fully materialised data.

use crate::domain::blend::{self, BlendOutcome};
use crate::domain::error::FundbenchError;
use crate::domain::evaluator::{Evaluation, PerformanceEvaluator};
use crate::domain::value_series::{BlendedSeries, ValueSeries};
use crate::domain::weight_schedule::WeightSchedule;
use crate::ports::price_port::PricePort;
use crate::ports::schedule_port::SchedulePort;
use chrono::NaiveDate;

pub struct BenchmarkEngine<'a> {
    prices: &'a dyn PricePort,
    schedules: &'a dyn SchedulePort,
}

impl<'a> BenchmarkEngine<'a> {
    pub fn new(prices: &'a dyn PricePort, schedules: &'a dyn SchedulePort) -> Self {
        Self { prices, schedules }
    }

    /// Blended value series for benchmark or fund `id` over `start..=end`.
    ///
    /// Fails with `DataIntegrity` on a malformed schedule and with
    /// `DataUnavailable` when the provider errors or no date can be valued.
    pub fn build_benchmark_series(
        &self,
        id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<BlendedSeries, FundbenchError> {
        self.build_with_diagnostics(id, start, end)
            .map(|outcome| outcome.series)
    }

    pub fn build_with_diagnostics(
        &self,
        id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<BlendOutcome, FundbenchError> {
        FundbenchError::check_order(start, end)?;

        let schedule = WeightSchedule::load(self.schedules, id)?;
        let universe = schedule.constituent_universe();
        tracing::debug!(schedule = id, securities = universe.len(), "schedule loaded");

        let panel = self
            .prices
            .get_prices(&universe, start, end)
            .map_err(|e| {
                FundbenchError::unavailable(format!("price provider failed for schedule {id}: {e}"))
            })?
            .restrict_to(&universe);

        if panel.is_empty() {
            return Err(FundbenchError::unavailable(format!(
                "no prices for schedule {id} between {start} and {end}"
            )));
        }

        let outcome = blend::build_with_diagnostics(&schedule, &panel);
        if outcome.series.is_empty() {
            return Err(FundbenchError::unavailable(format!(
                "schedule {id} has no fully priced dates between {start} and {end}"
            )));
        }
        if outcome.excluded_count() > 0 {
            tracing::info!(
                schedule = id,
                excluded = outcome.excluded_count(),
                kept = outcome.series.len(),
                "dates excluded from blended series"
            );
        }
        Ok(outcome)
    }

    /// Raw price series for a single security.
    pub fn security_series(
        &self,
        security: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<ValueSeries, FundbenchError> {
        FundbenchError::check_order(start, end)?;

        let wanted = [security.to_string()];
        let series = self
            .prices
            .get_prices(&wanted, start, end)
            .map_err(|e| FundbenchError::unavailable(format!("price provider failed for {security}: {e}")))?
            .column(security);

        if series.is_empty() {
            return Err(FundbenchError::unavailable(format!(
                "no prices for {security} between {start} and {end}"
            )));
        }
        Ok(series)
    }
}

/// Evaluate `series` over the full period menu. Never fails; degenerate
/// periods come back as diagnostics.
pub fn evaluate_series(series: &ValueSeries, risk_free_rate: f64) -> Evaluation {
    PerformanceEvaluator::new(risk_free_rate).evaluate(series)
}
