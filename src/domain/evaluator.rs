//! Per-period performance evaluation of a value series.
//!
//! Each generated period is evaluated independently against the shared,
//! immutable series. A period that cannot be summarised is dropped from the
//! results and reported as a diagnostic; it never fails the evaluation.

use crate::domain::metrics::{SkipReason, SliceStats, DEFAULT_RISK_FREE_RATE};
use crate::domain::periods::{periods_for, EvaluationPeriod};
use crate::domain::value_series::ValueSeries;
use rayon::prelude::*;
use serde::Serialize;
use std::fmt;

/// Summary statistics for one period. Statistics that are not finite (or
/// undefined, like volatility over two observations) are `None` and
/// serialise as `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationResult {
    #[serde(flatten)]
    pub period: EvaluationPeriod,
    pub observation_count: usize,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub annualized_return: Option<f64>,
    pub annualized_volatility: Option<f64>,
    pub sharpe_ratio: Option<f64>,
    pub max_drawdown: Option<f64>,
}

impl EvaluationResult {
    fn from_stats(period: EvaluationPeriod, stats: SliceStats) -> Self {
        Self {
            period,
            observation_count: stats.observation_count,
            open: stats.open,
            high: stats.high,
            low: stats.low,
            close: stats.close,
            annualized_return: finite(stats.annualized_return),
            annualized_volatility: finite(stats.annualized_volatility),
            sharpe_ratio: stats.sharpe_ratio,
            max_drawdown: finite(stats.max_drawdown),
        }
    }
}

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// A period left out of the results, and why.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvaluationDiagnostic {
    pub period: EvaluationPeriod,
    pub reason: SkipReason,
}

impl fmt::Display for EvaluationDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} skipped: {}", self.period.label, self.reason)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Evaluation {
    pub results: Vec<EvaluationResult>,
    pub diagnostics: Vec<EvaluationDiagnostic>,
}

impl Evaluation {
    fn skip(&mut self, period: EvaluationPeriod, reason: SkipReason) {
        tracing::warn!(
            period = %period.label,
            start = %period.start_date,
            end = %period.end_date,
            "period skipped: {reason}"
        );
        self.diagnostics.push(EvaluationDiagnostic { period, reason });
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerformanceEvaluator {
    pub risk_free_rate: f64,
}

impl Default for PerformanceEvaluator {
    fn default() -> Self {
        Self {
            risk_free_rate: DEFAULT_RISK_FREE_RATE,
        }
    }
}

impl PerformanceEvaluator {
    pub fn new(risk_free_rate: f64) -> Self {
        Self { risk_free_rate }
    }

    /// One result per generated period, in the generator's ascending
    /// start-date order, minus any period that had to be skipped.
    pub fn evaluate(&self, series: &ValueSeries) -> Evaluation {
        let (Some(start), Some(end)) = (series.first_date(), series.last_date()) else {
            return Evaluation::default();
        };
        let periods = match periods_for(start, end) {
            Ok(periods) => periods,
            Err(e) => {
                tracing::warn!(error = %e, "could not generate evaluation periods");
                return Evaluation::default();
            }
        };

        let outcomes: Vec<(EvaluationPeriod, Result<SliceStats, SkipReason>)> = periods
            .par_iter()
            .map(|&period| {
                let slice = series.slice(period.start_date, period.end_date);
                (period, SliceStats::compute(slice, self.risk_free_rate))
            })
            .collect();

        let mut evaluation = Evaluation::default();
        for (period, outcome) in outcomes {
            match outcome {
                Ok(stats) => evaluation
                    .results
                    .push(EvaluationResult::from_stats(period, stats)),
                Err(reason) => evaluation.skip(period, reason),
            }
        }
        evaluation
    }
}
