//! Performance statistics over one slice of a value series.

use super::calendar::years_between;
use super::value_series::SeriesPoint;

pub const DEFAULT_RISK_FREE_RATE: f64 = 0.025;

/// Fewest observations that still yield a return. Volatility needs one
/// more because it divides by `n - 2`.
pub const MIN_OBSERVATIONS: usize = 2;

/// Why a slice could not be summarised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SkipReason {
    #[error("no observations in period")]
    Empty,

    #[error("{observations} observation(s), need at least 2")]
    TooFewObservations { observations: usize },

    #[error("period spans no elapsed time")]
    ZeroSpan,

    #[error("zero volatility (no price movement), sharpe ratio undefined")]
    ZeroVolatility,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SliceStats {
    pub observation_count: usize,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub annualized_return: f64,
    /// NaN with fewer than three observations.
    pub annualized_volatility: f64,
    /// `None` unless volatility is positive and finite.
    pub sharpe_ratio: Option<f64>,
    pub max_drawdown: f64,
}

impl SliceStats {
    pub fn compute(slice: &[SeriesPoint], risk_free_rate: f64) -> Result<Self, SkipReason> {
        let (first, last) = match (slice.first(), slice.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(SkipReason::Empty),
        };
        if slice.len() < MIN_OBSERVATIONS {
            return Err(SkipReason::TooFewObservations {
                observations: slice.len(),
            });
        }

        let years = years_between(first.date, last.date).unwrap_or(0.0);
        if years <= 0.0 {
            return Err(SkipReason::ZeroSpan);
        }

        let values: Vec<f64> = slice.iter().map(|p| p.value).collect();
        let high = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let low = values.iter().copied().fold(f64::INFINITY, f64::min);
        // Flat slice: volatility is zero and Sharpe undefined.
        if high == low {
            return Err(SkipReason::ZeroVolatility);
        }

        let annualized_return = annualized_return(&values, years);
        let annualized_volatility = annualized_volatility(&values, years);

        Ok(SliceStats {
            observation_count: values.len(),
            open: first.value,
            high,
            low,
            close: last.value,
            annualized_return,
            annualized_volatility,
            sharpe_ratio: sharpe_ratio(annualized_return, annualized_volatility, risk_free_rate),
            max_drawdown: max_drawdown(&values),
        })
    }
}

/// `(close / open) ^ (1 / years) - 1`.
pub fn annualized_return(values: &[f64], years: f64) -> f64 {
    match (values.first(), values.last()) {
        (Some(&open), Some(&close)) if years > 0.0 => (close / open).powf(1.0 / years) - 1.0,
        _ => f64::NAN,
    }
}

/// Annualised standard deviation of daily log returns.
///
/// The variance divisor is `n - 2` (with `n` observations, so `n - 1`
/// returns): one degree of freedom more than Bessel's correction. This is
/// nonstandard; changing it shifts every historical volatility figure.
/// Scaling uses the observed frequency `n / years`, not a fixed trading-day
/// count.
pub fn annualized_volatility(values: &[f64], years: f64) -> f64 {
    let n = values.len();
    if n < 3 || years <= 0.0 {
        return f64::NAN;
    }

    let returns: Vec<f64> = values.windows(2).map(|w| (w[1] / w[0]).ln()).collect();
    let mean = returns.iter().sum::<f64>() / (n - 1) as f64;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 2) as f64;

    variance.sqrt() * (n as f64 / years).sqrt()
}

/// `None` unless volatility is strictly positive and both inputs are finite.
pub fn sharpe_ratio(
    annualized_return: f64,
    annualized_volatility: f64,
    risk_free_rate: f64,
) -> Option<f64> {
    if annualized_volatility > 0.0 && annualized_volatility.is_finite() {
        let sharpe = (annualized_return - risk_free_rate) / annualized_volatility;
        sharpe.is_finite().then_some(sharpe)
    } else {
        None
    }
}

/// Worst decline from a running peak, as a non-negative fraction
/// (a 20% fall is `0.20`).
pub fn max_drawdown(values: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;

    for &value in values {
        if value > peak {
            peak = value;
        }
        let dd = 1.0 - value / peak;
        if dd > max_dd {
            max_dd = dd;
        }
    }

    max_dd
}
