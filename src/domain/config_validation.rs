//! Configuration validation.
//!
//! Checks every key before any data source is opened.

use crate::domain::error::FundbenchError;
use crate::domain::metrics::DEFAULT_RISK_FREE_RATE;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSourceKind {
    Csv,
    Sqlite,
}

/// Request defaults taken from the `[evaluation]` section.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvaluationSettings {
    pub risk_free_rate: f64,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), FundbenchError> {
    match data_source_kind(config)? {
        DataSourceKind::Csv => require(config, "data", "csv_dir")?,
        DataSourceKind::Sqlite => {
            require(config, "sqlite", "path")?;
            validate_pool_size(config)?;
        }
    };
    evaluation_settings(config)?;
    Ok(())
}

pub fn data_source_kind(config: &dyn ConfigPort) -> Result<DataSourceKind, FundbenchError> {
    let source = config
        .get_string("data", "source")
        .unwrap_or_else(|| "csv".to_string());
    match source.trim().to_lowercase().as_str() {
        "csv" => Ok(DataSourceKind::Csv),
        "sqlite" => Ok(DataSourceKind::Sqlite),
        other => Err(FundbenchError::ConfigInvalid {
            section: "data".to_string(),
            key: "source".to_string(),
            reason: format!("unknown source '{other}' (expected csv or sqlite)"),
        }),
    }
}

pub fn evaluation_settings(config: &dyn ConfigPort) -> Result<EvaluationSettings, FundbenchError> {
    let risk_free_rate = risk_free_rate(config)?;
    let start_date = config.get_date("evaluation", "start_date")?;
    let end_date = config.get_date("evaluation", "end_date")?;

    if let (Some(start), Some(end)) = (start_date, end_date) {
        if start > end {
            return Err(FundbenchError::ConfigInvalid {
                section: "evaluation".to_string(),
                key: "start_date".to_string(),
                reason: "start_date must not be after end_date".to_string(),
            });
        }
    }

    Ok(EvaluationSettings {
        risk_free_rate,
        start_date,
        end_date,
    })
}

fn risk_free_rate(config: &dyn ConfigPort) -> Result<f64, FundbenchError> {
    let Some(raw) = config.get_string("evaluation", "risk_free_rate") else {
        return Ok(DEFAULT_RISK_FREE_RATE);
    };
    let invalid = |reason: &str| FundbenchError::ConfigInvalid {
        section: "evaluation".to_string(),
        key: "risk_free_rate".to_string(),
        reason: reason.to_string(),
    };
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| invalid("risk_free_rate must be a number"))?;
    check_risk_free_rate(value, "risk_free_rate")
}

/// Accepts finite rates strictly between -1 and 1. `origin` names the
/// setting in the error message.
pub fn check_risk_free_rate(value: f64, origin: &str) -> Result<f64, FundbenchError> {
    if !value.is_finite() || value <= -1.0 || value >= 1.0 {
        return Err(FundbenchError::ConfigInvalid {
            section: "evaluation".to_string(),
            key: "risk_free_rate".to_string(),
            reason: format!("{origin} must be between -1 and 1, got {value}"),
        });
    }
    Ok(value)
}

fn validate_pool_size(config: &dyn ConfigPort) -> Result<(), FundbenchError> {
    let value = config.get_int("sqlite", "pool_size", 4);
    if value < 1 {
        return Err(FundbenchError::ConfigInvalid {
            section: "sqlite".to_string(),
            key: "pool_size".to_string(),
            reason: "pool_size must be at least 1".to_string(),
        });
    }
    Ok(())
}

fn require(config: &dyn ConfigPort, section: &str, key: &str) -> Result<(), FundbenchError> {
    match config.get_string(section, key) {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(FundbenchError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }),
    }
}
