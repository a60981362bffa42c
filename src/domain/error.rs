//! Domain error types.

use chrono::NaiveDate;

/// Top-level error type for fundbench.
#[derive(Debug, thiserror::Error)]
pub enum FundbenchError {
    #[error("data integrity error: {reason}")]
    DataIntegrity { reason: String },

    #[error("data unavailable: {reason}")]
    DataUnavailable { reason: String },

    #[error("start date {start} is after end date {end}")]
    Ordering { start: NaiveDate, end: NaiveDate },

    #[error("invalid query: {reason}")]
    InvalidQuery { reason: String },

    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl FundbenchError {
    pub fn integrity(reason: impl Into<String>) -> Self {
        Self::DataIntegrity {
            reason: reason.into(),
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::DataUnavailable {
            reason: reason.into(),
        }
    }

    /// Fails with `Ordering` unless `start <= end`.
    pub fn check_order(start: NaiveDate, end: NaiveDate) -> Result<(), Self> {
        if start > end {
            Err(Self::Ordering { start, end })
        } else {
            Ok(())
        }
    }

    /// Process exit status for this error class.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Io(_) => 1,
            Self::ConfigParse { .. } | Self::ConfigMissing { .. } | Self::ConfigInvalid { .. } => 2,
            Self::Database { .. } | Self::DatabaseQuery { .. } => 3,
            Self::DataIntegrity { .. } | Self::Ordering { .. } | Self::InvalidQuery { .. } => 4,
            Self::DataUnavailable { .. } => 5,
        }
    }
}

impl From<&FundbenchError> for std::process::ExitCode {
    fn from(err: &FundbenchError) -> Self {
        std::process::ExitCode::from(err.exit_code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_order_accepts_equal_dates() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert!(FundbenchError::check_order(d, d).is_ok());
    }

    #[test]
    fn check_order_rejects_reversed_dates() {
        let start = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        match FundbenchError::check_order(start, end) {
            Err(FundbenchError::Ordering { start: s, end: e }) => {
                assert_eq!(s, start);
                assert_eq!(e, end);
            }
            other => panic!("expected Ordering, got {other:?}"),
        }
    }

    #[test]
    fn exit_codes_by_class() {
        assert_eq!(FundbenchError::Io(std::io::Error::other("x")).exit_code(), 1);
        assert_eq!(
            FundbenchError::ConfigMissing {
                section: "data".into(),
                key: "csv_dir".into()
            }
            .exit_code(),
            2
        );
        assert_eq!(FundbenchError::integrity("x").exit_code(), 4);
        assert_eq!(FundbenchError::unavailable("x").exit_code(), 5);
    }

    #[test]
    fn display_includes_reason() {
        let err = FundbenchError::integrity("segment 3 ends before it starts");
        assert_eq!(
            err.to_string(),
            "data integrity error: segment 3 ends before it starts"
        );
    }
}
