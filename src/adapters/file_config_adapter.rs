//! INI file configuration adapter.

use crate::domain::error::FundbenchError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

#[derive(Debug)]
pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, FundbenchError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config
            .load(path)
            .map_err(|reason| FundbenchError::ConfigParse {
                file: path.display().to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, String> {
        let mut config = Ini::new();
        config.read(content.to_string())?;
        Ok(Self { config })
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.config
            .getfloat(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn from_string_parses_config() {
        let content = r#"
[data]
source = csv
csv_dir = /srv/fundbench/data

[evaluation]
risk_free_rate = 0.025
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert_eq!(adapter.get_string("data", "source"), Some("csv".to_string()));
        assert_eq!(
            adapter.get_string("data", "csv_dir"),
            Some("/srv/fundbench/data".to_string())
        );
    }

    #[test]
    fn get_string_returns_none_for_missing_key() {
        let adapter = FileConfigAdapter::from_string("[data]\nsource = csv\n").unwrap();
        assert_eq!(adapter.get_string("data", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn get_int_returns_value_or_default() {
        let adapter =
            FileConfigAdapter::from_string("[sqlite]\npool_size = 8\nbad = abc\n").unwrap();
        assert_eq!(adapter.get_int("sqlite", "pool_size", 4), 8);
        assert_eq!(adapter.get_int("sqlite", "missing", 4), 4);
        assert_eq!(adapter.get_int("sqlite", "bad", 4), 4);
    }

    #[test]
    fn get_double_returns_value_or_default() {
        let adapter = FileConfigAdapter::from_string(
            "[evaluation]\nrisk_free_rate = 0.031\nbad = not_a_number\n",
        )
        .unwrap();
        assert_eq!(adapter.get_double("evaluation", "risk_free_rate", 0.0), 0.031);
        assert_eq!(adapter.get_double("evaluation", "missing", 0.025), 0.025);
        assert_eq!(adapter.get_double("evaluation", "bad", 0.025), 0.025);
    }

    #[test]
    fn get_date_parses_iso_dates() {
        let adapter = FileConfigAdapter::from_string(
            "[evaluation]\nstart_date = 2015-01-01\nend_date =\nbad = 01/02/2015\n",
        )
        .unwrap();
        assert_eq!(
            adapter.get_date("evaluation", "start_date").unwrap(),
            NaiveDate::from_ymd_opt(2015, 1, 1)
        );
        assert_eq!(adapter.get_date("evaluation", "end_date").unwrap(), None);
        assert_eq!(adapter.get_date("evaluation", "missing").unwrap(), None);
        assert!(matches!(
            adapter.get_date("evaluation", "bad"),
            Err(FundbenchError::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn from_file_reads_config() {
        let file = create_temp_config("[sqlite]\npath = /var/lib/fundbench.db\n");
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("sqlite", "path"),
            Some("/var/lib/fundbench.db".to_string())
        );
    }

    #[test]
    fn from_file_returns_error_for_missing_file() {
        let result = FileConfigAdapter::from_file("/nonexistent/path/config.ini");
        assert!(matches!(result, Err(FundbenchError::ConfigParse { .. })));
    }
}
