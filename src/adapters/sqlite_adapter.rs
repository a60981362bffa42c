//! SQLite data adapter.

use crate::domain::error::FundbenchError;
use crate::domain::price_panel::{PricePanel, PricePoint};
use crate::domain::security::{Direction, FilterOp, Security, SecurityQuery};
use crate::domain::weight_schedule::WeightSegment;
use crate::ports::config_port::ConfigPort;
use crate::ports::price_port::PricePort;
use crate::ports::schedule_port::SchedulePort;
use crate::ports::security_port::SecurityPort;
use chrono::NaiveDate;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, params_from_iter};

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, FundbenchError> {
        let db_path =
            config
                .get_string("sqlite", "path")
                .ok_or_else(|| FundbenchError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;

        let pool_size = config.get_int("sqlite", "pool_size", 4).max(1) as u32;

        Self::build(SqliteConnectionManager::file(&db_path), pool_size)
    }

    pub fn in_memory() -> Result<Self, FundbenchError> {
        Self::build(SqliteConnectionManager::memory(), 1)
    }

    fn build(manager: SqliteConnectionManager, max_size: u32) -> Result<Self, FundbenchError> {
        // LIKE must match the in-memory query semantics.
        let manager =
            manager.with_init(|c| c.execute_batch("PRAGMA case_sensitive_like = ON;"));
        let pool = Pool::builder()
            .max_size(max_size)
            .build(manager)
            .map_err(|e: r2d2::Error| FundbenchError::Database {
                reason: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, FundbenchError> {
        self.pool
            .get()
            .map_err(|e: r2d2::Error| FundbenchError::Database {
                reason: e.to_string(),
            })
    }

    pub fn initialize_schema(&self) -> Result<(), FundbenchError> {
        let conn = self.conn()?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS prices (
                security TEXT NOT NULL,
                date TEXT NOT NULL,
                adj_close REAL,
                PRIMARY KEY (security, date)
            );
            CREATE INDEX IF NOT EXISTS idx_prices_date ON prices(date);
            CREATE TABLE IF NOT EXISTS schedule_segments (
                schedule_id INTEGER NOT NULL,
                group_id INTEGER NOT NULL,
                security TEXT NOT NULL,
                weight REAL NOT NULL,
                effective_start TEXT NOT NULL,
                effective_end TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_segments_schedule ON schedule_segments(schedule_id);
            CREATE TABLE IF NOT EXISTS securities (
                code TEXT PRIMARY KEY,
                symbol TEXT NOT NULL,
                exchange TEXT NOT NULL,
                type TEXT NOT NULL,
                name TEXT NOT NULL,
                full_name TEXT NOT NULL
            );",
        )
        .map_err(query_error)?;

        Ok(())
    }

    pub fn insert_prices(&self, points: &[PricePoint]) -> Result<(), FundbenchError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_error)?;

        for point in points {
            tx.execute(
                "INSERT OR REPLACE INTO prices (security, date, adj_close) VALUES (?1, ?2, ?3)",
                params![
                    point.security,
                    point.date.format(DATE_FORMAT).to_string(),
                    point.price
                ],
            )
            .map_err(query_error)?;
        }

        tx.commit().map_err(query_error)?;
        Ok(())
    }

    pub fn insert_segments(
        &self,
        schedule_id: i64,
        segments: &[WeightSegment],
    ) -> Result<(), FundbenchError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_error)?;

        for segment in segments {
            tx.execute(
                "INSERT INTO schedule_segments
                     (schedule_id, group_id, security, weight, effective_start, effective_end)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    schedule_id,
                    segment.group_id,
                    segment.security,
                    segment.weight,
                    segment.effective_start.format(DATE_FORMAT).to_string(),
                    segment.effective_end.format(DATE_FORMAT).to_string()
                ],
            )
            .map_err(query_error)?;
        }

        tx.commit().map_err(query_error)?;
        Ok(())
    }

    pub fn insert_securities(&self, securities: &[Security]) -> Result<(), FundbenchError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_error)?;

        for s in securities {
            tx.execute(
                "INSERT OR REPLACE INTO securities (code, symbol, exchange, type, name, full_name)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![s.code, s.symbol, s.exchange, s.security_type, s.name, s.full_name],
            )
            .map_err(query_error)?;
        }

        tx.commit().map_err(query_error)?;
        Ok(())
    }
}

fn query_error(e: rusqlite::Error) -> FundbenchError {
    FundbenchError::DatabaseQuery {
        reason: e.to_string(),
    }
}

fn parse_date(column: usize, value: String) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(&value, DATE_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Compile a listing query to SQL with positional parameters. Column names
/// come from the closed field set, never from input text.
fn security_sql(query: &SecurityQuery) -> (String, Vec<String>) {
    let mut sql =
        String::from("SELECT code, symbol, exchange, type, name, full_name FROM securities");
    let mut values = Vec::with_capacity(query.filters.len());

    let conditions: Vec<String> = query
        .filters
        .iter()
        .map(|filter| {
            values.push(filter.value.clone());
            let column = filter.field.column();
            match filter.op {
                FilterOp::Equals => format!("{column} = ?"),
                FilterOp::StartsWith => format!("instr({column}, ?) = 1"),
                FilterOp::Like => format!("{column} LIKE ?"),
            }
        })
        .collect();
    if !conditions.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }

    let order: Vec<String> = query
        .order_by
        .iter()
        .map(|key| {
            let direction = match key.direction {
                Direction::Asc => "ASC",
                Direction::Desc => "DESC",
            };
            format!("{} {direction}", key.field.column())
        })
        .collect();
    if order.is_empty() {
        sql.push_str(" ORDER BY rowid");
    } else {
        sql.push_str(" ORDER BY ");
        sql.push_str(&order.join(", "));
    }

    match (query.limit, query.offset) {
        (None, None) => {}
        (limit, offset) => sql.push_str(&format!(
            " LIMIT {} OFFSET {}",
            limit.map_or(-1, |l| l as i64),
            offset.unwrap_or(0)
        )),
    }

    (sql, values)
}

impl PricePort for SqliteAdapter {
    fn get_prices(
        &self,
        securities: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PricePanel, FundbenchError> {
        if securities.is_empty() {
            return Ok(PricePanel::default());
        }
        let conn = self.conn()?;

        let placeholders = vec!["?"; securities.len()].join(", ");
        let query = format!(
            "SELECT security, date, adj_close
             FROM prices
             WHERE date >= ? AND date <= ? AND security IN ({placeholders})
             ORDER BY date ASC, security ASC"
        );

        let mut bind = vec![
            start.format(DATE_FORMAT).to_string(),
            end.format(DATE_FORMAT).to_string(),
        ];
        bind.extend(securities.iter().cloned());

        let mut stmt = conn.prepare(&query).map_err(query_error)?;
        let rows = stmt
            .query_map(params_from_iter(bind.iter()), |row| {
                Ok(PricePoint {
                    security: row.get(0)?,
                    date: parse_date(1, row.get(1)?)?,
                    price: row.get(2)?,
                })
            })
            .map_err(query_error)?;

        let points = rows
            .collect::<Result<Vec<_>, _>>()
            .map_err(query_error)?;
        PricePanel::from_points(points)
    }
}

impl SchedulePort for SqliteAdapter {
    fn load_weight_segments(&self, id: i64) -> Result<Vec<WeightSegment>, FundbenchError> {
        let conn = self.conn()?;

        let mut stmt = conn
            .prepare(
                "SELECT group_id, security, weight, effective_start, effective_end
                 FROM schedule_segments
                 WHERE schedule_id = ?1
                 ORDER BY effective_start, group_id, rowid",
            )
            .map_err(query_error)?;

        let rows = stmt
            .query_map(params![id], |row| {
                Ok(WeightSegment {
                    group_id: row.get(0)?,
                    security: row.get(1)?,
                    weight: row.get(2)?,
                    effective_start: parse_date(3, row.get(3)?)?,
                    effective_end: parse_date(4, row.get(4)?)?,
                })
            })
            .map_err(query_error)?;

        rows.collect::<Result<Vec<_>, _>>().map_err(query_error)
    }
}

impl SecurityPort for SqliteAdapter {
    fn list_securities(&self, query: &SecurityQuery) -> Result<Vec<Security>, FundbenchError> {
        let conn = self.conn()?;
        let (sql, values) = security_sql(query);
        tracing::debug!(%sql, "listing securities");

        let mut stmt = conn.prepare(&sql).map_err(query_error)?;
        let rows = stmt
            .query_map(params_from_iter(values.iter()), |row| {
                Ok(Security {
                    code: row.get(0)?,
                    symbol: row.get(1)?,
                    exchange: row.get(2)?,
                    security_type: row.get(3)?,
                    name: row.get(4)?,
                    full_name: row.get(5)?,
                })
            })
            .map_err(query_error)?;

        rows.collect::<Result<Vec<_>, _>>().map_err(query_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EmptyConfig;

    impl ConfigPort for EmptyConfig {
        fn get_string(&self, _section: &str, _key: &str) -> Option<String> {
            None
        }
        fn get_int(&self, _section: &str, _key: &str, default: i64) -> i64 {
            default
        }
        fn get_double(&self, _section: &str, _key: &str, default: f64) -> f64 {
            default
        }
    }

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, day).unwrap()
    }

    fn security(code: &str, security_type: &str, name: &str) -> Security {
        Security {
            code: code.to_string(),
            symbol: code[..6].to_string(),
            exchange: "SH".to_string(),
            security_type: security_type.to_string(),
            name: name.to_string(),
            full_name: format!("{name} Index"),
        }
    }

    fn seeded() -> SqliteAdapter {
        let adapter = SqliteAdapter::in_memory().unwrap();
        adapter.initialize_schema().unwrap();
        adapter
            .insert_prices(&[
                PricePoint::new(d(1, 2), "EQ", Some(100.0)),
                PricePoint::new(d(1, 2), "BOND", Some(50.0)),
                PricePoint::new(d(1, 3), "EQ", None),
                PricePoint::new(d(1, 3), "BOND", Some(50.5)),
                PricePoint::new(d(1, 4), "OTHER", Some(9.0)),
            ])
            .unwrap();
        adapter
            .insert_segments(
                7,
                &[
                    WeightSegment {
                        group_id: 1,
                        security: "EQ".into(),
                        weight: 0.6,
                        effective_start: d(1, 1),
                        effective_end: d(12, 31),
                    },
                    WeightSegment {
                        group_id: 1,
                        security: "BOND".into(),
                        weight: 0.4,
                        effective_start: d(1, 1),
                        effective_end: d(12, 31),
                    },
                ],
            )
            .unwrap();
        adapter
            .insert_securities(&[
                security("000300.SH", "TI", "CSI 300"),
                security("000905.SH", "TI", "CSI 500"),
                security("510300.SH", "ETF", "CSI 300 ETF"),
                security("000016.SH", "ti", "SSE 50"),
            ])
            .unwrap();
        adapter
    }

    #[test]
    fn from_config_missing_path() {
        let config = EmptyConfig;
        let result = SqliteAdapter::from_config(&config);
        match result {
            Err(FundbenchError::ConfigMissing { section, key }) => {
                assert_eq!(section, "sqlite");
                assert_eq!(key, "path");
            }
            Err(other) => panic!("expected ConfigMissing, got: {other}"),
            Ok(_) => panic!("expected error, got Ok"),
        }
    }

    #[test]
    fn in_memory_initialization() {
        let adapter = SqliteAdapter::in_memory().unwrap();
        adapter.initialize_schema().unwrap();
        adapter.initialize_schema().unwrap();
    }

    #[test]
    fn get_prices_returns_requested_securities() {
        let adapter = seeded();
        let panel = adapter
            .get_prices(&["EQ".into(), "BOND".into()], d(1, 1), d(1, 31))
            .unwrap();

        assert_eq!(panel.len(), 2);
        assert_eq!(panel.price(d(1, 2), "EQ"), Some(100.0));
        assert_eq!(panel.price(d(1, 3), "EQ"), None);
        assert_eq!(panel.price(d(1, 3), "BOND"), Some(50.5));
        assert!(!panel.securities().contains("OTHER"));
    }

    #[test]
    fn get_prices_respects_window() {
        let adapter = seeded();
        let panel = adapter.get_prices(&["BOND".into()], d(1, 3), d(1, 3)).unwrap();
        assert_eq!(panel.dates().collect::<Vec<_>>(), vec![d(1, 3)]);
        assert!(adapter.get_prices(&[], d(1, 1), d(1, 31)).unwrap().is_empty());
    }

    #[test]
    fn load_weight_segments_by_schedule() {
        let adapter = seeded();
        let segments = adapter.load_weight_segments(7).unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].security, "EQ");
        assert_eq!(segments[1].effective_end, d(12, 31));
        assert!(adapter.load_weight_segments(8).unwrap().is_empty());
    }

    #[test]
    fn list_securities_like_is_case_sensitive() {
        let adapter = seeded();
        let query = SecurityQuery::parse([("type.like", "TI%")]).unwrap();
        let codes: Vec<_> = adapter
            .list_securities(&query)
            .unwrap()
            .into_iter()
            .map(|s| s.code)
            .collect();
        assert_eq!(codes, vec!["000300.SH", "000905.SH"]);
    }

    #[test]
    fn list_securities_orders_and_pages() {
        let adapter = seeded();
        let query = SecurityQuery::parse([
            ("code.startswith", "000"),
            (".order_by", "code desc"),
            (".offset", "1"),
            (".limit", "1"),
        ])
        .unwrap();
        let found = adapter.list_securities(&query).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].code, "000300.SH");
    }

    #[test]
    fn sqlite_and_memory_agree() {
        let adapter = seeded();
        let all = adapter.list_securities(&SecurityQuery::default()).unwrap();
        let query = SecurityQuery::parse([
            ("name.like", "CSI%"),
            (".order_by", "type desc, code asc"),
        ])
        .unwrap();
        assert_eq!(adapter.list_securities(&query).unwrap(), query.apply(all));
    }

    #[test]
    fn security_sql_is_parameterised() {
        let query = SecurityQuery::parse([
            ("name", "x'; DROP TABLE securities; --"),
            (".limit", "5"),
        ])
        .unwrap();
        let (sql, values) = security_sql(&query);
        assert!(sql.contains("WHERE name = ?"));
        assert!(sql.ends_with("LIMIT 5 OFFSET 0"));
        assert_eq!(values, vec!["x'; DROP TABLE securities; --"]);
    }
}
