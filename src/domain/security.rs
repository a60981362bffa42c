//! Security metadata and the listing query grammar.
//!
//! Listing requests arrive as `(key, value)` pairs. Only these forms are
//! accepted, over the fixed set of [`SecurityField`]s:
//!
//! - `field=value` equality
//! - `field.startswith=prefix`
//! - `field.like=pattern` (`%` any run, `_` one character)
//! - `.order_by=field [asc|desc][,field [asc|desc]...]`
//! - `.offset=N` and `.limit=N`
//!
//! Anything else is rejected rather than ignored.

use crate::domain::error::FundbenchError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Security {
    pub code: String,
    pub symbol: String,
    pub exchange: String,
    #[serde(rename = "type")]
    pub security_type: String,
    pub name: String,
    pub full_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityField {
    Code,
    Symbol,
    Exchange,
    Type,
    Name,
    FullName,
}

impl SecurityField {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "code" => Some(Self::Code),
            "symbol" => Some(Self::Symbol),
            "exchange" => Some(Self::Exchange),
            "type" => Some(Self::Type),
            "name" => Some(Self::Name),
            "full_name" => Some(Self::FullName),
            _ => None,
        }
    }

    /// Column name in storage.
    pub fn column(self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Symbol => "symbol",
            Self::Exchange => "exchange",
            Self::Type => "type",
            Self::Name => "name",
            Self::FullName => "full_name",
        }
    }

    pub fn value(self, security: &Security) -> &str {
        match self {
            Self::Code => &security.code,
            Self::Symbol => &security.symbol,
            Self::Exchange => &security.exchange,
            Self::Type => &security.security_type,
            Self::Name => &security.name,
            Self::FullName => &security.full_name,
        }
    }
}

impl fmt::Display for SecurityField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Equals,
    StartsWith,
    Like,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub field: SecurityField,
    pub op: FilterOp,
    pub value: String,
}

impl Filter {
    pub fn matches(&self, security: &Security) -> bool {
        let actual = self.field.value(security);
        match self.op {
            FilterOp::Equals => actual == self.value,
            FilterOp::StartsWith => actual.starts_with(&self.value),
            FilterOp::Like => like_matches(&self.value, actual),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderKey {
    pub field: SecurityField,
    pub direction: Direction,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecurityQuery {
    pub filters: Vec<Filter>,
    pub order_by: Vec<OrderKey>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

impl SecurityQuery {
    pub fn parse<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Result<Self, FundbenchError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut query = SecurityQuery::default();

        for (key, value) in pairs {
            let (key, value) = (key.as_ref(), value.as_ref());
            match key {
                ".order_by" => query.order_by.extend(parse_order_by(value)?),
                ".offset" => query.offset = Some(parse_count(key, value)?),
                ".limit" => query.limit = Some(parse_count(key, value)?),
                _ => query.filters.push(parse_filter(key, value)?),
            }
        }

        Ok(query)
    }

    /// Apply filters, ordering, offset and limit in memory.
    pub fn apply(&self, securities: Vec<Security>) -> Vec<Security> {
        let mut selected: Vec<Security> = securities
            .into_iter()
            .filter(|s| self.filters.iter().all(|f| f.matches(s)))
            .collect();

        if !self.order_by.is_empty() {
            selected.sort_by(|a, b| self.compare(a, b));
        }

        selected
            .into_iter()
            .skip(self.offset.unwrap_or(0))
            .take(self.limit.unwrap_or(usize::MAX))
            .collect()
    }

    fn compare(&self, a: &Security, b: &Security) -> Ordering {
        self.order_by
            .iter()
            .map(|key| {
                let ord = key.field.value(a).cmp(key.field.value(b));
                match key.direction {
                    Direction::Asc => ord,
                    Direction::Desc => ord.reverse(),
                }
            })
            .find(|ord| *ord != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }
}

fn invalid(reason: String) -> FundbenchError {
    FundbenchError::InvalidQuery { reason }
}

fn parse_field(name: &str) -> Result<SecurityField, FundbenchError> {
    SecurityField::parse(name).ok_or_else(|| invalid(format!("unknown field '{name}'")))
}

fn parse_filter(key: &str, value: &str) -> Result<Filter, FundbenchError> {
    let (field, op) = match key.split_once('.') {
        None => (key, FilterOp::Equals),
        Some((field, "startswith")) => (field, FilterOp::StartsWith),
        Some((field, "like")) => (field, FilterOp::Like),
        Some((_, op)) => return Err(invalid(format!("unsupported operator '{op}' in '{key}'"))),
    };
    Ok(Filter {
        field: parse_field(field)?,
        op,
        value: value.to_string(),
    })
}

fn parse_order_by(value: &str) -> Result<Vec<OrderKey>, FundbenchError> {
    value
        .split(',')
        .map(|part| {
            let mut words = part.split_whitespace();
            let field = words
                .next()
                .ok_or_else(|| invalid(format!("empty .order_by entry in '{value}'")))?;
            let direction = match words.next().map(str::to_lowercase).as_deref() {
                None | Some("asc") => Direction::Asc,
                Some("desc") => Direction::Desc,
                Some(other) => return Err(invalid(format!("unknown direction '{other}'"))),
            };
            if words.next().is_some() {
                return Err(invalid(format!("malformed .order_by entry '{part}'")));
            }
            Ok(OrderKey {
                field: parse_field(field)?,
                direction,
            })
        })
        .collect()
}

fn parse_count(key: &str, value: &str) -> Result<usize, FundbenchError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(format!("{key} must be a non-negative integer, got '{value}'")))
}

/// SQL `LIKE` semantics: `%` matches any run of characters, `_` exactly one.
pub fn like_matches(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();
    let (mut pi, mut ti) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while ti < t.len() {
        if pi < p.len() && (p[pi] == '_' || p[pi] == t[ti]) {
            pi += 1;
            ti += 1;
        } else if pi < p.len() && p[pi] == '%' {
            backtrack = Some((pi, ti));
            pi += 1;
        } else if let Some((star, matched)) = backtrack {
            pi = star + 1;
            ti = matched + 1;
            backtrack = Some((star, matched + 1));
        } else {
            return false;
        }
    }
    p[pi..].iter().all(|&c| c == '%')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn security(code: &str, security_type: &str, name: &str) -> Security {
        Security {
            code: code.to_string(),
            symbol: code.split('.').next().unwrap_or(code).to_string(),
            exchange: "SH".to_string(),
            security_type: security_type.to_string(),
            name: name.to_string(),
            full_name: format!("{name} Index"),
        }
    }

    fn sample() -> Vec<Security> {
        vec![
            security("000300.SH", "TI", "CSI 300"),
            security("000905.SH", "TI", "CSI 500"),
            security("510300.SH", "ETF", "CSI 300 ETF"),
            security("000016.SH", "TIX", "SSE 50"),
        ]
    }

    #[test]
    fn parses_full_grammar() {
        let query = SecurityQuery::parse([
            ("type.like", "TI%"),
            ("exchange", "SH"),
            ("code.startswith", "000"),
            (".order_by", "name desc, code"),
            (".offset", "1"),
            (".limit", "2"),
        ])
        .unwrap();

        assert_eq!(query.filters.len(), 3);
        assert_eq!(query.filters[0].op, FilterOp::Like);
        assert_eq!(query.filters[1].op, FilterOp::Equals);
        assert_eq!(query.filters[2].op, FilterOp::StartsWith);
        assert_eq!(
            query.order_by,
            vec![
                OrderKey {
                    field: SecurityField::Name,
                    direction: Direction::Desc
                },
                OrderKey {
                    field: SecurityField::Code,
                    direction: Direction::Asc
                },
            ]
        );
        assert_eq!(query.offset, Some(1));
        assert_eq!(query.limit, Some(2));
    }

    #[test]
    fn rejects_unknown_field() {
        let err = SecurityQuery::parse([("password", "x")]).unwrap_err();
        assert!(matches!(err, FundbenchError::InvalidQuery { .. }));
    }

    #[test]
    fn rejects_unknown_operator() {
        assert!(SecurityQuery::parse([("code.contains", "x")]).is_err());
        assert!(SecurityQuery::parse([(".unknown", "x")]).is_err());
    }

    #[test]
    fn rejects_bad_order_and_counts() {
        assert!(SecurityQuery::parse([(".order_by", "code sideways")]).is_err());
        assert!(SecurityQuery::parse([(".order_by", "code asc extra")]).is_err());
        assert!(SecurityQuery::parse([(".order_by", "")]).is_err());
        assert!(SecurityQuery::parse([(".limit", "-1")]).is_err());
        assert!(SecurityQuery::parse([(".offset", "ten")]).is_err());
    }

    #[test]
    fn apply_filters_like_prefix() {
        let query = SecurityQuery::parse([("type.like", "TI%")]).unwrap();
        let codes: Vec<_> = query.apply(sample()).into_iter().map(|s| s.code).collect();
        assert_eq!(codes, vec!["000300.SH", "000905.SH", "000016.SH"]);
    }

    #[test]
    fn apply_orders_and_pages() {
        let query =
            SecurityQuery::parse([(".order_by", "code desc"), (".offset", "1"), (".limit", "2")])
                .unwrap();
        let codes: Vec<_> = query.apply(sample()).into_iter().map(|s| s.code).collect();
        assert_eq!(codes, vec!["000905.SH", "000300.SH"]);
    }

    #[test]
    fn apply_equality_and_startswith() {
        let query = SecurityQuery::parse([("type", "TI"), ("name.startswith", "CSI 5")]).unwrap();
        let codes: Vec<_> = query.apply(sample()).into_iter().map(|s| s.code).collect();
        assert_eq!(codes, vec!["000905.SH"]);
    }

    #[test]
    fn like_wildcards() {
        assert!(like_matches("TI%", "TI"));
        assert!(like_matches("TI%", "TIX"));
        assert!(!like_matches("TI%", "ETF"));
        assert!(like_matches("%300%", "CSI 300 ETF"));
        assert!(like_matches("C_I%", "CSI 500"));
        assert!(!like_matches("C_I", "CSI 500"));
        assert!(like_matches("%", ""));
        assert!(like_matches("a%b%c", "axxbyyc"));
        assert!(!like_matches("a%b%c", "axxbyy"));
    }
}
