//! Security metadata listing port.

use crate::domain::error::FundbenchError;
use crate::domain::security::{Security, SecurityQuery};

pub trait SecurityPort {
    fn list_securities(&self, query: &SecurityQuery) -> Result<Vec<Security>, FundbenchError>;
}
