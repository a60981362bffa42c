//! Price provider port.

use crate::domain::error::FundbenchError;
use crate::domain::price_panel::PricePanel;
use chrono::NaiveDate;

pub trait PricePort {
    /// Daily adjusted prices for `securities` between `start` and `end`
    /// inclusive. Securities without observations are simply absent.
    fn get_prices(
        &self,
        securities: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PricePanel, FundbenchError>;
}
