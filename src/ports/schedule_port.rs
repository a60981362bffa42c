//! Schedule/metadata store port.

use crate::domain::error::FundbenchError;
use crate::domain::weight_schedule::WeightSegment;

pub trait SchedulePort {
    /// Raw weight rows for a benchmark or fund id. An unknown id yields an
    /// empty list.
    fn load_weight_segments(&self, id: i64) -> Result<Vec<WeightSegment>, FundbenchError>;
}
