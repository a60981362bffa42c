//! Port traits at the I/O seams of the engine.

pub mod config_port;
pub mod price_port;
pub mod report_port;
pub mod schedule_port;
pub mod security_port;

use price_port::PricePort;
use schedule_port::SchedulePort;
use security_port::SecurityPort;

/// An adapter that serves prices, schedules and security metadata.
pub trait DataSource: PricePort + SchedulePort + SecurityPort {
    fn prices(&self) -> &dyn PricePort;
    fn schedules(&self) -> &dyn SchedulePort;
    fn securities(&self) -> &dyn SecurityPort;
}

impl<T: PricePort + SchedulePort + SecurityPort> DataSource for T {
    fn prices(&self) -> &dyn PricePort {
        self
    }

    fn schedules(&self) -> &dyn SchedulePort {
        self
    }

    fn securities(&self) -> &dyn SecurityPort {
        self
    }
}
