//! fundbench: benchmark construction and performance evaluation.
//!
//! Blends constituent prices into a benchmark value series according to a
//! time-bounded weight schedule, then summarises any value series over a
//! fixed menu of trailing and calendar-to-date periods.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod ports;
