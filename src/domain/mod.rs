//! Core domain types and logic.

pub mod blend;
pub mod calendar;
pub mod config_validation;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod metrics;
pub mod periods;
pub mod price_panel;
pub mod security;
pub mod value_series;
pub mod weight_schedule;
