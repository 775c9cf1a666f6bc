//! Fleet-level delay analytics.
//!
//! This module folds many journeys' stops into time-bucketed trends, SLA
//! compliance, a delay-reason breakdown, and ranked lists of the routes,
//! drivers and customers that run late most often.

pub mod aggregate;
pub mod thresholds;
pub mod types;
pub mod utility;

pub use aggregate::build_fleet_report;
pub use thresholds::Thresholds;
