pub mod analyzers;
pub mod delay;
pub mod error;
pub mod fetch;
pub mod identity;
pub mod model;
pub mod output;
pub mod parser;
pub mod rollup;
pub mod stop_detail;
pub mod time;

pub use analyzers::{Thresholds, build_fleet_report};
pub use delay::{DelayMeasurement, compute_stop_delays};
pub use error::ContractError;
pub use rollup::{JourneyRollup, aggregate_journey};
