//! Journey and stop records as delivered by the journey-data service.
//!
//! The engine never mutates these; every derived figure is recomputed on read.

pub mod journey;
pub mod status;
pub mod stop;

pub use journey::{DriverRef, Journey, RouteRef};
pub use status::{DelayReasonCategory, JourneyStatus, StopStatus};
pub use stop::{CustomerRef, Photo, Stop};
