//! Plan-vs-actual delay for a single stop.
//!
//! All figures are signed minutes: positive is late, negative is early.
//! Arithmetic is on minutes since midnight, so arrival and departure are
//! assumed to fall on the same calendar day as the plan.

use crate::model::Stop;
use crate::time::minutes_of_day;
use chrono::NaiveDateTime;
use serde::Serialize;

/// Delay figures for one stop. Derived on every read, never stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DelayMeasurement {
    pub plan_delay_minutes: i64,
    pub actual_delay_minutes: i64,
    pub departure_delay_minutes: i64,
}

impl DelayMeasurement {
    pub fn is_late(&self) -> bool {
        self.actual_delay_minutes > 0
    }
}

fn diff(later: Option<i64>, baseline: Option<i64>) -> i64 {
    match (later, baseline) {
        (Some(later), Some(baseline)) => later - baseline,
        _ => 0,
    }
}

/// Drift of the revised arrival estimate from the original promise.
pub fn plan_delay(stop: &Stop) -> i64 {
    diff(stop.estimated_arrival_minutes(), stop.original_arrival_minutes())
}

/// Real arrival against the original plan, or the plan delay before arrival.
///
/// Measured against the original estimate, not the revised one, so a stop
/// pushed later by re-optimization still shows its lateness to the customer.
pub fn actual_delay(stop: &Stop) -> i64 {
    match &stop.check_in_time {
        Some(check_in) => diff(Some(minutes_of_day(check_in)), stop.original_arrival_minutes()),
        None => plan_delay(stop),
    }
}

/// Real departure against the original plan, or the revised departure drift.
pub fn departure_delay(stop: &Stop) -> i64 {
    match &stop.check_out_time {
        Some(check_out) => diff(Some(minutes_of_day(check_out)), stop.original_departure_minutes()),
        None => diff(stop.estimated_departure_minutes(), stop.original_departure_minutes()),
    }
}

pub fn compute_stop_delays(stop: &Stop) -> DelayMeasurement {
    DelayMeasurement {
        plan_delay_minutes: plan_delay(stop),
        actual_delay_minutes: actual_delay(stop),
        departure_delay_minutes: departure_delay(stop),
    }
}

/// Minutes a stop that has not been checked into is past its revised
/// arrival estimate, read on `now`'s wall clock. Zero when not overdue.
pub fn live_arrival_overdue(stop: &Stop, now: &NaiveDateTime) -> i64 {
    if stop.check_in_time.is_some() || stop.status.is_terminal() {
        return 0;
    }

    let expected = stop
        .estimated_arrival_minutes()
        .or_else(|| stop.original_arrival_minutes());

    match expected {
        Some(expected) => (minutes_of_day(now) - expected).max(0),
        None => 0,
    }
}
