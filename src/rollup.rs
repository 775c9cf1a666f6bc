//! Single-journey progress rollup.

use crate::analyzers::utility::pct;
use crate::delay::compute_stop_delays;
use crate::error::ContractError;
use crate::identity;
use crate::model::{Journey, JourneyStatus, StopStatus};
use chrono::NaiveDateTime;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JourneyRollup {
    pub journey_id: String,
    pub status: JourneyStatus,
    pub driver_name: Option<String>,
    pub route_name: Option<String>,

    pub normal_stop_count: usize,
    pub excluded_stop_count: usize,
    pub pending_count: usize,
    pub in_progress_count: usize,
    pub completed_count: usize,
    pub failed_count: usize,
    pub skipped_count: usize,
    pub total_processed: usize,

    pub overall_progress_pct: f64,
    /// Success and failure are adjacent segments of one bar; they never
    /// add up to more than 100.
    pub success_rate_pct: f64,
    pub failure_rate_pct: f64,

    pub can_complete: bool,
    pub needs_reoptimization: bool,
    pub elapsed_minutes: Option<i64>,
    pub delayed_stop_count: usize,
    pub max_actual_delay_minutes: i64,
}

/// Rolls a journey's normal stops up into counts and rates.
///
/// `now` closes the elapsed time of a journey that has not completed yet.
pub fn aggregate_journey(
    journey: &Journey,
    now: &NaiveDateTime,
) -> Result<JourneyRollup, ContractError> {
    journey.validate()?;

    let mut pending_count = 0;
    let mut in_progress_count = 0;
    let mut completed_count = 0;
    let mut failed_count = 0;
    let mut skipped_count = 0;
    let mut normal_stop_count = 0;
    let mut delayed_stop_count = 0;
    let mut max_actual_delay_minutes = 0;

    for stop in journey.normal_stops() {
        normal_stop_count += 1;

        match stop.status {
            StopStatus::Pending => pending_count += 1,
            StopStatus::InProgress => in_progress_count += 1,
            StopStatus::Completed => completed_count += 1,
            StopStatus::Failed => failed_count += 1,
            StopStatus::Skipped => skipped_count += 1,
        }

        let actual = compute_stop_delays(stop).actual_delay_minutes;
        if actual > 0 {
            delayed_stop_count += 1;
            max_actual_delay_minutes = max_actual_delay_minutes.max(actual);
        }
    }

    let total_processed = completed_count + failed_count;
    let success_rate_pct = pct(completed_count, normal_stop_count);
    let failure_rate_pct = pct(failed_count, normal_stop_count).min(100.0 - success_rate_pct);

    let can_complete = journey.status.is_active()
        && journey.normal_stops().all(|s| s.status.is_terminal());

    let elapsed_minutes = journey.started_at.map(|started| {
        let end = journey.completed_at.unwrap_or(*now);
        (end - started).num_minutes().max(0)
    });

    Ok(JourneyRollup {
        journey_id: journey.id.clone(),
        status: journey.status,
        driver_name: identity::driver_name(journey),
        route_name: identity::route_name(journey),
        normal_stop_count,
        excluded_stop_count: journey.excluded_stops().count(),
        pending_count,
        in_progress_count,
        completed_count,
        failed_count,
        skipped_count,
        total_processed,
        overall_progress_pct: pct(total_processed, normal_stop_count),
        success_rate_pct,
        failure_rate_pct,
        can_complete,
        needs_reoptimization: journey.needs_reoptimization,
        elapsed_minutes,
        delayed_stop_count,
        max_actual_delay_minutes,
    })
}
