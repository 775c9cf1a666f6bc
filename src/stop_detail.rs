//! Per-stop derived facts for detail views: dwell time, proof of delivery,
//! and whether a delay reason is worth surfacing.

use crate::delay::{DelayMeasurement, compute_stop_delays};
use crate::identity;
use crate::model::{DelayReasonCategory, Journey, Photo, Stop, StopStatus};
use crate::time::{format_clock, format_delay};
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DelayReason {
    pub category: Option<DelayReasonCategory>,
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StopDetail {
    pub stop_id: String,
    pub order: u32,
    pub status: StopStatus,
    pub customer_name: Option<String>,
    /// Originally promised arrival as `HH:MM`.
    pub planned_arrival: Option<String>,
    pub delays: DelayMeasurement,
    /// Actual delay as shown to dispatchers, e.g. `+12 min`.
    pub delay_label: String,
    /// Only set once the stop is completed or failed.
    pub dwell_minutes: Option<i64>,
    pub has_signature: bool,
    pub has_photo: bool,
    pub photos: Vec<Photo>,
    /// Only set when a completed or failed stop actually arrived late.
    pub delay_reason: Option<DelayReason>,
    pub receiver_name: Option<String>,
    pub failure_reason: Option<String>,
    pub notes: Option<String>,
}

fn present(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

/// Whole minutes between check-in and check-out, clamped at zero.
pub fn dwell_minutes(stop: &Stop) -> Option<i64> {
    let (check_in, check_out) = (stop.check_in_time?, stop.check_out_time?);
    let seconds = (check_out - check_in).num_seconds();
    Some(seconds.div_euclid(60).max(0))
}

/// Photo references for a stop, de-duplicated by url and type.
///
/// The legacy single `photoUrl` field is folded in as an untyped photo.
pub fn unique_photos(stop: &Stop) -> Vec<Photo> {
    let legacy = stop
        .photo_url
        .as_deref()
        .filter(|url| !url.trim().is_empty())
        .map(|url| Photo {
            url: url.to_string(),
            kind: None,
        });

    let mut seen = HashSet::new();
    stop.photos
        .iter()
        .cloned()
        .chain(legacy)
        .filter(|p| !p.url.trim().is_empty())
        .filter(|p| seen.insert((p.url.clone(), p.kind.clone())))
        .collect()
}

pub fn has_signature(stop: &Stop) -> bool {
    present(stop.signature_url.as_deref())
}

pub fn has_photo(stop: &Stop) -> bool {
    present(stop.photo_url.as_deref())
        || present(stop.photo_base64.as_deref())
        || stop.photos.iter().any(|p| present(Some(p.url.as_str())))
}

/// The stored reason, but only for a processed stop that was actually late.
///
/// Before check-in the actual delay is only the plan drift, which says
/// nothing about how the visit went.
pub fn surfaced_delay_reason(stop: &Stop, delays: &DelayMeasurement) -> Option<DelayReason> {
    if !stop.status.is_processed() || !delays.is_late() {
        return None;
    }

    let text = stop
        .delay_reason
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string);

    if stop.delay_reason_category.is_none() && text.is_none() {
        return None;
    }

    Some(DelayReason {
        category: stop.delay_reason_category,
        text,
    })
}

pub fn detail_stop(stop: &Stop) -> StopDetail {
    let delays = compute_stop_delays(stop);

    StopDetail {
        stop_id: stop.id.clone(),
        order: stop.order,
        status: stop.status,
        customer_name: identity::customer_name(stop),
        planned_arrival: stop.original_arrival_minutes().map(format_clock),
        delays,
        delay_label: format_delay(delays.actual_delay_minutes),
        dwell_minutes: if stop.status.is_processed() {
            dwell_minutes(stop)
        } else {
            None
        },
        has_signature: has_signature(stop),
        has_photo: has_photo(stop),
        photos: unique_photos(stop),
        delay_reason: surfaced_delay_reason(stop, &delays),
        receiver_name: stop.receiver_name.clone(),
        failure_reason: stop.failure_reason.clone(),
        notes: stop.notes.clone(),
    }
}

/// Details for every stop on the active route, in visitation order.
pub fn detail_journey_stops(journey: &Journey) -> Vec<StopDetail> {
    journey.normal_stops().map(detail_stop).collect()
}
