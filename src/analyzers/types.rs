//! Data types produced by the fleet aggregation pipeline.

use crate::analyzers::thresholds::Thresholds;
use crate::model::DelayReasonCategory;
use chrono::NaiveDate;
use serde::Serialize;

/// Stop outcomes for journeys started on one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryTrendPoint {
    pub date: NaiveDate,
    pub completed: usize,
    pub failed: usize,
    pub total: usize,
}

/// Running-delay figures for one day. Only stops with a positive delay count.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DelayTrendPoint {
    pub date: NaiveDate,
    pub avg_delay_minutes: f64,
    pub delayed_stop_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DelayReasonShare {
    pub category: DelayReasonCategory,
    pub count: usize,
    pub total_minutes: i64,
    /// Share of all delayed minutes in the report.
    pub pct: f64,
}

/// A route or driver ranked by accumulated delay.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DelayOffender {
    pub id: String,
    pub name: Option<String>,
    pub total_delay_minutes: i64,
    pub occurrences: usize,
    pub avg_delay_minutes: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyDelay {
    pub hour: u32,
    pub delayed_stop_count: usize,
    pub avg_delay_minutes: f64,
}

/// SLA split of one day's completed stops.
///
/// `on_time + delayed == completed`; `early` is a subset of `on_time`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlaDay {
    pub date: NaiveDate,
    pub completed: usize,
    pub on_time: usize,
    pub delayed: usize,
    pub early: usize,
    pub sla_rate_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerPerformance {
    pub customer_id: String,
    pub customer_name: Option<String>,
    pub deliveries: usize,
    pub on_time_rate_pct: f64,
    /// Mean over the customer's delayed stops only.
    pub avg_delay_minutes: f64,
}

/// A customer with recurring delays past the SLA grace window.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CriticalStop {
    pub customer_id: String,
    pub customer_name: Option<String>,
    pub frequency: usize,
    pub avg_delay_minutes: f64,
    pub last_delay_date: NaiveDate,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub journeys: usize,
    pub stops: usize,
    pub completed: usize,
    pub failed: usize,
    pub delayed_stops: usize,
    pub sla_rate_pct: f64,
    pub avg_delay_minutes: f64,
}

/// Complete reporting dataset for one window of journeys.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetReport {
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
    pub thresholds: Thresholds,
    pub summary: ReportSummary,
    pub delivery_trend: Vec<DeliveryTrendPoint>,
    pub delay_trend: Vec<DelayTrendPoint>,
    pub delay_reasons: Vec<DelayReasonShare>,
    pub most_delayed_routes: Vec<DelayOffender>,
    pub most_delayed_drivers: Vec<DelayOffender>,
    pub delay_by_hour: Vec<HourlyDelay>,
    pub sla_compliance: Vec<SlaDay>,
    pub customer_performance: Vec<CustomerPerformance>,
    pub critical_stops: Vec<CriticalStop>,
}
