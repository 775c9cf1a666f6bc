use crate::analyzers::thresholds::Thresholds;
use crate::analyzers::types::{
    CriticalStop, CustomerPerformance, DelayOffender, DelayReasonShare, DelayTrendPoint,
    DeliveryTrendPoint, FleetReport, HourlyDelay, ReportSummary, SlaDay,
};
use crate::analyzers::utility::{mean_minutes, pct, total_minutes};
use crate::error::ContractError;
use crate::identity;
use crate::model::{DelayReasonCategory, Journey, Stop, StopStatus};
use chrono::{NaiveDate, Timelike};
use std::cmp::Reverse;
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Default)]
struct DayTotals {
    completed: usize,
    failed: usize,
    total: usize,
    delays: Vec<i64>,
    sla_completed: usize,
    on_time: usize,
    sla_delayed: usize,
    early: usize,
}

#[derive(Default)]
struct OffenderTotals {
    name: Option<String>,
    delays: Vec<i64>,
}

#[derive(Default)]
struct CustomerTotals {
    name: Option<String>,
    deliveries: usize,
    on_time: usize,
    delays: Vec<i64>,
    critical: Vec<i64>,
    last_critical: Option<NaiveDate>,
}

/// Accumulates one report. Dropped after every call so nothing leaks
/// between invocations.
#[derive(Default)]
struct ReportBuilder {
    journeys: usize,
    days: BTreeMap<NaiveDate, DayTotals>,
    reasons: BTreeMap<DelayReasonCategory, Vec<i64>>,
    routes: BTreeMap<String, OffenderTotals>,
    drivers: BTreeMap<String, OffenderTotals>,
    hours: BTreeMap<u32, Vec<i64>>,
    customers: BTreeMap<String, CustomerTotals>,
}

impl ReportBuilder {
    fn add_journey(&mut self, journey: &Journey, date: NaiveDate, grace: i64) {
        self.journeys += 1;
        let route =
            identity::route_id(journey).map(|id| (id.to_string(), identity::route_name(journey)));
        let driver =
            identity::driver_id(journey).map(|id| (id.to_string(), identity::driver_name(journey)));

        // Days with journeys appear in the trends even when nothing was delivered.
        self.days.entry(date).or_default();

        for stop in journey.normal_stops() {
            self.add_stop(stop, date, grace, route.as_ref(), driver.as_ref());
        }
    }

    fn add_stop(
        &mut self,
        stop: &Stop,
        date: NaiveDate,
        grace: i64,
        route: Option<&(String, Option<String>)>,
        driver: Option<&(String, Option<String>)>,
    ) {
        let delay = stop.reported_delay();
        let day = self.days.entry(date).or_default();

        day.total += 1;
        match stop.status {
            StopStatus::Completed => {
                day.completed += 1;
                day.sla_completed += 1;
                if delay <= grace {
                    day.on_time += 1;
                } else {
                    day.sla_delayed += 1;
                }
                if delay < 0 {
                    day.early += 1;
                }
            }
            StopStatus::Failed => day.failed += 1,
            _ => {}
        }

        if delay > 0 {
            day.delays.push(delay);

            let category = stop.delay_reason_category.unwrap_or(DelayReasonCategory::Other);
            self.reasons.entry(category).or_default().push(delay);

            for (totals, who) in [(&mut self.routes, route), (&mut self.drivers, driver)] {
                if let Some((id, name)) = who {
                    let entry = totals.entry(id.clone()).or_insert_with(|| OffenderTotals {
                        name: name.clone(),
                        delays: Vec::new(),
                    });
                    entry.delays.push(delay);
                }
            }

            if let Some(check_in) = &stop.check_in_time {
                self.hours.entry(check_in.hour()).or_default().push(delay);
            }
        }

        if let Some(customer_id) = identity::customer_id(stop) {
            let customer = self
                .customers
                .entry(customer_id.to_string())
                .or_insert_with(|| CustomerTotals {
                    name: identity::customer_name(stop),
                    ..Default::default()
                });

            customer.deliveries += 1;
            if delay <= grace {
                customer.on_time += 1;
            }
            if delay > 0 {
                customer.delays.push(delay);
            }
            if delay > grace {
                customer.critical.push(delay);
                customer.last_critical = customer.last_critical.max(Some(date));
            }
        }
    }

    fn finish(
        self,
        window_start: NaiveDate,
        window_end: NaiveDate,
        thresholds: &Thresholds,
    ) -> FleetReport {
        let mut summary = ReportSummary {
            journeys: self.journeys,
            ..Default::default()
        };
        let mut sla_on_time = 0;
        let mut sla_completed = 0;
        let mut all_delays = Vec::new();

        let mut delivery_trend = Vec::with_capacity(self.days.len());
        let mut delay_trend = Vec::with_capacity(self.days.len());
        let mut sla_compliance = Vec::with_capacity(self.days.len());

        for (date, day) in &self.days {
            summary.stops += day.total;
            summary.completed += day.completed;
            summary.failed += day.failed;
            sla_on_time += day.on_time;
            sla_completed += day.sla_completed;
            all_delays.extend_from_slice(&day.delays);

            delivery_trend.push(DeliveryTrendPoint {
                date: *date,
                completed: day.completed,
                failed: day.failed,
                total: day.total,
            });
            delay_trend.push(DelayTrendPoint {
                date: *date,
                avg_delay_minutes: mean_minutes(&day.delays),
                delayed_stop_count: day.delays.len(),
            });
            sla_compliance.push(SlaDay {
                date: *date,
                completed: day.sla_completed,
                on_time: day.on_time,
                delayed: day.sla_delayed,
                early: day.early,
                sla_rate_pct: pct(day.on_time, day.sla_completed),
            });
        }

        summary.delayed_stops = all_delays.len();
        summary.sla_rate_pct = pct(sla_on_time, sla_completed);
        summary.avg_delay_minutes = mean_minutes(&all_delays);

        FleetReport {
            window_start,
            window_end,
            thresholds: *thresholds,
            summary,
            delivery_trend,
            delay_trend,
            delay_reasons: reason_breakdown(&self.reasons),
            most_delayed_routes: rank_offenders(self.routes, thresholds.top_offenders),
            most_delayed_drivers: rank_offenders(self.drivers, thresholds.top_offenders),
            delay_by_hour: self
                .hours
                .iter()
                .map(|(hour, delays)| HourlyDelay {
                    hour: *hour,
                    delayed_stop_count: delays.len(),
                    avg_delay_minutes: mean_minutes(delays),
                })
                .collect(),
            sla_compliance,
            customer_performance: customer_performance(&self.customers, thresholds.top_customers),
            critical_stops: critical_stops(&self.customers, thresholds.top_critical_stops),
        }
    }
}

fn reason_breakdown(reasons: &BTreeMap<DelayReasonCategory, Vec<i64>>) -> Vec<DelayReasonShare> {
    let all_minutes = reasons
        .values()
        .fold(0i64, |acc, delays| acc.saturating_add(total_minutes(delays)));

    let mut shares: Vec<DelayReasonShare> = reasons
        .iter()
        .filter(|(_, delays)| !delays.is_empty())
        .map(|(category, delays)| {
            let minutes = total_minutes(delays);
            DelayReasonShare {
                category: *category,
                count: delays.len(),
                total_minutes: minutes,
                pct: if all_minutes == 0 {
                    0.0
                } else {
                    minutes as f64 / all_minutes as f64 * 100.0
                },
            }
        })
        .collect();

    shares.sort_by_key(|s| Reverse(s.total_minutes));
    shares
}

fn rank_offenders(totals: BTreeMap<String, OffenderTotals>, top: usize) -> Vec<DelayOffender> {
    let mut ranked: Vec<DelayOffender> = totals
        .into_iter()
        .map(|(id, t)| DelayOffender {
            id,
            name: t.name,
            total_delay_minutes: total_minutes(&t.delays),
            occurrences: t.delays.len(),
            avg_delay_minutes: mean_minutes(&t.delays),
        })
        .collect();

    // Stable sort keeps id order among ties.
    ranked.sort_by_key(|o| Reverse(o.total_delay_minutes));
    ranked.truncate(top);
    ranked
}

fn customer_performance(
    customers: &BTreeMap<String, CustomerTotals>,
    top: usize,
) -> Vec<CustomerPerformance> {
    let mut rows: Vec<CustomerPerformance> = customers
        .iter()
        .map(|(id, c)| CustomerPerformance {
            customer_id: id.clone(),
            customer_name: c.name.clone(),
            deliveries: c.deliveries,
            on_time_rate_pct: pct(c.on_time, c.deliveries),
            avg_delay_minutes: mean_minutes(&c.delays),
        })
        .collect();

    rows.sort_by_key(|r| Reverse(r.deliveries));
    rows.truncate(top);
    rows
}

fn critical_stops(customers: &BTreeMap<String, CustomerTotals>, top: usize) -> Vec<CriticalStop> {
    let mut rows: Vec<CriticalStop> = customers
        .iter()
        .filter_map(|(id, c)| {
            let last_delay_date = c.last_critical?;
            Some(CriticalStop {
                customer_id: id.clone(),
                customer_name: c.name.clone(),
                frequency: c.critical.len(),
                avg_delay_minutes: mean_minutes(&c.critical),
                last_delay_date,
            })
        })
        .collect();

    rows.sort_by_key(|r| Reverse(r.frequency));
    rows.truncate(top);
    rows
}

/// Builds the fleet reporting dataset for journeys started within
/// `[window_start, window_end]`.
///
/// Aggregation trusts the upstream `newDelay` running delay as-is. Journeys
/// without a start time or outside the window are ignored, and only stops on
/// the active route are counted. Output order is fully determined by the
/// input, so identical input always yields an identical report.
#[tracing::instrument(skip(journeys, thresholds), fields(journeys = journeys.len()))]
pub fn build_fleet_report(
    journeys: &[Journey],
    window_start: NaiveDate,
    window_end: NaiveDate,
    thresholds: &Thresholds,
) -> Result<FleetReport, ContractError> {
    let mut builder = ReportBuilder::default();

    for journey in journeys {
        journey.validate()?;

        let Some(date) = journey.service_date() else {
            debug!(journey_id = %journey.id, "Journey has no start time, skipping");
            continue;
        };

        if date < window_start || date > window_end {
            debug!(journey_id = %journey.id, %date, "Journey outside report window, skipping");
            continue;
        }

        builder.add_journey(journey, date, thresholds.sla_grace_minutes);
    }

    debug!(considered = builder.journeys, days = builder.days.len(), "Fleet report aggregated");

    Ok(builder.finish(window_start, window_end, thresholds))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CustomerRef, JourneyStatus};
    use crate::time::parse_timestamp;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn stop(id: &str, status: StopStatus, new_delay: i64) -> Stop {
        Stop {
            id: id.to_string(),
            order: 1,
            status,
            new_delay: Some(new_delay),
            ..Default::default()
        }
    }

    fn journey(id: &str, started: &str, stops: Vec<Stop>) -> Journey {
        let mut j = Journey::new(id, JourneyStatus::Completed);
        j.started_at = parse_timestamp(started);
        j.stops = stops;
        j
    }

    fn for_customer(mut s: Stop, customer: &str) -> Stop {
        s.customer = Some(CustomerRef {
            id: Some(customer.to_string()),
            name: Some(format!("Customer {}", customer)),
        });
        s
    }

    fn report(journeys: &[Journey]) -> FleetReport {
        build_fleet_report(journeys, day(1), day(7), &Thresholds::default()).unwrap()
    }

    #[test]
    fn test_empty_input_yields_empty_report() {
        let r = report(&[]);
        assert_eq!(r.summary, ReportSummary::default());
        assert!(r.delivery_trend.is_empty());
        assert!(r.delay_trend.is_empty());
        assert!(r.delay_reasons.is_empty());
        assert!(r.most_delayed_routes.is_empty());
        assert!(r.most_delayed_drivers.is_empty());
        assert!(r.delay_by_hour.is_empty());
        assert!(r.sla_compliance.is_empty());
        assert!(r.customer_performance.is_empty());
        assert!(r.critical_stops.is_empty());
    }

    #[test]
    fn test_three_stop_scenario() {
        let j = journey(
            "j1",
            "2024-03-02T08:00:00",
            vec![
                stop("a", StopStatus::Completed, 5),
                stop("b", StopStatus::Completed, 20),
                stop("c", StopStatus::Failed, 0),
            ],
        );
        let r = report(&[j]);

        assert_eq!(
            r.delivery_trend,
            vec![DeliveryTrendPoint {
                date: day(2),
                completed: 2,
                failed: 1,
                total: 3
            }]
        );
        let sla = &r.sla_compliance[0];
        assert_eq!(sla.completed, 2);
        assert_eq!(sla.on_time, 1);
        assert_eq!(sla.delayed, 1);
        assert_eq!(sla.early, 0);
        assert_eq!(sla.sla_rate_pct, 50.0);

        assert_eq!(r.delay_trend[0].delayed_stop_count, 2);
        assert_eq!(r.delay_trend[0].avg_delay_minutes, 12.5);
    }

    #[test]
    fn test_reason_breakdown_scenario() {
        let mut a = stop("a", StopStatus::Completed, 10);
        a.delay_reason_category = Some(DelayReasonCategory::Traffic);
        let mut b = stop("b", StopStatus::Completed, 5);
        b.delay_reason_category = Some(DelayReasonCategory::Traffic);
        let mut c = stop("c", StopStatus::Completed, 15);
        c.delay_reason_category = Some(DelayReasonCategory::Weather);
        let mut on_time = stop("d", StopStatus::Completed, 0);
        on_time.delay_reason_category = Some(DelayReasonCategory::BreakTime);

        let r = report(&[journey("j1", "2024-03-02T08:00:00", vec![a, b, c, on_time])]);

        assert_eq!(
            r.delay_reasons,
            vec![
                DelayReasonShare {
                    category: DelayReasonCategory::Traffic,
                    count: 2,
                    total_minutes: 15,
                    pct: 50.0
                },
                DelayReasonShare {
                    category: DelayReasonCategory::Weather,
                    count: 1,
                    total_minutes: 15,
                    pct: 50.0
                },
            ]
        );
    }

    #[test]
    fn test_sla_buckets_partition_completed() {
        let stops = vec![
            stop("a", StopStatus::Completed, -5),
            stop("b", StopStatus::Completed, 15),
            stop("c", StopStatus::Completed, 16),
            stop("d", StopStatus::Pending, 40),
            stop("e", StopStatus::Failed, 30),
        ];
        let r = report(&[journey("j1", "2024-03-03T08:00:00", stops)]);
        let sla = &r.sla_compliance[0];

        assert_eq!(sla.completed, 3);
        assert_eq!(sla.on_time, 2);
        assert_eq!(sla.delayed, 1);
        assert_eq!(sla.early, 1);
        assert!(sla.on_time + sla.delayed <= sla.completed);
    }

    #[test]
    fn test_critical_stops_threshold_is_strict() {
        let stops = vec![
            for_customer(stop("a", StopStatus::Completed, 10), "c1"),
            for_customer(stop("b", StopStatus::Completed, 15), "c1"),
            for_customer(stop("c", StopStatus::Completed, 16), "c2"),
        ];
        let r = report(&[journey("j1", "2024-03-02T08:00:00", stops)]);

        assert_eq!(r.critical_stops.len(), 1);
        assert_eq!(r.critical_stops[0].customer_id, "c2");
        assert_eq!(r.critical_stops[0].frequency, 1);
        assert_eq!(r.customer_performance.len(), 2);
    }

    #[test]
    fn test_critical_stops_track_last_delay_date() {
        let r = report(&[
            journey(
                "j1",
                "2024-03-02T08:00:00",
                vec![for_customer(stop("a", StopStatus::Completed, 20), "c1")],
            ),
            journey(
                "j2",
                "2024-03-05T08:00:00",
                vec![for_customer(stop("b", StopStatus::Completed, 40), "c1")],
            ),
            journey(
                "j3",
                "2024-03-06T08:00:00",
                vec![for_customer(stop("c", StopStatus::Completed, 3), "c1")],
            ),
        ]);

        let critical = &r.critical_stops[0];
        assert_eq!(critical.frequency, 2);
        assert_eq!(critical.avg_delay_minutes, 30.0);
        assert_eq!(critical.last_delay_date, day(5));
        assert_eq!(critical.customer_name.as_deref(), Some("Customer c1"));
    }

    #[test]
    fn test_customer_performance() {
        let stops = vec![
            for_customer(stop("a", StopStatus::Completed, 0), "big"),
            for_customer(stop("b", StopStatus::Completed, 30), "big"),
            for_customer(stop("c", StopStatus::Completed, 10), "big"),
            for_customer(stop("d", StopStatus::Completed, 2), "small"),
        ];
        let r = report(&[journey("j1", "2024-03-02T08:00:00", stops)]);

        let big = &r.customer_performance[0];
        assert_eq!(big.customer_id, "big");
        assert_eq!(big.deliveries, 3);
        assert!((big.on_time_rate_pct - 66.666).abs() < 0.01);
        assert_eq!(big.avg_delay_minutes, 20.0);
        assert_eq!(r.customer_performance[1].customer_id, "small");
    }

    #[test]
    fn test_most_delayed_routes_and_drivers() {
        let mut j1 = journey(
            "j1",
            "2024-03-02T08:00:00",
            vec![
                stop("a", StopStatus::Completed, 10),
                stop("b", StopStatus::Completed, 30),
                stop("c", StopStatus::Completed, -4),
            ],
        );
        j1.route_id = Some("r1".to_string());
        j1.route_name = Some("North".to_string());
        j1.driver_id = Some("d1".to_string());

        let mut j2 = journey("j2", "2024-03-03T08:00:00", vec![stop("d", StopStatus::Completed, 50)]);
        j2.route_id = Some("r2".to_string());
        j2.driver_id = Some("d1".to_string());

        let r = report(&[j1, j2]);

        assert_eq!(r.most_delayed_routes.len(), 2);
        assert_eq!(r.most_delayed_routes[0].id, "r2");
        assert_eq!(r.most_delayed_routes[1].id, "r1");
        assert_eq!(r.most_delayed_routes[1].name.as_deref(), Some("North"));
        assert_eq!(r.most_delayed_routes[1].total_delay_minutes, 40);
        assert_eq!(r.most_delayed_routes[1].occurrences, 2);
        assert_eq!(r.most_delayed_routes[1].avg_delay_minutes, 20.0);

        assert_eq!(r.most_delayed_drivers.len(), 1);
        assert_eq!(r.most_delayed_drivers[0].total_delay_minutes, 90);
        assert_eq!(r.most_delayed_drivers[0].occurrences, 3);
    }

    #[test]
    fn test_offender_list_is_capped() {
        let journeys: Vec<Journey> = (0..14)
            .map(|i| {
                let mut j = journey(
                    &format!("j{}", i),
                    "2024-03-02T08:00:00",
                    vec![stop("a", StopStatus::Completed, i + 1)],
                );
                j.route_id = Some(format!("r{:02}", i));
                j
            })
            .collect();

        let r = report(&journeys);
        assert_eq!(r.most_delayed_routes.len(), 10);
        assert_eq!(r.most_delayed_routes[0].id, "r13");

        let tight = Thresholds {
            top_offenders: 3,
            ..Default::default()
        };
        let r = build_fleet_report(&journeys, day(1), day(7), &tight).unwrap();
        assert_eq!(r.most_delayed_routes.len(), 3);
    }

    #[test]
    fn test_delay_by_hour_only_emits_delayed_hours() {
        let mut a = stop("a", StopStatus::Completed, 12);
        a.check_in_time = parse_timestamp("2024-03-02T09:10:00");
        a.check_out_time = parse_timestamp("2024-03-02T09:20:00");
        let mut b = stop("b", StopStatus::Completed, 0);
        b.check_in_time = parse_timestamp("2024-03-02T10:10:00");
        b.check_out_time = parse_timestamp("2024-03-02T10:20:00");
        let mut c = stop("c", StopStatus::InProgress, 8);
        c.check_in_time = parse_timestamp("2024-03-02T09:50:00");

        let r = report(&[journey("j1", "2024-03-02T08:00:00", vec![a, b, c])]);
        assert_eq!(
            r.delay_by_hour,
            vec![HourlyDelay {
                hour: 9,
                delayed_stop_count: 2,
                avg_delay_minutes: 10.0
            }]
        );
    }

    #[test]
    fn test_window_and_exclusion_filters() {
        let mut excluded = stop("x", StopStatus::Completed, 99);
        excluded.order = 0;
        let inside = journey(
            "in",
            "2024-03-07T23:00:00",
            vec![stop("a", StopStatus::Completed, 1), excluded],
        );
        let outside = journey("out", "2024-03-08T00:30:00", vec![stop("b", StopStatus::Completed, 1)]);
        let mut unstarted = journey("new", "2024-03-02T08:00:00", vec![stop("c", StopStatus::Pending, 0)]);
        unstarted.started_at = None;

        let r = report(&[inside, outside, unstarted]);
        assert_eq!(r.summary.journeys, 1);
        assert_eq!(r.summary.stops, 1);
        assert_eq!(r.delivery_trend.len(), 1);
        assert_eq!(r.delivery_trend[0].date, day(7));
    }

    #[test]
    fn test_invalid_stop_is_rejected() {
        let mut bad = stop("a", StopStatus::Completed, 0);
        bad.check_out_time = parse_timestamp("2024-03-02T09:00:00");
        let err = build_fleet_report(
            &[journey("j1", "2024-03-02T08:00:00", vec![bad])],
            day(1),
            day(7),
            &Thresholds::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ContractError::CheckOutWithoutCheckIn { .. }));
    }

    #[test]
    fn test_huge_reported_delays_saturate() {
        let mut j = journey(
            "j1",
            "2024-03-02T08:00:00",
            vec![
                for_customer(stop("a", StopStatus::Completed, i64::MAX), "c1"),
                for_customer(stop("b", StopStatus::Completed, i64::MAX), "c1"),
            ],
        );
        j.route_id = Some("r1".to_string());
        j.driver_id = Some("d1".to_string());

        let r = report(&[j]);

        assert_eq!(r.summary.delayed_stops, 2);
        assert_eq!(r.summary.avg_delay_minutes, i64::MAX as f64);
        assert_eq!(r.delay_reasons.len(), 1);
        assert_eq!(r.delay_reasons[0].total_minutes, i64::MAX);
        assert_eq!(r.delay_reasons[0].pct, 100.0);
        assert_eq!(r.most_delayed_routes[0].total_delay_minutes, i64::MAX);
        assert_eq!(r.most_delayed_drivers[0].total_delay_minutes, i64::MAX);
        assert_eq!(r.critical_stops[0].frequency, 2);
        assert_eq!(r.customer_performance[0].avg_delay_minutes, i64::MAX as f64);
    }

    #[test]
    fn test_report_is_idempotent() {
        let journeys = vec![
            journey(
                "j1",
                "2024-03-02T08:00:00",
                vec![
                    for_customer(stop("a", StopStatus::Completed, 25), "c1"),
                    for_customer(stop("b", StopStatus::Failed, 3), "c2"),
                ],
            ),
            journey(
                "j2",
                "2024-03-04T08:00:00",
                vec![for_customer(stop("c", StopStatus::Completed, -2), "c1")],
            ),
        ];

        let first = serde_json::to_string(&report(&journeys)).unwrap();
        let second = serde_json::to_string(&report(&journeys)).unwrap();
        assert_eq!(first, second);
    }
}
