use crate::error::ContractError;
use crate::model::status::JourneyStatus;
use crate::model::stop::Stop;
use crate::time::de_opt_timestamp;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverRef {
    pub id: Option<String>,
    pub full_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteRef {
    pub id: Option<String>,
    pub name: Option<String>,
}

/// One execution of a route by a driver and vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Journey {
    pub id: String,
    pub status: JourneyStatus,

    #[serde(default, deserialize_with = "de_opt_timestamp")]
    pub started_at: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "de_opt_timestamp")]
    pub completed_at: Option<NaiveDateTime>,
    pub total_distance: Option<f64>,
    /// Planned duration in minutes.
    pub total_duration: Option<f64>,

    /// Visitation order.
    #[serde(default)]
    pub stops: Vec<Stop>,
    #[serde(default)]
    pub needs_reoptimization: bool,

    pub route_id: Option<String>,
    pub route_name: Option<String>,
    pub route: Option<RouteRef>,
    pub driver_id: Option<String>,
    pub driver_name: Option<String>,
    pub driver: Option<DriverRef>,
    pub vehicle_id: Option<String>,
    pub vehicle_plate: Option<String>,
}

impl Journey {
    pub fn new(id: impl Into<String>, status: JourneyStatus) -> Self {
        Self {
            id: id.into(),
            status,
            started_at: None,
            completed_at: None,
            total_distance: None,
            total_duration: None,
            stops: Vec::new(),
            needs_reoptimization: false,
            route_id: None,
            route_name: None,
            route: None,
            driver_id: None,
            driver_name: None,
            driver: None,
            vehicle_id: None,
            vehicle_plate: None,
        }
    }

    /// Stops on the active route; the only ones counted toward progress and SLA.
    pub fn normal_stops(&self) -> impl Iterator<Item = &Stop> {
        self.stops.iter().filter(|s| !s.is_excluded_from_route())
    }

    /// Stops pulled from the route, kept for audit display.
    pub fn excluded_stops(&self) -> impl Iterator<Item = &Stop> {
        self.stops.iter().filter(|s| s.is_excluded_from_route())
    }

    /// Calendar day the journey is reported under.
    pub fn service_date(&self) -> Option<NaiveDate> {
        self.started_at.map(|ts| ts.date())
    }

    pub fn validate(&self) -> Result<(), ContractError> {
        self.stops.iter().try_for_each(|s| s.validate(&self.id))
    }
}
