//! Display identity resolution for drivers, routes and customers.
//!
//! Upstream records carry the same identity in several shapes. Every view
//! and report resolves through these functions so they agree on the name.
//!
//! Priority orders:
//! - driver: `driver.fullName`, `driver.firstName + driver.lastName`,
//!   `driver.name`, `driverName`, then the driver id.
//! - route: `route.name`, `routeName`, then the route id.
//! - customer: `customer.name`, `customerName`, then the customer id.

use crate::model::{Journey, Stop};

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

pub fn driver_id(journey: &Journey) -> Option<&str> {
    non_empty(journey.driver_id.as_deref())
        .or_else(|| non_empty(journey.driver.as_ref().and_then(|d| d.id.as_deref())))
}

pub fn driver_name(journey: &Journey) -> Option<String> {
    if let Some(driver) = &journey.driver {
        if let Some(full) = non_empty(driver.full_name.as_deref()) {
            return Some(full.to_string());
        }

        let parts: Vec<&str> = [driver.first_name.as_deref(), driver.last_name.as_deref()]
            .into_iter()
            .filter_map(non_empty)
            .collect();
        if !parts.is_empty() {
            return Some(parts.join(" "));
        }

        if let Some(name) = non_empty(driver.name.as_deref()) {
            return Some(name.to_string());
        }
    }

    non_empty(journey.driver_name.as_deref())
        .or_else(|| driver_id(journey))
        .map(str::to_string)
}

pub fn route_id(journey: &Journey) -> Option<&str> {
    non_empty(journey.route_id.as_deref())
        .or_else(|| non_empty(journey.route.as_ref().and_then(|r| r.id.as_deref())))
}

pub fn route_name(journey: &Journey) -> Option<String> {
    non_empty(journey.route.as_ref().and_then(|r| r.name.as_deref()))
        .or_else(|| non_empty(journey.route_name.as_deref()))
        .or_else(|| route_id(journey))
        .map(str::to_string)
}

pub fn customer_id(stop: &Stop) -> Option<&str> {
    non_empty(stop.customer_id.as_deref())
        .or_else(|| non_empty(stop.customer.as_ref().and_then(|c| c.id.as_deref())))
}

pub fn customer_name(stop: &Stop) -> Option<String> {
    non_empty(stop.customer.as_ref().and_then(|c| c.name.as_deref()))
        .or_else(|| non_empty(stop.customer_name.as_deref()))
        .or_else(|| customer_id(stop))
        .map(str::to_string)
}
