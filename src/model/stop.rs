use crate::error::ContractError;
use crate::model::status::{DelayReasonCategory, StopStatus};
use crate::time::{de_opt_timestamp, parse_clock_minutes};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A proof-of-delivery photo reference. Only its presence matters here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Photo {
    pub url: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

/// Customer reference embedded in a stop.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRef {
    pub id: Option<String>,
    pub name: Option<String>,
}

/// One planned visit within a journey, as sent by the journey-data service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stop {
    pub id: String,
    #[serde(default)]
    pub order: u32,
    #[serde(default)]
    pub is_excluded: bool,
    pub status: StopStatus,

    pub original_estimated_arrival_time: Option<String>,
    pub estimated_arrival_time: Option<String>,
    pub original_estimated_departure_time: Option<String>,
    pub estimated_departure_time: Option<String>,

    #[serde(default, deserialize_with = "de_opt_timestamp")]
    pub check_in_time: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "de_opt_timestamp")]
    pub check_out_time: Option<NaiveDateTime>,

    pub delay_reason_category: Option<DelayReasonCategory>,
    pub delay_reason: Option<String>,
    /// Running delay precomputed upstream. Trusted as-is by fleet reporting.
    pub new_delay: Option<i64>,

    pub receiver_name: Option<String>,
    pub notes: Option<String>,
    pub failure_reason: Option<String>,
    pub signature_url: Option<String>,
    pub photo_url: Option<String>,
    pub photo_base64: Option<String>,
    #[serde(default)]
    pub photos: Vec<Photo>,

    pub customer_id: Option<String>,
    pub customer_name: Option<String>,
    pub customer: Option<CustomerRef>,
}

impl Stop {
    /// Excluded stops were pulled from the active route and are kept only
    /// for audit. They never take part in the state machine.
    pub fn is_excluded_from_route(&self) -> bool {
        self.order == 0 || self.is_excluded
    }

    pub fn original_arrival_minutes(&self) -> Option<i64> {
        self.original_estimated_arrival_time.as_deref().and_then(parse_clock_minutes)
    }

    pub fn estimated_arrival_minutes(&self) -> Option<i64> {
        self.estimated_arrival_time.as_deref().and_then(parse_clock_minutes)
    }

    pub fn original_departure_minutes(&self) -> Option<i64> {
        self.original_estimated_departure_time.as_deref().and_then(parse_clock_minutes)
    }

    pub fn estimated_departure_minutes(&self) -> Option<i64> {
        self.estimated_departure_time.as_deref().and_then(parse_clock_minutes)
    }

    /// Upstream running delay, zero when not reported.
    pub fn reported_delay(&self) -> i64 {
        self.new_delay.unwrap_or(0)
    }

    pub fn validate(&self, journey_id: &str) -> Result<(), ContractError> {
        if self.check_out_time.is_some() && self.check_in_time.is_none() {
            return Err(ContractError::CheckOutWithoutCheckIn {
                journey_id: journey_id.to_string(),
                stop_id: self.id.clone(),
            });
        }

        if self.check_in_time.is_some() && !self.status.admits_check_in() {
            return Err(ContractError::CheckInOnUnvisitedStop {
                journey_id: journey_id.to_string(),
                stop_id: self.id.clone(),
                status: self.status,
            });
        }

        if self.check_out_time.is_some() && !self.status.admits_check_out() {
            return Err(ContractError::CheckOutOnOpenStop {
                journey_id: journey_id.to_string(),
                stop_id: self.id.clone(),
                status: self.status,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::parse_timestamp;

    fn stop(status: StopStatus) -> Stop {
        Stop {
            id: "s1".to_string(),
            order: 1,
            status,
            ..Default::default()
        }
    }

    #[test]
    fn test_deserialize_wire_stop() {
        let json = r#"{
            "id": "s-9",
            "order": 3,
            "status": "COMPLETED",
            "originalEstimatedArrivalTime": "09:00",
            "estimatedArrivalTime": "09:20:00",
            "checkInTime": "2024-03-01T09:12:00Z",
            "checkOutTime": "2024-03-01T09:30:00Z",
            "delayReasonCategory": "traffic",
            "newDelay": 12,
            "photos": [{"url": "a.jpg", "type": "delivery"}]
        }"#;

        let stop: Stop = serde_json::from_str(json).unwrap();
        assert_eq!(stop.status, StopStatus::Completed);
        assert_eq!(stop.original_arrival_minutes(), Some(540));
        assert_eq!(stop.estimated_arrival_minutes(), Some(560));
        assert_eq!(stop.delay_reason_category, Some(DelayReasonCategory::Traffic));
        assert_eq!(stop.photos[0].kind.as_deref(), Some("delivery"));
        assert!(stop.check_out_time.is_some());
        assert!(!stop.is_excluded_from_route());
    }

    #[test]
    fn test_deserialize_rejects_unknown_status() {
        let json = r#"{"id": "s", "order": 1, "status": "teleported"}"#;
        assert!(serde_json::from_str::<Stop>(json).is_err());
    }

    #[test]
    fn test_deserialize_rejects_bad_timestamp() {
        let json = r#"{"id": "s", "order": 1, "status": "completed", "checkInTime": "noon"}"#;
        assert!(serde_json::from_str::<Stop>(json).is_err());
    }

    #[test]
    fn test_excluded_stops() {
        let mut s = stop(StopStatus::Pending);
        s.order = 0;
        assert!(s.is_excluded_from_route());

        let mut s = stop(StopStatus::Pending);
        s.is_excluded = true;
        assert!(s.is_excluded_from_route());
    }

    #[test]
    fn test_validate_checkout_without_checkin() {
        let mut s = stop(StopStatus::Completed);
        s.check_out_time = parse_timestamp("2024-03-01T10:00:00");
        assert!(matches!(
            s.validate("j1"),
            Err(ContractError::CheckOutWithoutCheckIn { .. })
        ));
    }

    #[test]
    fn test_validate_checkin_on_pending_stop() {
        let mut s = stop(StopStatus::Pending);
        s.check_in_time = parse_timestamp("2024-03-01T10:00:00");
        assert!(matches!(
            s.validate("j1"),
            Err(ContractError::CheckInOnUnvisitedStop { .. })
        ));
    }

    #[test]
    fn test_validate_checkout_on_in_progress_stop() {
        let mut s = stop(StopStatus::InProgress);
        s.check_in_time = parse_timestamp("2024-03-01T10:00:00");
        s.check_out_time = parse_timestamp("2024-03-01T10:10:00");
        assert!(matches!(
            s.validate("j1"),
            Err(ContractError::CheckOutOnOpenStop { .. })
        ));
    }

    #[test]
    fn test_validate_accepts_consistent_stop() {
        let mut s = stop(StopStatus::Failed);
        s.check_in_time = parse_timestamp("2024-03-01T10:00:00");
        s.check_out_time = parse_timestamp("2024-03-01T10:10:00");
        assert!(s.validate("j1").is_ok());
        assert!(stop(StopStatus::Pending).validate("j1").is_ok());
    }
}
