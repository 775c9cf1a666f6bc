//! Upstream data contract violations.

use crate::model::StopStatus;

/// A journey or stop that breaks the contract with the journey-data service.
///
/// These are surfaced to the caller rather than coerced: they mean the
/// producer sent something that cannot happen in the real world.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContractError {
    #[error("journey {journey_id}: stop {stop_id} has a check-out without a check-in")]
    CheckOutWithoutCheckIn { journey_id: String, stop_id: String },

    #[error("journey {journey_id}: stop {stop_id} is {status} but has a check-in time")]
    CheckInOnUnvisitedStop {
        journey_id: String,
        stop_id: String,
        status: StopStatus,
    },

    #[error("journey {journey_id}: stop {stop_id} is {status} but has a check-out time")]
    CheckOutOnOpenStop {
        journey_id: String,
        stop_id: String,
        status: StopStatus,
    },

    #[error("unknown {kind} status: {value:?}")]
    UnknownStatus { kind: &'static str, value: String },
}
