//! Status vocabularies for stops and journeys.
//!
//! Producers are inconsistent about casing (`Completed`, `completed`,
//! `COMPLETED`, `IN_PROGRESS`, `inProgress`), so every status is normalized
//! once here and compared as an enum everywhere else.

use crate::error::ContractError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

fn normalize(value: &str) -> String {
    value
        .trim()
        .chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Lifecycle of a single stop.
///
/// ```text
/// Pending -> InProgress -> Completed
///                       -> Failed
/// Pending -> Skipped
/// ```
///
/// Nothing moves backwards.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum StopStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Failed,
    Skipped,
}

impl StopStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Skipped)
    }

    /// Completed or failed: the stop was attempted and closed.
    pub fn is_processed(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Whether a real-world check-in may exist for a stop in this state.
    pub fn admits_check_in(self) -> bool {
        matches!(self, Self::InProgress | Self::Completed | Self::Failed)
    }

    /// Whether a real-world check-out may exist for a stop in this state.
    pub fn admits_check_out(self) -> bool {
        self.is_processed()
    }

    pub fn can_transition_to(self, next: StopStatus) -> bool {
        use StopStatus::*;
        matches!(
            (self, next),
            (Pending, InProgress) | (Pending, Skipped) | (InProgress, Completed) | (InProgress, Failed)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }
}

impl FromStr for StopStatus {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "pending" => Ok(Self::Pending),
            "inprogress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "skipped" => Ok(Self::Skipped),
            _ => Err(ContractError::UnknownStatus {
                kind: "stop",
                value: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for StopStatus {
    type Error = ContractError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for StopStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of a journey as reported by dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum JourneyStatus {
    Preparing,
    Planned,
    Started,
    InProgress,
    Completed,
    Cancelled,
}

impl JourneyStatus {
    /// The vehicle is on the road.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Started | Self::InProgress)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Preparing => "preparing",
            Self::Planned => "planned",
            Self::Started => "started",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl FromStr for JourneyStatus {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "preparing" => Ok(Self::Preparing),
            "planned" => Ok(Self::Planned),
            "started" => Ok(Self::Started),
            "inprogress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            _ => Err(ContractError::UnknownStatus {
                kind: "journey",
                value: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for JourneyStatus {
    type Error = ContractError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for JourneyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a stop ran late, as picked by the driver.
///
/// Reason codes are optional and free-form upstream, so unknown text falls
/// into `Other` instead of failing the whole journey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum DelayReasonCategory {
    Traffic,
    CustomerNotReady,
    VehicleIssue,
    Weather,
    UnloadingDelay,
    RouteChange,
    AccidentArea,
    BreakTime,
    Other,
}

impl From<String> for DelayReasonCategory {
    fn from(value: String) -> Self {
        match normalize(&value).as_str() {
            "traffic" => Self::Traffic,
            "customernotready" => Self::CustomerNotReady,
            "vehicleissue" => Self::VehicleIssue,
            "weather" => Self::Weather,
            "unloadingdelay" => Self::UnloadingDelay,
            "routechange" => Self::RouteChange,
            "accidentarea" => Self::AccidentArea,
            "breaktime" => Self::BreakTime,
            _ => Self::Other,
        }
    }
}
