//! JSON decoder for journey snapshots.

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::Journey;

#[derive(Deserialize)]
#[serde(untagged)]
enum Snapshot {
    List(Vec<Journey>),
    Wrapped { journeys: Vec<Journey> },
}

/// Decodes and validates a journey snapshot.
///
/// Accepts either a bare JSON array of journeys or `{"journeys": [...]}`.
///
/// # Errors
///
/// Returns an error if the bytes are not valid JSON for the journey wire
/// contract (including unknown status values), or if any stop violates the
/// check-in/check-out contract.
pub fn parse_journeys(bytes: &[u8]) -> Result<Vec<Journey>> {
    let journeys = match serde_json::from_slice::<Snapshot>(bytes) {
        Ok(Snapshot::List(journeys)) | Ok(Snapshot::Wrapped { journeys }) => journeys,
        // Untagged enums hide the real cause; decode again for a useful message.
        Err(_) => serde_json::from_slice::<Vec<Journey>>(bytes)
            .context("journey snapshot is not valid JSON for the journey contract")?,
    };

    for journey in &journeys {
        journey.validate()?;
    }

    Ok(journeys)
}
