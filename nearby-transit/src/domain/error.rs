//! Domain error types.
//!
//! These represent invariant violations in live feed data: records that
//! cannot be displayed without guessing. Missing or not-yet-loaded data is
//! never an error.

use super::{StopId, TripId};

/// Invariant violations detected while merging live data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// A trip occurrence needs at least a schedule or a prediction
    #[error("trip {0} has neither a schedule nor a prediction")]
    MissingScheduleAndPrediction(TripId),

    /// The schedule and prediction describe different calls of the trip
    #[error("trip {trip_id}: schedule stop sequence {schedule} != prediction stop sequence {prediction}")]
    StopSequenceMismatch {
        trip_id: TripId,
        schedule: u32,
        prediction: u32,
    },

    /// Two predictions claim the same call of a trip
    #[error("duplicate prediction for trip {trip_id} at stop {stop_id} (sequence {stop_sequence})")]
    DuplicatePrediction {
        trip_id: TripId,
        stop_id: StopId,
        stop_sequence: u32,
    },
}
