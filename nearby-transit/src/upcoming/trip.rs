//! A single trip occurrence at a stop.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use crate::domain::{
    DomainError, Prediction, Schedule, StopEdgeType, StopId, StopTimes, Trip, Vehicle,
};

/// One trip's call at one stop, merged from its schedule and prediction.
///
/// The time may already be in the past, depending on how recently stale
/// predictions were removed. A prediction with no times (a skipped stop or
/// a dropped trip) still takes precedence over the scheduled time.
#[derive(Debug, Clone, PartialEq)]
pub struct UpcomingTrip {
    trip: Trip,
    stop_id: StopId,
    stop_sequence: u32,
    schedule: Option<Schedule>,
    prediction: Option<Prediction>,
    vehicle: Option<Vehicle>,
}

impl UpcomingTrip {
    /// Merge the parts of one occurrence.
    ///
    /// Fails when there is nothing to merge, or when the schedule and
    /// prediction disagree about which call of the trip this is.
    pub fn new(
        trip: Trip,
        schedule: Option<Schedule>,
        prediction: Option<Prediction>,
        vehicle: Option<Vehicle>,
    ) -> Result<Self, DomainError> {
        // Predictions may name a platform where the schedule names a parent
        let (stop_id, stop_sequence) = match (&schedule, &prediction) {
            (None, None) => return Err(DomainError::MissingScheduleAndPrediction(trip.id)),
            (Some(s), Some(p)) if s.stop_sequence != p.stop_sequence => {
                return Err(DomainError::StopSequenceMismatch {
                    trip_id: trip.id,
                    schedule: s.stop_sequence,
                    prediction: p.stop_sequence,
                });
            }
            (_, Some(p)) => (p.stop_id.clone(), p.stop_sequence),
            (Some(s), None) => (s.stop_id.clone(), s.stop_sequence),
        };
        Ok(Self {
            trip,
            stop_id,
            stop_sequence,
            schedule,
            prediction,
            vehicle,
        })
    }

    pub fn trip(&self) -> &Trip {
        &self.trip
    }

    pub fn schedule(&self) -> Option<&Schedule> {
        self.schedule.as_ref()
    }

    pub fn prediction(&self) -> Option<&Prediction> {
        self.prediction.as_ref()
    }

    pub fn vehicle(&self) -> Option<&Vehicle> {
        self.vehicle.as_ref()
    }

    /// Stable id: trip id and stop sequence.
    pub fn id(&self) -> String {
        format!("{}-{}", self.trip.id, self.stop_sequence())
    }

    /// The stop as reported by the feed, preferring the prediction's.
    pub fn stop_id(&self) -> &StopId {
        &self.stop_id
    }

    pub fn stop_sequence(&self) -> u32 {
        self.stop_sequence
    }

    /// The time used for ordering and display.
    ///
    /// The predicted time, unless the prediction is cancelled or carries
    /// only a status string; then the scheduled time.
    pub fn time(&self) -> Option<DateTime<Utc>> {
        match &self.prediction {
            Some(p) if !p.is_cancelled() && !(p.stop_time().is_none() && p.status.is_some()) => {
                p.stop_time()
            }
            _ => self.schedule.as_ref().and_then(|s| s.stop_time()),
        }
    }

    pub fn headsign(&self) -> &str {
        self.schedule
            .as_ref()
            .and_then(|s| s.stop_headsign.as_deref())
            .unwrap_or(&self.trip.headsign)
    }

    /// A scheduled call the prediction says will not happen.
    pub fn is_cancelled(&self) -> bool {
        let scheduled = self.schedule.as_ref().and_then(|s| s.stop_time()).is_some();
        scheduled && self.prediction.as_ref().is_some_and(Prediction::is_cancelled)
    }

    /// Happening before `cutoff` and either in the future or still at the
    /// stop: the vehicle has not left, or a status is still being shown.
    ///
    /// `cutoff == None` means no horizon.
    pub fn is_upcoming_within(&self, now: DateTime<Utc>, cutoff: Option<DateTime<Utc>>) -> bool {
        let Some(time) = self.time() else {
            return false;
        };
        if cutoff.is_some_and(|c| time >= c) {
            return false;
        }
        if time >= now {
            return true;
        }
        self.prediction.as_ref().is_some_and(|p| {
            let vehicle_here = self
                .vehicle
                .as_ref()
                .and_then(|v| v.stop_id.as_ref())
                .is_some_and(|stop| stop == &p.stop_id);
            vehicle_here || p.status.is_some()
        })
    }

    /// Whether this call only lets riders off.
    ///
    /// `None` when it neither arrives nor departs, e.g. an unscheduled trip
    /// that was cancelled. Such calls must not hide a headsign, and must not
    /// keep one visible either.
    pub fn is_arrival_only(&self) -> Option<bool> {
        let (has_arrival, has_departure) = match (&self.schedule, &self.prediction) {
            (Some(s), _) => (
                s.drop_off_type != StopEdgeType::Unavailable,
                s.pick_up_type != StopEdgeType::Unavailable,
            ),
            (None, Some(p)) => (p.arrival_time.is_some(), p.departure_time.is_some()),
            (None, None) => (false, false),
        };
        if !has_arrival && !has_departure {
            None
        } else {
            Some(!has_departure)
        }
    }

    /// Order by time, absent times last, then by trip id and stop sequence.
    pub fn cmp_by_time(&self, other: &Self) -> Ordering {
        match (self.time(), other.time()) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
        .then_with(|| self.trip.id.cmp(&other.trip.id))
        .then_with(|| self.stop_sequence().cmp(&other.stop_sequence()))
    }
}

/// Every trip that states an edge is arrival-only, and at least one does.
pub fn all_arrival_only(trips: &[UpcomingTrip]) -> bool {
    let mut any_true = false;
    for trip in trips {
        match trip.is_arrival_only() {
            Some(true) => any_true = true,
            Some(false) => return false,
            None => {}
        }
    }
    any_true
}
