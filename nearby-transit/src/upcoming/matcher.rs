//! Join schedules and predictions into upcoming trips, then hand them out
//! to the leaves of a static hierarchy.

use std::collections::BTreeMap;
use std::ops::AddAssign;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use super::trip::UpcomingTrip;
use crate::domain::{
    DomainError, Prediction, Schedule, StopId, StopTimes, Trip, TripId, Vehicle,
};
use crate::hierarchy::{LeafGrouping, StaticLeaf, StaticStop};
use crate::reference::ReferenceIndex;
use crate::snapshot::{Loadable, PredictionSnapshot, ScheduleSnapshot};

/// Feed records dropped while matching.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SkipCounts {
    /// Records naming a trip that no snapshot knows about.
    pub unknown_trips: usize,
    /// Records dropped because they broke an invariant.
    pub invalid: usize,
}

impl SkipCounts {
    pub fn total(&self) -> usize {
        self.unknown_trips + self.invalid
    }
}

impl AddAssign for SkipCounts {
    fn add_assign(&mut self, other: Self) {
        self.unknown_trips += other.unknown_trips;
        self.invalid += other.invalid;
    }
}

/// One occurrence: trip, grouping stop, stop sequence.
type OccurrenceKey = (TripId, StopId, u32);

#[derive(Default)]
struct Occurrence {
    schedule: Option<Schedule>,
    prediction: Option<Prediction>,
}

/// All trip occurrences found in the current snapshots.
#[derive(Debug, Clone, Default)]
pub struct MatchedTrips {
    /// Sorted by [`UpcomingTrip::cmp_by_time`].
    upcoming: Vec<UpcomingTrip>,
    /// Schedule-only occurrences that already happened today.
    departed: Vec<UpcomingTrip>,
    schedules_loaded: bool,
    predictions_loaded: bool,
    pub skipped: SkipCounts,
}

/// Trips assigned to one leaf.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeafTrips {
    pub trips: Vec<UpcomingTrip>,
    /// Whether the leaf has any scheduled service today, including
    /// service that has already run.
    pub has_schedules_today: bool,
}

/// Merge both snapshots into trip occurrences.
///
/// Schedules and predictions are paired on trip id, grouping stop and stop
/// sequence, so a prediction at a platform pairs with a schedule at the
/// parent station. A snapshot that is still loading contributes nothing.
pub fn match_trips(
    index: &ReferenceIndex,
    schedules: &Loadable<ScheduleSnapshot>,
    predictions: &Loadable<PredictionSnapshot>,
    now: DateTime<Utc>,
) -> MatchedTrips {
    let mut occurrences: BTreeMap<OccurrenceKey, Occurrence> = BTreeMap::new();
    let mut skipped = SkipCounts::default();

    if let Some(snapshot) = schedules.loaded() {
        for schedule in &snapshot.schedules {
            let key = (
                schedule.trip_id.clone(),
                index.parent_id(&schedule.stop_id),
                schedule.stop_sequence,
            );
            let entry = occurrences.entry(key).or_default();
            if entry.schedule.is_some() {
                debug!(trip_id = %schedule.trip_id, stop_id = %schedule.stop_id, "Duplicate schedule ignored");
                continue;
            }
            entry.schedule = Some(schedule.clone());
        }
    }

    if let Some(snapshot) = predictions.loaded() {
        for prediction in snapshot.predictions.values() {
            let key = (
                prediction.trip_id.clone(),
                index.parent_id(&prediction.stop_id),
                prediction.stop_sequence,
            );
            let entry = occurrences.entry(key).or_default();
            if entry.prediction.is_some() {
                let err = DomainError::DuplicatePrediction {
                    trip_id: prediction.trip_id.clone(),
                    stop_id: prediction.stop_id.clone(),
                    stop_sequence: prediction.stop_sequence,
                };
                warn!(prediction_id = %prediction.id, "Dropping prediction: {err}");
                debug_assert!(false, "{err}");
                skipped.invalid += 1;
                continue;
            }
            entry.prediction = Some(prediction.clone());
        }
    }

    let mut upcoming = Vec::new();
    let mut departed = Vec::new();

    for ((trip_id, _, _), occurrence) in occurrences {
        let Some(trip) = find_trip(index, schedules, predictions, &trip_id) else {
            skipped.unknown_trips += 1;
            debug!(trip_id = %trip_id, skipped = skipped.unknown_trips, "Skipping occurrence of unknown trip");
            continue;
        };
        let vehicle = occurrence
            .prediction
            .as_ref()
            .and_then(|p| find_vehicle(predictions, p));

        let schedule_only_past = occurrence.prediction.is_none()
            && occurrence
                .schedule
                .as_ref()
                .and_then(|s| s.stop_time())
                .is_some_and(|time| time < now);

        match UpcomingTrip::new(trip.clone(), occurrence.schedule, occurrence.prediction, vehicle) {
            Ok(trip) if schedule_only_past => departed.push(trip),
            Ok(trip) => upcoming.push(trip),
            Err(err) => {
                warn!(trip_id = %trip_id, "Dropping trip occurrence: {err}");
                debug_assert!(false, "{err}");
                skipped.invalid += 1;
            }
        }
    }

    upcoming.sort_by(UpcomingTrip::cmp_by_time);
    departed.sort_by(UpcomingTrip::cmp_by_time);

    MatchedTrips {
        upcoming,
        departed,
        schedules_loaded: !schedules.is_loading(),
        predictions_loaded: !predictions.is_loading(),
        skipped,
    }
}

fn find_trip<'a>(
    index: &'a ReferenceIndex,
    schedules: &'a Loadable<ScheduleSnapshot>,
    predictions: &'a Loadable<PredictionSnapshot>,
    trip_id: &TripId,
) -> Option<&'a Trip> {
    predictions
        .loaded()
        .and_then(|p| p.trips.get(trip_id))
        .or_else(|| schedules.loaded().and_then(|s| s.trips.get(trip_id)))
        .or_else(|| index.trip(trip_id))
}

fn find_vehicle(
    predictions: &Loadable<PredictionSnapshot>,
    prediction: &Prediction,
) -> Option<Vehicle> {
    let vehicle_id = prediction.vehicle_id.as_ref()?;
    predictions.loaded()?.vehicles.get(vehicle_id).cloned()
}

impl MatchedTrips {
    pub fn upcoming(&self) -> &[UpcomingTrip] {
        &self.upcoming
    }

    pub fn predictions_loaded(&self) -> bool {
        self.predictions_loaded
    }

    pub fn all_loaded(&self) -> bool {
        self.schedules_loaded && self.predictions_loaded
    }

    /// Split the occurrences at one hierarchy stop between its leaves.
    ///
    /// Returns one entry per leaf, in leaf order. Each occurrence goes to
    /// at most one leaf: the leaf holding its route pattern, else the
    /// first headsign leaf of its route with a matching headsign, else the
    /// first direction leaf of its route.
    pub fn for_stop(&self, index: &ReferenceIndex, stop: &StaticStop) -> Vec<LeafTrips> {
        let mut out = vec![LeafTrips::default(); stop.leaves.len()];

        for trip in &self.upcoming {
            if let Some(i) = assign(index, stop, trip) {
                out[i].has_schedules_today |= trip.schedule().is_some();
                out[i].trips.push(trip.clone());
            }
        }
        for trip in &self.departed {
            if let Some(i) = assign(index, stop, trip) {
                out[i].has_schedules_today = true;
            }
        }
        out
    }
}

fn assign(index: &ReferenceIndex, stop: &StaticStop, upcoming: &UpcomingTrip) -> Option<usize> {
    if !stop.stop_ids.contains(upcoming.stop_id()) {
        return None;
    }
    let trip = upcoming.trip();
    let candidates = || {
        stop.leaves.iter().enumerate().filter(|(_, leaf)| {
            leaf.direction_id == trip.direction_id && leaf.route_ids.contains(&trip.route_id)
        })
    };

    // A pattern known to the reference data belongs wherever the builder put it
    if let Some(pattern_id) = trip.route_pattern_id.as_ref()
        && index.pattern(pattern_id).is_some()
    {
        return candidates()
            .find(|(_, leaf)| leaf.has_pattern(pattern_id))
            .map(|(i, _)| i);
    }

    candidates()
        .find(|(_, leaf)| headsign_matches(leaf, upcoming.headsign()))
        .or_else(|| candidates().find(|(_, leaf)| leaf.grouping.is_by_direction()))
        .map(|(i, _)| i)
}

fn headsign_matches(leaf: &StaticLeaf, headsign: &str) -> bool {
    matches!(&leaf.grouping, LeafGrouping::Headsign(h) if h == headsign)
}
