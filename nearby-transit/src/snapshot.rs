//! Input snapshots and their load state.
//!
//! Each upstream source hands over a complete snapshot. A source that has
//! not delivered anything yet is [`Loadable::Loading`], which is distinct
//! from a loaded-but-empty snapshot.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::domain::{
    Alert, AlertId, Line, LineId, Prediction, PredictionId, Route, RouteId, RoutePattern,
    RoutePatternId, Schedule, Stop, StopId, Trip, TripId, Vehicle, VehicleId,
};

/// A snapshot that may not have arrived yet.
#[derive(Debug, Clone, PartialEq)]
pub enum Loadable<T> {
    Loading,
    Loaded(T),
}

/// Coarse state of a [`Loadable`], distinguishing loaded-and-empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    Empty,
    Loaded,
}

/// Snapshots that can report whether they carry any records.
pub trait SnapshotContents {
    fn is_empty(&self) -> bool;
}

impl<T> Loadable<T> {
    pub fn loaded(&self) -> Option<&T> {
        match self {
            Loadable::Loading => None,
            Loadable::Loaded(t) => Some(t),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Loadable::Loading)
    }
}

impl<T: SnapshotContents> Loadable<T> {
    pub fn state(&self) -> LoadState {
        match self {
            Loadable::Loading => LoadState::Loading,
            Loadable::Loaded(t) if t.is_empty() => LoadState::Empty,
            Loadable::Loaded(_) => LoadState::Loaded,
        }
    }
}

impl<T> From<Option<T>> for Loadable<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Loadable::Loading, Loadable::Loaded)
    }
}

/// Static reference data, loaded once and immutable afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceSnapshot {
    #[serde(default)]
    pub routes: BTreeMap<RouteId, Route>,
    #[serde(default)]
    pub lines: BTreeMap<LineId, Line>,
    #[serde(default)]
    pub route_patterns: BTreeMap<RoutePatternId, RoutePattern>,
    #[serde(default)]
    pub trips: BTreeMap<TripId, Trip>,
    #[serde(default)]
    pub stops: BTreeMap<StopId, Stop>,
}

/// Today's timetable for a set of stops.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSnapshot {
    #[serde(default)]
    pub schedules: Vec<Schedule>,
    #[serde(default)]
    pub trips: BTreeMap<TripId, Trip>,
}

impl ScheduleSnapshot {
    /// Route patterns with at least one scheduled trip in this snapshot.
    pub fn scheduled_pattern_ids(&self) -> BTreeSet<RoutePatternId> {
        self.schedules
            .iter()
            .filter_map(|s| self.trips.get(&s.trip_id))
            .filter_map(|t| t.route_pattern_id.clone())
            .collect()
    }
}

impl SnapshotContents for ScheduleSnapshot {
    fn is_empty(&self) -> bool {
        self.schedules.is_empty()
    }
}

/// The current complete set of streamed predictions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionSnapshot {
    #[serde(default)]
    pub predictions: BTreeMap<PredictionId, Prediction>,
    #[serde(default)]
    pub trips: BTreeMap<TripId, Trip>,
    #[serde(default)]
    pub vehicles: BTreeMap<VehicleId, Vehicle>,
}

impl SnapshotContents for PredictionSnapshot {
    fn is_empty(&self) -> bool {
        self.predictions.is_empty()
    }
}

/// The current complete set of streamed alerts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertSnapshot {
    #[serde(default)]
    pub alerts: BTreeMap<AlertId, Alert>,
}

impl SnapshotContents for AlertSnapshot {
    fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tri_state() {
        let loading: Loadable<AlertSnapshot> = Loadable::Loading;
        assert_eq!(loading.state(), LoadState::Loading);

        let empty = Loadable::Loaded(AlertSnapshot::default());
        assert_eq!(empty.state(), LoadState::Empty);
        assert!(!empty.is_loading());
    }

    #[test]
    fn from_option() {
        let absent: Loadable<ScheduleSnapshot> = None.into();
        assert!(absent.is_loading());

        let present: Loadable<ScheduleSnapshot> = Some(ScheduleSnapshot::default()).into();
        assert!(present.loaded().is_some());
    }

    #[test]
    fn scheduled_patterns_follow_trips() {
        let json = r#"{
            "schedules": [
                {"trip_id": "t1", "stop_id": "s1", "stop_sequence": 1, "route_id": "r1"},
                {"trip_id": "t2", "stop_id": "s1", "stop_sequence": 1, "route_id": "r1"},
                {"trip_id": "missing", "stop_id": "s1", "stop_sequence": 1, "route_id": "r1"}
            ],
            "trips": {
                "t1": {"id": "t1", "route_id": "r1", "direction_id": 0, "route_pattern_id": "p1"},
                "t2": {"id": "t2", "route_id": "r1", "direction_id": 0}
            }
        }"#;
        let snapshot: ScheduleSnapshot = serde_json::from_str(json).unwrap();
        let ids: Vec<_> = snapshot.scheduled_pattern_ids().into_iter().collect();

        assert_eq!(ids, vec![RoutePatternId::new("p1")]);
        assert_eq!(
            Loadable::Loaded(snapshot).state(),
            LoadState::Loaded
        );
    }
}
