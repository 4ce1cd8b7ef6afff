//! Timetabled stop times.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{RouteId, StopId, TripId};

/// Arrival and departure times shared by schedules and predictions.
pub trait StopTimes {
    fn arrival_time(&self) -> Option<DateTime<Utc>>;
    fn departure_time(&self) -> Option<DateTime<Utc>>;

    /// Arrival if known, else departure.
    fn stop_time(&self) -> Option<DateTime<Utc>> {
        self.arrival_time().or(self.departure_time())
    }

    /// Like [`stop_time`](Self::stop_time), but once the arrival is in the
    /// past the departure is the more relevant instant.
    fn stop_time_after(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match (self.arrival_time(), self.departure_time()) {
            (Some(arrival), Some(departure)) if arrival < now => Some(departure),
            _ => self.stop_time(),
        }
    }
}

/// Whether riders may board or alight at a scheduled stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopEdgeType {
    #[default]
    Regular,
    Unavailable,
    CallAgency,
    CoordinateWithDriver,
}

/// One timetabled call of a trip at a stop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub trip_id: TripId,
    pub stop_id: StopId,
    pub stop_sequence: u32,
    pub route_id: RouteId,
    #[serde(default)]
    pub arrival_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub departure_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub pick_up_type: StopEdgeType,
    #[serde(default)]
    pub drop_off_type: StopEdgeType,
    /// Overrides the trip headsign at this stop.
    #[serde(default)]
    pub stop_headsign: Option<String>,
}

impl StopTimes for Schedule {
    fn arrival_time(&self) -> Option<DateTime<Utc>> {
        self.arrival_time
    }

    fn departure_time(&self) -> Option<DateTime<Utc>> {
        self.departure_time
    }
}
