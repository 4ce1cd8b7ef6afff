//! Live predictions and vehicle positions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{PredictionId, RouteId, StopId, StopTimes, TripId, VehicleId};

/// How a predicted call relates to the timetable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleRelationship {
    #[default]
    Scheduled,
    Added,
    Cancelled,
    Skipped,
    NoData,
    Unscheduled,
}

/// A real-time estimate for one call of a trip at a stop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub id: PredictionId,
    pub trip_id: TripId,
    pub stop_id: StopId,
    pub stop_sequence: u32,
    pub route_id: RouteId,
    #[serde(default)]
    pub arrival_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub departure_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub schedule_relationship: ScheduleRelationship,
    /// Free-text override such as "Delayed" or "Stopped 2 stops away".
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub vehicle_id: Option<VehicleId>,
}

impl Prediction {
    pub fn is_cancelled(&self) -> bool {
        self.schedule_relationship == ScheduleRelationship::Cancelled
    }

    /// The vehicle is standing at the stop: its arrival is past and its
    /// departure is not.
    pub fn has_arrived_but_not_departed(&self, now: DateTime<Utc>) -> bool {
        match (self.arrival_time, self.departure_time) {
            (Some(arrival), Some(departure)) => arrival <= now && now <= departure,
            _ => false,
        }
    }
}

impl StopTimes for Prediction {
    fn arrival_time(&self) -> Option<DateTime<Utc>> {
        self.arrival_time
    }

    fn departure_time(&self) -> Option<DateTime<Utc>> {
        self.departure_time
    }
}

/// Where a vehicle is relative to its current stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurrentStatus {
    IncomingAt,
    StoppedAt,
    InTransitTo,
}

/// Latest known state of a vehicle. Replaced wholesale on every update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: VehicleId,
    pub current_status: CurrentStatus,
    #[serde(default)]
    pub stop_id: Option<StopId>,
    #[serde(default)]
    pub trip_id: Option<TripId>,
}
