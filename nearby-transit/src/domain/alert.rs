//! Service alerts and their significance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AlertId, RouteId, RouteType, StopId, TripId};

/// How strongly an alert should affect what a rider sees.
///
/// Ordered from least to most significant, so `>=` comparisons read
/// naturally when filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSignificance {
    None,
    Minor,
    Accessibility,
    Secondary,
    Major,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
    AccessIssue,
    AdditionalService,
    AmberAlert,
    BikeIssue,
    Cancellation,
    Delay,
    Detour,
    DockClosure,
    DockIssue,
    ElevatorClosure,
    EscalatorClosure,
    ExtraService,
    FacilityIssue,
    ModifiedService,
    NoService,
    OtherEffect,
    ParkingClosure,
    ParkingIssue,
    PolicyChange,
    ScheduleChange,
    ServiceChange,
    Shuttle,
    SnowRoute,
    StationClosure,
    StationIssue,
    StopClosure,
    StopMove,
    StopMoved,
    StopShoveling,
    Summary,
    Suspension,
    TrackChange,
    #[serde(other)]
    UnknownEffect,
}

/// Alert cause. Only the causes that change how an alert is treated are
/// named; everything else collapses into `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cause {
    SingleTracking,
    Construction,
    Maintenance,
    TrackWork,
    SignalProblem,
    MechanicalProblem,
    Weather,
    #[default]
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    #[default]
    New,
    Ongoing,
    OngoingUpcoming,
    Upcoming,
}

/// What a rider is doing when an informed entity applies to them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activity {
    Board,
    BringingBike,
    Exit,
    ParkCar,
    Ride,
    StoreBike,
    UsingEscalator,
    UsingWheelchair,
}

/// Badge shown next to a stop or leaf for an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopAlertState {
    Elevator,
    Shuttle,
    Suspension,
    Issue,
}

/// A window in which an alert is in effect. `end == None` is open-ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivePeriod {
    pub start: DateTime<Utc>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
}

impl ActivePeriod {
    pub fn active_at(&self, instant: DateTime<Utc>) -> bool {
        match self.end {
            None => self.start <= instant,
            Some(end) => self.start <= instant && instant <= end,
        }
    }
}

/// A partial match pattern describing what an alert applies to.
///
/// An unset field matches anything.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InformedEntity {
    #[serde(default)]
    pub activities: Vec<Activity>,
    #[serde(default)]
    pub direction_id: Option<u8>,
    #[serde(default)]
    pub facility: Option<String>,
    #[serde(default)]
    pub route: Option<RouteId>,
    #[serde(default)]
    pub route_type: Option<RouteType>,
    #[serde(default)]
    pub stop: Option<StopId>,
    #[serde(default)]
    pub trip: Option<TripId>,
}

impl InformedEntity {
    /// Check this entity against a set of constraints.
    pub fn satisfies(&self, query: &EntityQuery<'_>) -> bool {
        fn wildcard<T: PartialEq>(entity: Option<&T>, wanted: Option<&T>) -> bool {
            match (entity, wanted) {
                (Some(e), Some(w)) => e == w,
                _ => true,
            }
        }

        if let Some(any_of) = query.activities {
            if !self.activities.iter().any(|a| any_of.contains(a)) {
                return false;
            }
        }
        if !wildcard(self.direction_id.as_ref(), query.direction_id.as_ref()) {
            return false;
        }
        if let (Some(route), Some(routes)) = (&self.route, query.routes) {
            if !routes.contains(route) {
                return false;
            }
        }
        if let (Some(stop), Some(stops)) = (&self.stop, query.stops) {
            if !stops.iter().any(|s| s == stop) {
                return false;
            }
        }
        wildcard(self.trip.as_ref(), query.trip)
    }
}

/// Constraints for [`InformedEntity::satisfies`].
///
/// A `None` constraint is not checked. Where a constraint is set but the
/// entity leaves the field empty, the entity still matches.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntityQuery<'a> {
    /// The entity must list at least one of these activities.
    pub activities: Option<&'a [Activity]>,
    pub direction_id: Option<u8>,
    pub routes: Option<&'a [RouteId]>,
    pub stops: Option<&'a [StopId]>,
    pub trip: Option<&'a TripId>,
}

/// A service alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: AlertId,
    pub active_period: Vec<ActivePeriod>,
    #[serde(default)]
    pub cause: Cause,
    #[serde(default = "unknown_effect")]
    pub effect: Effect,
    #[serde(default)]
    pub header: Option<String>,
    pub informed_entity: Vec<InformedEntity>,
    #[serde(default)]
    pub lifecycle: Lifecycle,
    #[serde(default)]
    pub severity: i32,
}

fn unknown_effect() -> Effect {
    Effect::UnknownEffect
}

impl Alert {
    pub fn is_active(&self, instant: DateTime<Utc>) -> bool {
        self.active_period.iter().any(|p| p.active_at(instant))
    }

    /// Every informed entity names a stop.
    pub fn has_stops_specified(&self) -> bool {
        self.informed_entity.iter().all(|e| e.stop.is_some())
    }

    /// Riders cannot travel through the affected area on the regular service.
    pub fn has_no_through_service(&self) -> bool {
        matches!(self.effect, Effect::Shuttle | Effect::Suspension)
    }

    pub fn any_entity_satisfies(&self, query: &EntityQuery<'_>) -> bool {
        self.informed_entity.iter().any(|e| e.satisfies(query))
    }

    pub fn significance(&self) -> AlertSignificance {
        match self.effect {
            Effect::Shuttle | Effect::Suspension => AlertSignificance::Major,
            Effect::StationClosure
            | Effect::StopClosure
            | Effect::DockClosure
            | Effect::Detour
            | Effect::SnowRoute => {
                if self.has_stops_specified() {
                    AlertSignificance::Major
                } else {
                    AlertSignificance::Secondary
                }
            }
            Effect::ServiceChange => AlertSignificance::Secondary,
            Effect::ElevatorClosure => AlertSignificance::Accessibility,
            Effect::TrackChange => AlertSignificance::Minor,
            Effect::Delay => {
                let off_bus = self
                    .informed_entity
                    .iter()
                    .any(|e| e.route_type != Some(RouteType::Bus));
                if (self.severity >= 3 && off_bus) || self.cause == Cause::SingleTracking {
                    AlertSignificance::Minor
                } else {
                    AlertSignificance::None
                }
            }
            _ => AlertSignificance::None,
        }
    }

    pub fn stop_alert_state(&self) -> StopAlertState {
        match self.effect {
            Effect::ElevatorClosure => StopAlertState::Elevator,
            Effect::Shuttle => StopAlertState::Shuttle,
            Effect::Suspension
            | Effect::StationClosure
            | Effect::StopClosure
            | Effect::DockClosure => StopAlertState::Suspension,
            _ => StopAlertState::Issue,
        }
    }
}
