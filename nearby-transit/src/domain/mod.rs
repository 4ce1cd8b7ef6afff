//! Domain types for nearby transit.
//!
//! Reference records (routes, lines, stops, patterns, trips) are immutable
//! for the lifetime of a reference snapshot. Live records (schedules,
//! predictions, vehicles, alerts) are replaced wholesale on every update.

mod alert;
mod error;
mod ids;
mod pattern;
mod prediction;
mod route;
mod schedule;
mod stop;

pub use alert::{
    ActivePeriod, Activity, Alert, AlertSignificance, Cause, Effect, EntityQuery, InformedEntity,
    Lifecycle, StopAlertState,
};
pub use error::DomainError;
pub use ids::{AlertId, LineId, PredictionId, RouteId, RoutePatternId, StopId, TripId, VehicleId};
pub use pattern::{RoutePattern, Trip, Typicality};
pub use prediction::{CurrentStatus, Prediction, ScheduleRelationship, Vehicle};
pub use route::{Line, Route, RouteType};
pub use schedule::{Schedule, StopEdgeType, StopTimes};
pub use stop::{Position, Stop};
