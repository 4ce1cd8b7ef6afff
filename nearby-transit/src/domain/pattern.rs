//! Route patterns and trips.

use serde::{Deserialize, Serialize};

use super::{RouteId, RoutePatternId, StopId, TripId};

/// How routinely a route pattern runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Typicality {
    Typical,
    Deviation,
    Atypical,
    Diversion,
    CanonicalOnly,
}

/// A canonical path variant of a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutePattern {
    pub id: RoutePatternId,
    pub route_id: RouteId,
    pub direction_id: u8,
    pub sort_order: i32,
    /// `None` when the feed gave a value we do not recognise.
    #[serde(default, deserialize_with = "lenient_typicality")]
    pub typicality: Option<Typicality>,
    pub representative_trip_id: TripId,
    #[serde(default)]
    pub name: String,
}

impl RoutePattern {
    /// Whether the pattern is shown even without upcoming service.
    ///
    /// Unknown typicality counts as typical so that service is never hidden
    /// just because the feed grew a new category.
    pub fn is_typical(&self) -> bool {
        matches!(self.typicality, None | Some(Typicality::Typical))
    }
}

fn lenient_typicality<'de, D>(deserializer: D) -> Result<Option<Typicality>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.and_then(|v| serde_json::from_value(v).ok()))
}

/// A single scheduled journey of a vehicle along a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    pub id: TripId,
    pub route_id: RouteId,
    pub direction_id: u8,
    #[serde(default)]
    pub headsign: String,
    #[serde(default)]
    pub route_pattern_id: Option<RoutePatternId>,
    #[serde(default)]
    pub stop_ids: Option<Vec<StopId>>,
}
