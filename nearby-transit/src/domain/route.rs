//! Routes, lines and transit modes.

use serde::{Deserialize, Serialize};

use super::{LineId, RouteId};

/// Transit mode of a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteType {
    LightRail,
    HeavyRail,
    CommuterRail,
    Bus,
    Ferry,
}

impl RouteType {
    /// Light and heavy rail. Subway service is expected to have live
    /// predictions, so schedule-only data is never displayed for it.
    pub fn is_subway(self) -> bool {
        matches!(self, RouteType::LightRail | RouteType::HeavyRail)
    }
}

/// A route as published in the reference snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub id: RouteId,
    #[serde(rename = "type")]
    pub route_type: RouteType,
    pub sort_order: i32,
    #[serde(default)]
    pub short_name: String,
    #[serde(default)]
    pub long_name: String,
    /// Indexed by direction id (0 or 1).
    #[serde(default)]
    pub direction_names: [Option<String>; 2],
    /// Indexed by direction id (0 or 1).
    #[serde(default)]
    pub direction_destinations: [Option<String>; 2],
    #[serde(default)]
    pub line_id: Option<LineId>,
    /// Temporary replacement service for a disrupted route.
    #[serde(default)]
    pub is_shuttle: bool,
}

impl Route {
    pub fn direction_name(&self, direction_id: u8) -> Option<&str> {
        self.direction_names
            .get(usize::from(direction_id))
            .and_then(|n| n.as_deref())
    }

    pub fn direction_destination(&self, direction_id: u8) -> Option<&str> {
        self.direction_destinations
            .get(usize::from(direction_id))
            .and_then(|d| d.as_deref())
    }

    /// Display name: the short name when present, else the long name.
    pub fn label(&self) -> &str {
        if self.short_name.is_empty() {
            &self.long_name
        } else {
            &self.short_name
        }
    }
}

/// A line groups routes that present as branches of one service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub id: LineId,
    #[serde(default)]
    pub short_name: String,
    #[serde(default)]
    pub long_name: String,
    pub sort_order: i32,
    /// Whether the line's routes are shown together on a single card.
    #[serde(default)]
    pub is_grouped: bool,
}
