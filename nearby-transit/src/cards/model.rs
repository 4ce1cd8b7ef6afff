//! Output of the card pipeline: plain data, ready to serialize.

use serde::Serialize;

use crate::alerts::AlertBadge;
use crate::display::{LeafStatus, NoTripsReason};
use crate::domain::{LineId, RouteId, RoutePatternId, RouteType, StopId};
use crate::hierarchy::{Direction, LeafGrouping};

/// How much service a card has, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceBucket {
    /// Something to show now, or a disruption standing in for it.
    Active,
    /// Service runs today but nothing is upcoming right now.
    ScheduledToday,
    NoService,
}

impl ServiceBucket {
    pub fn for_status(status: &LeafStatus) -> Self {
        match status {
            LeafStatus::Departures { .. } | LeafStatus::Disrupted { .. } => ServiceBucket::Active,
            LeafStatus::Loading
            | LeafStatus::NoTrips {
                reason: NoTripsReason::PredictionsUnavailable | NoTripsReason::ServiceEndedToday,
            } => ServiceBucket::ScheduledToday,
            LeafStatus::NoTrips {
                reason: NoTripsReason::NoSchedulesToday,
            } => ServiceBucket::NoService,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum CardSubject {
    Line {
        id: LineId,
        name: String,
        route_ids: Vec<RouteId>,
    },
    Route {
        id: RouteId,
        name: String,
    },
}

impl CardSubject {
    pub fn id(&self) -> &str {
        match self {
            CardSubject::Line { id, .. } => id.as_str(),
            CardSubject::Route { id, .. } => id.as_str(),
        }
    }
}

/// One route or line, with the nearby stops it serves.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteCard {
    pub subject: CardSubject,
    pub route_type: RouteType,
    pub is_subway: bool,
    pub sort_order: i32,
    pub pinned: bool,
    pub service: ServiceBucket,
    /// Metres from the query point to the nearest stop on the card.
    pub distance_m: Option<f64>,
    pub stops: Vec<StopCard>,
}

impl RouteCard {
    pub fn id(&self) -> &str {
        self.subject.id()
    }

    pub fn leaves(&self) -> impl Iterator<Item = &LeafCard> {
        self.stops.iter().flat_map(|s| s.leaves.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StopCard {
    pub stop_id: StopId,
    pub name: String,
    pub distance_m: Option<f64>,
    pub directions: [Direction; 2],
    pub leaves: Vec<LeafCard>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeafCard {
    pub grouping: LeafGrouping,
    pub direction_id: u8,
    pub route_ids: Vec<RouteId>,
    pub pattern_ids: Vec<RoutePatternId>,
    pub stop_ids: Vec<StopId>,
    pub sort_order: i32,
    pub status: LeafStatus,
    /// Secondary alert shown beside the departures.
    pub alert: Option<AlertBadge>,
}

impl LeafCard {
    pub fn service(&self) -> ServiceBucket {
        ServiceBucket::for_status(&self.status)
    }

    /// Text the leaf is labelled with, for tie-breaking.
    pub fn label(&self) -> &str {
        match &self.grouping {
            LeafGrouping::Headsign(h) => h,
            LeafGrouping::Direction(d) => d.destination.as_deref().or(d.name.as_deref()).unwrap_or(""),
        }
    }
}
