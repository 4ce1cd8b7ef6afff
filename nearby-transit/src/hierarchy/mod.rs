//! Static route/stop/headsign hierarchy.
//!
//! Groups the route patterns serving an ordered stop list into cards:
//! route-or-line, then stop, then headsign-or-direction leaves. Built from
//! reference data alone; live data is attached later.

mod builder;
mod direction;

pub use builder::build;
pub use direction::{Direction, MID_LINE_TERMINAL, branch_destination, has_branch_overrides};

use serde::Serialize;

use crate::domain::{Line, Route, RouteId, RoutePattern, RoutePatternId, RouteType, Stop, StopId};

/// What a card is about: a single route, or a grouped line of branches.
#[derive(Debug, Clone, PartialEq)]
pub enum LineOrRoute {
    Line { line: Line, routes: Vec<Route> },
    Route(Route),
}

impl LineOrRoute {
    pub fn id(&self) -> &str {
        match self {
            LineOrRoute::Line { line, .. } => line.id.as_str(),
            LineOrRoute::Route(route) => route.id.as_str(),
        }
    }

    pub fn routes(&self) -> &[Route] {
        match self {
            LineOrRoute::Line { routes, .. } => routes,
            LineOrRoute::Route(route) => std::slice::from_ref(route),
        }
    }

    /// The route whose sort order and mode represent the card.
    pub fn sort_route(&self) -> Option<&Route> {
        self.routes()
            .iter()
            .min_by(|a, b| a.sort_order.cmp(&b.sort_order).then_with(|| a.id.cmp(&b.id)))
    }

    pub fn route_type(&self) -> Option<RouteType> {
        self.sort_route().map(|r| r.route_type)
    }
}

/// How a leaf is labelled.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum LeafGrouping {
    /// A single destination, labelled with the trip headsign.
    Headsign(String),
    /// Several branches travelling the same way.
    Direction(Direction),
}

impl LeafGrouping {
    pub fn is_by_direction(&self) -> bool {
        matches!(self, LeafGrouping::Direction(_))
    }

    pub fn headsign(&self) -> Option<&str> {
        match self {
            LeafGrouping::Headsign(h) => Some(h),
            LeafGrouping::Direction(_) => None,
        }
    }
}

/// Patterns of one route-or-line, at one stop, for one headsign or direction.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticLeaf {
    pub grouping: LeafGrouping,
    pub direction_id: u8,
    /// Routes contributing patterns, in sort order.
    pub route_ids: Vec<RouteId>,
    /// Sorted by pattern sort order.
    pub patterns: Vec<RoutePattern>,
    /// Stop ids at which feed data for this leaf may report.
    pub stop_ids: Vec<StopId>,
}

impl StaticLeaf {
    pub fn pattern_ids(&self) -> impl Iterator<Item = &RoutePatternId> {
        self.patterns.iter().map(|p| &p.id)
    }

    pub fn has_pattern(&self, id: &RoutePatternId) -> bool {
        self.patterns.iter().any(|p| &p.id == id)
    }

    pub fn has_typical_pattern(&self) -> bool {
        self.patterns.iter().any(RoutePattern::is_typical)
    }

    /// Lowest pattern sort order, used for ordering leaves.
    pub fn sort_order(&self) -> i32 {
        self.patterns
            .iter()
            .map(|p| p.sort_order)
            .min()
            .unwrap_or(i32::MAX)
    }
}

/// One stop of a card with its leaves.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticStop {
    /// The grouping stop: the parent station where there is one.
    pub stop: Stop,
    /// The grouping stop followed by its child stops.
    pub stop_ids: Vec<StopId>,
    pub directions: [Direction; 2],
    pub leaves: Vec<StaticLeaf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StaticCard {
    pub subject: LineOrRoute,
    pub stops: Vec<StaticStop>,
}

/// Output of [`build`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StaticHierarchy {
    pub cards: Vec<StaticCard>,
    /// Stops and patterns skipped because reference data was incomplete.
    pub skipped: usize,
}

impl StaticHierarchy {
    pub fn leaves(&self) -> impl Iterator<Item = &StaticLeaf> {
        self.cards
            .iter()
            .flat_map(|c| c.stops.iter())
            .flat_map(|s| s.leaves.iter())
    }
}
