//! Id-keyed lookups over the reference snapshot.
//!
//! Every lookup returns `Option`: feeds can race ahead of reference data, so
//! an unknown id is an ordinary outcome rather than an error.

use std::collections::HashMap;

use crate::domain::{
    Line, LineId, Route, RouteId, RoutePattern, RoutePatternId, Stop, StopId, Trip, TripId,
};
use crate::snapshot::ReferenceSnapshot;

/// Read-only index over one reference snapshot.
#[derive(Debug, Default)]
pub struct ReferenceIndex {
    routes: HashMap<RouteId, Route>,
    lines: HashMap<LineId, Line>,
    patterns: HashMap<RoutePatternId, RoutePattern>,
    trips: HashMap<TripId, Trip>,
    stops: HashMap<StopId, Stop>,

    /// Stop id (as it appears in trip stop lists) -> patterns whose
    /// representative trip calls there, in pattern id order.
    patterns_by_stop: HashMap<StopId, Vec<RoutePatternId>>,
}

impl ReferenceIndex {
    pub fn from_snapshot(snapshot: ReferenceSnapshot) -> Self {
        let mut patterns_by_stop: HashMap<StopId, Vec<RoutePatternId>> = HashMap::new();

        for pattern in snapshot.route_patterns.values() {
            let Some(stop_ids) = snapshot
                .trips
                .get(&pattern.representative_trip_id)
                .and_then(|t| t.stop_ids.as_ref())
            else {
                continue;
            };
            for stop_id in stop_ids {
                let entry = patterns_by_stop.entry(stop_id.clone()).or_default();
                // Loop routes visit a stop twice
                if !entry.contains(&pattern.id) {
                    entry.push(pattern.id.clone());
                }
            }
        }

        Self {
            routes: snapshot.routes.into_iter().collect(),
            lines: snapshot.lines.into_iter().collect(),
            patterns: snapshot.route_patterns.into_iter().collect(),
            trips: snapshot.trips.into_iter().collect(),
            stops: snapshot.stops.into_iter().collect(),
            patterns_by_stop,
        }
    }

    pub fn route(&self, id: &RouteId) -> Option<&Route> {
        self.routes.get(id)
    }

    pub fn line(&self, id: &LineId) -> Option<&Line> {
        self.lines.get(id)
    }

    pub fn pattern(&self, id: &RoutePatternId) -> Option<&RoutePattern> {
        self.patterns.get(id)
    }

    pub fn trip(&self, id: &TripId) -> Option<&Trip> {
        self.trips.get(id)
    }

    pub fn stop(&self, id: &StopId) -> Option<&Stop> {
        self.stops.get(id)
    }

    /// The stop's parent station, or the stop itself if it has none.
    pub fn parent_or_self(&self, id: &StopId) -> Option<&Stop> {
        let stop = self.stops.get(id)?;
        match &stop.parent_station_id {
            Some(parent_id) => self.stops.get(parent_id).or(Some(stop)),
            None => Some(stop),
        }
    }

    /// Id of the grouping stop for `id`. Unknown stops resolve to themselves.
    pub fn parent_id(&self, id: &StopId) -> StopId {
        self.parent_or_self(id)
            .map(|s| s.id.clone())
            .unwrap_or_else(|| id.clone())
    }

    /// The grouping stop for `id` followed by all of its child stop ids.
    pub fn stop_family(&self, id: &StopId) -> Vec<StopId> {
        let Some(root) = self.parent_or_self(id) else {
            return vec![id.clone()];
        };
        let mut ids = Vec::with_capacity(1 + root.child_stop_ids.len());
        ids.push(root.id.clone());
        for child in &root.child_stop_ids {
            if !ids.contains(child) {
                ids.push(child.clone());
            }
        }
        ids
    }

    /// Route patterns serving this stop or any of its children.
    ///
    /// Ordered by route sort order, then pattern sort order, then id.
    pub fn patterns_at_stop(&self, id: &StopId) -> Vec<&RoutePattern> {
        let mut seen: Vec<&RoutePatternId> = Vec::new();
        let mut candidates = vec![id];
        if let Some(stop) = self.stops.get(id) {
            candidates.extend(stop.child_stop_ids.iter());
        }
        for stop_id in candidates {
            for pattern_id in self.patterns_by_stop.get(stop_id).into_iter().flatten() {
                if !seen.contains(&pattern_id) {
                    seen.push(pattern_id);
                }
            }
        }

        let mut patterns: Vec<&RoutePattern> = seen
            .into_iter()
            .filter_map(|pid| self.patterns.get(pid))
            .collect();
        patterns.sort_by(|a, b| {
            let route_order = |p: &RoutePattern| self.routes.get(&p.route_id).map(|r| r.sort_order);
            route_order(a)
                .cmp(&route_order(b))
                .then_with(|| a.sort_order.cmp(&b.sort_order))
                .then_with(|| a.id.cmp(&b.id))
        });
        patterns
    }

    pub fn representative_trip(&self, pattern: &RoutePattern) -> Option<&Trip> {
        self.trips.get(&pattern.representative_trip_id)
    }

    /// The representative trip's stops, resolved to grouping stops.
    pub fn pattern_stop_ids(&self, pattern: &RoutePattern) -> Option<Vec<StopId>> {
        let stop_ids = self.representative_trip(pattern)?.stop_ids.as_ref()?;
        Some(stop_ids.iter().map(|s| self.parent_id(s)).collect())
    }

    /// The line a route is displayed under, if it is a non-shuttle member of
    /// a grouped line.
    pub fn grouped_line_for(&self, route: &Route) -> Option<&Line> {
        if route.is_shuttle {
            return None;
        }
        let line = self.lines.get(route.line_id.as_ref()?)?;
        line.is_grouped.then_some(line)
    }

    /// Patterns of a route, in sort order.
    pub fn patterns_for_route(&self, route_id: &RouteId) -> Vec<&RoutePattern> {
        let mut patterns: Vec<&RoutePattern> = self
            .patterns
            .values()
            .filter(|p| &p.route_id == route_id)
            .collect();
        patterns.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then_with(|| a.id.cmp(&b.id)));
        patterns
    }
}
