//! Schedule-only headsigns during subway disruptions.
//!
//! While part of a subway line is suspended, today's schedule may name a
//! temporary terminal as the headsign while predictions name the permanent
//! one, or the other way round. Predictions are always kept as they are.
//! When the schedule disagrees, the leaf that only exists because of the
//! schedule is dropped. Scheduled times are never shown on subway, so that
//! leaf could only ever have said "predictions unavailable".

use std::collections::BTreeSet;

use tracing::debug;

use crate::domain::{
    Alert, EntityQuery, Route, RouteId, RoutePattern, RoutePatternId, Typicality,
};
use crate::hierarchy::{StaticHierarchy, StaticLeaf};
use crate::reference::ReferenceIndex;
use crate::snapshot::{PredictionSnapshot, ScheduleSnapshot};

pub struct TemporaryTerminalFilter<'a> {
    index: &'a ReferenceIndex,
    alerts: &'a [&'a Alert],
    scheduled: BTreeSet<RoutePatternId>,
    predicted: BTreeSet<RoutePatternId>,
}

impl<'a> TemporaryTerminalFilter<'a> {
    pub fn new(
        index: &'a ReferenceIndex,
        schedules: &ScheduleSnapshot,
        predictions: &PredictionSnapshot,
        alerts: &'a [&'a Alert],
    ) -> Self {
        // Auto-cancelled schedules show up as cancelled predictions and
        // would make every scheduled pattern look predicted
        let predicted = predictions
            .predictions
            .values()
            .filter(|p| !p.is_cancelled())
            .filter_map(|p| predictions.trips.get(&p.trip_id))
            .filter_map(|t| t.route_pattern_id.clone())
            .collect();

        Self {
            index,
            alerts,
            scheduled: schedules.scheduled_pattern_ids(),
            predicted,
        }
    }

    /// Whether schedule-only leaves of `route` should be checked at all.
    ///
    /// Only subway routes with a suspension or shuttle somewhere on them,
    /// whose schedule today is missing a typical pattern and carries a
    /// non-typical one instead.
    pub fn applies_to_route(&self, route: &Route) -> bool {
        if !route.route_type.is_subway() {
            return false;
        }

        let routes = std::slice::from_ref(&route.id);
        let query = EntityQuery {
            routes: Some(routes),
            ..Default::default()
        };
        let has_alert = self
            .alerts
            .iter()
            .any(|a| a.has_no_through_service() && a.any_entity_satisfies(&query));
        if !has_alert {
            return false;
        }

        let missing_typical = self
            .index
            .patterns_for_route(&route.id)
            .into_iter()
            .filter(|p| p.typicality == Some(Typicality::Typical))
            .any(|p| !self.scheduled.contains(&p.id));
        let has_non_typical = self
            .scheduled
            .iter()
            .filter(|id| self.pattern_route(id) == Some(&route.id))
            .any(|id| {
                self.index
                    .pattern(id)
                    .is_none_or(|p| p.typicality != Some(Typicality::Typical))
            });

        missing_typical && has_non_typical
    }

    fn pattern_route(&self, id: &RoutePatternId) -> Option<&RouteId> {
        self.index.pattern(id).map(|p| &p.route_id)
    }

    fn is_schedule_only_non_typical(&self, pattern: &RoutePattern) -> bool {
        self.scheduled.contains(&pattern.id)
            && !self.predicted.contains(&pattern.id)
            && pattern.typicality != Some(Typicality::Typical)
    }

    fn discards(&self, leaf: &StaticLeaf, applicable: &[RouteId]) -> bool {
        leaf.patterns.iter().all(|p| {
            applicable.contains(&p.route_id) && self.is_schedule_only_non_typical(p)
        })
    }

    /// Drop the schedule-only leaves of every route this applies to.
    ///
    /// Stops and cards left without leaves are dropped too.
    pub fn filter(&self, mut hierarchy: StaticHierarchy) -> StaticHierarchy {
        for card in &mut hierarchy.cards {
            let applicable: Vec<RouteId> = card
                .subject
                .routes()
                .iter()
                .filter(|r| self.applies_to_route(r))
                .map(|r| r.id.clone())
                .collect();
            if applicable.is_empty() {
                continue;
            }
            for stop in &mut card.stops {
                stop.leaves.retain(|leaf| {
                    let discard = self.discards(leaf, &applicable);
                    if discard {
                        debug!(
                            card = card.subject.id(),
                            stop_id = %stop.stop.id,
                            "Hiding schedule-only temporary terminal"
                        );
                    }
                    !discard
                });
            }
            card.stops.retain(|s| !s.leaves.is_empty());
        }
        hierarchy.cards.retain(|c| !c.stops.is_empty());
        hierarchy
    }
}
