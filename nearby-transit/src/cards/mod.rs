//! Route cards for a list of nearby stops.
//!
//! The pipeline is rebuilt from scratch for every input change: static
//! hierarchy, temporary terminal filter, trip matching, per-leaf filtering
//! and display, then sorting. No state is carried between runs.

mod config;
mod model;
mod sort;

#[cfg(test)]
mod pipeline_tests;

pub use config::{CardConfig, CardContext};
pub use model::{CardSubject, LeafCard, RouteCard, ServiceBucket, StopCard};
pub use sort::{compare_cards, compare_leaves, compare_stops, sort_cards};

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::debug;

use crate::alerts::{LeafAlerts, relevant_alerts};
use crate::display::{LeafContext, LeafStatus, TYPICAL_LEAF_ROWS};
use crate::domain::{Alert, Position, RouteType, StopId};
use crate::hierarchy::{self, LineOrRoute, StaticCard, StaticLeaf, StaticStop};
use crate::reference::ReferenceIndex;
use crate::snapshot::{AlertSnapshot, Loadable, PredictionSnapshot, ScheduleSnapshot};
use crate::terminal::TemporaryTerminalFilter;
use crate::upcoming::{
    LeafTrips, MatchedTrips, SkipCounts, UpcomingTrip, all_arrival_only, match_trips,
};

/// How far ahead trips count towards a leaf's potential headsigns.
const POTENTIAL_SERVICE_WINDOW: Duration = Duration::minutes(120);

/// Everything one pipeline run reads.
#[derive(Debug, Clone, Copy)]
pub struct CardRequest<'a> {
    pub index: &'a ReferenceIndex,
    /// Stops to show, nearest first.
    pub stop_ids: &'a [StopId],
    pub schedules: &'a Loadable<ScheduleSnapshot>,
    pub predictions: &'a Loadable<PredictionSnapshot>,
    pub alerts: &'a Loadable<AlertSnapshot>,
    pub now: DateTime<Utc>,
}

/// Counters describing one pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PipelineStats {
    pub cards: usize,
    pub leaves: usize,
    /// Leaves built from reference data but filtered out.
    pub hidden_leaves: usize,
    /// Stops and patterns skipped while building the hierarchy.
    pub skipped_reference: usize,
    pub skipped_trips: SkipCounts,
}

/// Result of one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct CardResult {
    /// Sorted cards, or `Loading` until alerts have arrived.
    pub cards: Loadable<Vec<RouteCard>>,
    pub stats: PipelineStats,
}

/// Build sorted route cards for `request.stop_ids`.
///
/// Without alerts nothing can be said about disruptions, so the whole
/// result stays `Loading`. Missing schedules or predictions only affect the
/// leaves that would have used them.
pub fn route_cards_for_stops(request: &CardRequest<'_>, config: &CardConfig) -> CardResult {
    debug!(
        stops = request.stop_ids.len(),
        schedules = ?request.schedules.state(),
        predictions = ?request.predictions.state(),
        alerts = ?request.alerts.state(),
        "Building route cards"
    );
    let Some(alert_snapshot) = request.alerts.loaded() else {
        return CardResult {
            cards: Loadable::Loading,
            stats: PipelineStats::default(),
        };
    };
    let alerts = relevant_alerts(alert_snapshot, request.now, config.include_minor_alerts);

    let mut built = hierarchy::build(request.index, request.stop_ids);
    let mut stats = PipelineStats {
        skipped_reference: built.skipped,
        ..Default::default()
    };

    if let (Some(schedules), Some(predictions)) =
        (request.schedules.loaded(), request.predictions.loaded())
    {
        let before = built.leaves().count();
        built = TemporaryTerminalFilter::new(request.index, schedules, predictions, &alerts)
            .filter(built);
        stats.hidden_leaves += before - built.leaves().count();
    }

    let matched = match_trips(
        request.index,
        request.schedules,
        request.predictions,
        request.now,
    );
    stats.skipped_trips = matched.skipped;

    let builder = CardBuilder {
        request,
        config,
        alerts: &alerts,
        matched: &matched,
    };
    let mut cards: Vec<RouteCard> = built
        .cards
        .iter()
        .filter_map(|card| builder.card(card, &mut stats))
        .collect();
    sort_cards(&mut cards);

    stats.cards = cards.len();
    stats.leaves = cards.iter().map(|c| c.leaves().count()).sum();
    debug!(
        cards = stats.cards,
        leaves = stats.leaves,
        hidden_leaves = stats.hidden_leaves,
        skipped_reference = stats.skipped_reference,
        skipped_trips = stats.skipped_trips.total(),
        "Built route cards"
    );

    CardResult {
        cards: Loadable::Loaded(cards),
        stats,
    }
}

struct CardBuilder<'a> {
    request: &'a CardRequest<'a>,
    config: &'a CardConfig,
    alerts: &'a [&'a Alert],
    matched: &'a MatchedTrips,
}

impl CardBuilder<'_> {
    fn card(&self, card: &StaticCard, stats: &mut PipelineStats) -> Option<RouteCard> {
        let route_type = card.subject.route_type().unwrap_or(RouteType::Bus);
        let stops: Vec<StopCard> = card
            .stops
            .iter()
            .filter_map(|stop| self.stop(&card.subject, route_type, stop, stats))
            .collect();
        if stops.is_empty() {
            return None;
        }

        let (subject, sort_order) = match &card.subject {
            LineOrRoute::Line { line, routes } => (
                CardSubject::Line {
                    id: line.id.clone(),
                    name: line.long_name.clone(),
                    route_ids: routes.iter().map(|r| r.id.clone()).collect(),
                },
                line.sort_order,
            ),
            LineOrRoute::Route(route) => (
                CardSubject::Route {
                    id: route.id.clone(),
                    name: route.label().to_string(),
                },
                route.sort_order,
            ),
        };
        let service = stops
            .iter()
            .flat_map(|s| s.leaves.iter())
            .map(LeafCard::service)
            .min()
            .unwrap_or(ServiceBucket::NoService);
        let distance_m = stops
            .iter()
            .filter_map(|s| s.distance_m)
            .min_by(f64::total_cmp);

        Some(RouteCard {
            pinned: self.config.is_pinned(subject.id()),
            subject,
            route_type,
            is_subway: route_type.is_subway(),
            sort_order,
            service,
            distance_m,
            stops,
        })
    }

    fn stop(
        &self,
        subject: &LineOrRoute,
        route_type: RouteType,
        stop: &StaticStop,
        stats: &mut PipelineStats,
    ) -> Option<StopCard> {
        let trips = self.matched.for_stop(self.request.index, stop);
        let leaves: Vec<LeafCard> = stop
            .leaves
            .iter()
            .zip(trips)
            .filter_map(|(leaf, trips)| {
                let card = self.leaf(route_type, stop, leaf, trips);
                if card.is_none() {
                    stats.hidden_leaves += 1;
                    debug!(card = subject.id(), stop_id = %stop.stop.id, "Hiding leaf");
                }
                card
            })
            .collect();
        if leaves.is_empty() {
            return None;
        }

        let distance_m = self
            .config
            .sort_from
            .map(|from: Position| from.distance_to(&stop.stop.position()));
        Some(StopCard {
            stop_id: stop.stop.id.clone(),
            name: stop.stop.name.clone(),
            distance_m,
            directions: stop.directions.clone(),
            leaves,
        })
    }

    fn leaf(
        &self,
        route_type: RouteType,
        stop: &StaticStop,
        leaf: &StaticLeaf,
        leaf_trips: LeafTrips,
    ) -> Option<LeafCard> {
        let now = self.request.now;
        let is_subway = route_type.is_subway();
        let hide_cancelled = is_subway || self.config.context.hides_cancellations();

        let mut trips: Vec<UpcomingTrip> = leaf_trips
            .trips
            .into_iter()
            .filter(|t| !(hide_cancelled && t.is_cancelled()))
            .collect();
        if all_arrival_only(&trips) {
            return None;
        }
        trips.retain(|t| t.is_arrival_only() != Some(true));

        let cutoff = self.config.cutoff(now);
        let upcoming_soon = trips.iter().any(|t| t.is_upcoming_within(now, cutoff));
        if !leaf.has_typical_pattern() && !upcoming_soon {
            return None;
        }

        let alerts = LeafAlerts::resolve(self.request.index, self.alerts, stop, leaf);
        let major_alert = alerts.major();

        // Scheduled times are never shown on subway
        if is_subway
            && major_alert.is_none()
            && self.matched.predictions_loaded()
            && !trips.is_empty()
            && trips.iter().all(|t| t.prediction().is_none())
        {
            return None;
        }

        let context = LeafContext {
            route_type,
            context: self.config.context.display_context(),
            now,
            major_alert,
            branching: self.is_branching(route_type, leaf, &trips),
            has_schedules_today: leaf_trips.has_schedules_today,
            all_loaded: self.matched.all_loaded(),
        };
        let status = LeafStatus::resolve(&trips, &context);

        Some(LeafCard {
            grouping: leaf.grouping.clone(),
            direction_id: leaf.direction_id,
            route_ids: leaf.route_ids.clone(),
            pattern_ids: leaf.pattern_ids().cloned().collect(),
            stop_ids: leaf.stop_ids.clone(),
            sort_order: leaf.sort_order(),
            status,
            alert: alerts.badge(),
        })
    }

    /// Whether the leaf may show more than one destination.
    ///
    /// Counts the headsigns of soon-upcoming trips (for bus only those that
    /// fit on the card) plus, off bus, the headsigns of typical patterns
    /// with no such trip.
    fn is_branching(
        &self,
        route_type: RouteType,
        leaf: &StaticLeaf,
        trips: &[UpcomingTrip],
    ) -> bool {
        let now = self.request.now;
        let is_bus = route_type == RouteType::Bus;
        let take = if is_bus && self.config.context != CardContext::StopDetailsFiltered {
            TYPICAL_LEAF_ROWS
        } else {
            usize::MAX
        };

        let soon: Vec<&UpcomingTrip> = trips
            .iter()
            .filter(|t| t.is_upcoming_within(now, Some(now + POTENTIAL_SERVICE_WINDOW)))
            .take(take)
            .collect();
        let mut headsigns: BTreeSet<&str> = soon.iter().map(|t| t.headsign()).collect();

        if !is_bus {
            let represented: BTreeSet<_> = soon
                .iter()
                .filter_map(|t| t.trip().route_pattern_id.as_ref())
                .collect();
            for pattern in leaf.patterns.iter().filter(|p| p.is_typical()) {
                if represented.contains(&pattern.id) {
                    continue;
                }
                if let Some(trip) = self.request.index.representative_trip(pattern) {
                    headsigns.insert(&trip.headsign);
                }
            }
        }

        headsigns.len() > 1
    }
}
