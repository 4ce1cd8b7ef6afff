//! Builds the static hierarchy from reference data and an ordered stop list.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use super::{
    Direction, LeafGrouping, LineOrRoute, MID_LINE_TERMINAL, StaticCard, StaticHierarchy,
    StaticLeaf, StaticStop, has_branch_overrides,
};
use crate::domain::{LineId, Route, RouteId, RoutePattern, RoutePatternId, Stop, StopId, Typicality};
use crate::reference::ReferenceIndex;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum CardKey {
    Line(LineId),
    Route(RouteId),
}

/// Patterns collected for one card, per grouping stop, in stop order.
struct PendingCard<'a> {
    key: CardKey,
    stops: Vec<(&'a Stop, Vec<&'a RoutePattern>)>,
}

/// Build the hierarchy for `stop_ids`, nearest stop first.
///
/// A pattern serving several of the stops is attributed only to the first
/// one that serves it. Cards come out in first-seen order; ordering for
/// display is the sorter's job.
pub fn build(index: &ReferenceIndex, stop_ids: &[StopId]) -> StaticHierarchy {
    let mut used: HashSet<&RoutePatternId> = HashSet::new();
    let mut pending: Vec<PendingCard> = Vec::new();
    let mut positions: HashMap<CardKey, usize> = HashMap::new();
    let mut skipped = 0;

    for stop_id in stop_ids {
        let Some(root) = index.parent_or_self(stop_id) else {
            skipped += 1;
            debug!(stop_id = %stop_id, skipped, "Unknown stop, skipping");
            continue;
        };

        for pattern in index.patterns_at_stop(stop_id) {
            if !used.insert(&pattern.id) {
                continue;
            }
            let Some(route) = index.route(&pattern.route_id) else {
                skipped += 1;
                debug!(
                    pattern_id = %pattern.id,
                    route_id = %pattern.route_id,
                    skipped,
                    "Pattern references unknown route, skipping"
                );
                continue;
            };

            let key = match index.grouped_line_for(route) {
                Some(line) => CardKey::Line(line.id.clone()),
                None => CardKey::Route(route.id.clone()),
            };
            let pos = *positions.entry(key.clone()).or_insert_with(|| {
                pending.push(PendingCard {
                    key,
                    stops: Vec::new(),
                });
                pending.len() - 1
            });

            let card = &mut pending[pos];
            match card.stops.iter_mut().find(|(s, _)| s.id == root.id) {
                Some((_, patterns)) => patterns.push(pattern),
                None => card.stops.push((root, vec![pattern])),
            }
        }
    }

    let cards = pending
        .into_iter()
        .filter_map(|card| build_card(index, card, &mut skipped))
        .collect();

    StaticHierarchy { cards, skipped }
}

fn build_card(
    index: &ReferenceIndex,
    card: PendingCard<'_>,
    skipped: &mut usize,
) -> Option<StaticCard> {
    let (subject, stops): (LineOrRoute, Vec<StaticStop>) = match &card.key {
        CardKey::Route(route_id) => {
            let route = index.route(route_id)?;
            let stops = card
                .stops
                .iter()
                .map(|(stop, patterns)| route_stop(index, route, stop, patterns, skipped))
                .collect();
            (LineOrRoute::Route(route.clone()), stops)
        }
        CardKey::Line(line_id) => {
            let line = index.line(line_id)?;
            let routes = sorted_routes(
                index,
                card.stops.iter().flat_map(|(_, patterns)| patterns.iter().copied()),
            );
            let stops = card
                .stops
                .iter()
                .map(|(stop, patterns)| line_stop(index, stop, patterns, skipped))
                .collect();
            let subject = LineOrRoute::Line {
                line: line.clone(),
                routes: routes.into_iter().cloned().collect(),
            };
            (subject, stops)
        }
    };

    let stops: Vec<StaticStop> = stops.into_iter().filter(|s| !s.leaves.is_empty()).collect();
    if stops.is_empty() {
        return None;
    }
    Some(StaticCard { subject, stops })
}

/// Distinct routes of `patterns`, in sort order.
fn sorted_routes<'i, 'p>(
    index: &'i ReferenceIndex,
    patterns: impl Iterator<Item = &'p RoutePattern>,
) -> Vec<&'i Route> {
    let mut routes: Vec<&Route> = Vec::new();
    for pattern in patterns {
        if let Some(route) = index.route(&pattern.route_id) {
            if !routes.iter().any(|r| r.id == route.id) {
                routes.push(route);
            }
        }
    }
    routes.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then_with(|| a.id.cmp(&b.id)));
    routes
}

/// Group patterns by representative-trip headsign, keeping first-seen order.
fn by_headsign<'a>(
    index: &ReferenceIndex,
    patterns: &[&'a RoutePattern],
    skipped: &mut usize,
) -> Vec<((u8, String), Vec<&'a RoutePattern>)> {
    let mut groups: Vec<((u8, String), Vec<&RoutePattern>)> = Vec::new();
    for &pattern in patterns {
        let Some(trip) = index.representative_trip(pattern) else {
            *skipped += 1;
            debug!(
                pattern_id = %pattern.id,
                trip_id = %pattern.representative_trip_id,
                "Representative trip missing, skipping pattern"
            );
            continue;
        };
        let key = (pattern.direction_id, trip.headsign.clone());
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, group)) => group.push(pattern),
            None => groups.push((key, vec![pattern])),
        }
    }
    groups
}

fn route_stop(
    index: &ReferenceIndex,
    route: &Route,
    stop: &Stop,
    patterns: &[&RoutePattern],
    skipped: &mut usize,
) -> StaticStop {
    let family = index.stop_family(&stop.id);
    let leaves = by_headsign(index, patterns, skipped)
        .into_iter()
        .map(|((direction_id, headsign), group)| {
            make_leaf(index, LeafGrouping::Headsign(headsign), direction_id, group, &family)
        })
        .collect();

    StaticStop {
        stop: stop.clone(),
        directions: route_directions(index, route, stop, patterns),
        stop_ids: family,
        leaves,
    }
}

fn line_stop(
    index: &ReferenceIndex,
    stop: &Stop,
    patterns: &[&RoutePattern],
    skipped: &mut usize,
) -> StaticStop {
    let family = index.stop_family(&stop.id);

    let mut by_direction: Vec<(Direction, Vec<&RoutePattern>)> = Vec::new();
    for &pattern in patterns {
        let Some(route) = index.route(&pattern.route_id) else {
            continue;
        };
        let direction = pattern_direction(index, stop, route, pattern);
        match by_direction.iter_mut().find(|(d, _)| *d == direction) {
            Some((_, group)) => group.push(pattern),
            None => by_direction.push((direction, vec![pattern])),
        }
    }

    let mut leaves = Vec::new();
    for (direction, group) in by_direction {
        let routes = sorted_routes(index, group.iter().copied());
        let regular_routes = routes.iter().filter(|r| !r.is_shuttle).count();

        if regular_routes == 1 {
            for ((direction_id, headsign), subgroup) in by_headsign(index, &group, skipped) {
                leaves.push(make_leaf(
                    index,
                    LeafGrouping::Headsign(headsign),
                    direction_id,
                    subgroup,
                    &family,
                ));
            }
        } else if direction.destination.as_deref() != Some(MID_LINE_TERMINAL) {
            // Branches that short-turn mid-line never get a grouped leaf of
            // their own at the short-turn terminal
            let direction_id = direction.id;
            leaves.push(make_leaf(
                index,
                LeafGrouping::Direction(direction),
                direction_id,
                group,
                &family,
            ));
        }
    }

    let routes_here = sorted_routes(index, patterns.iter().copied());
    let directions = [0u8, 1].map(|direction_id| {
        let per_route: Vec<Direction> = routes_here
            .iter()
            .map(|route| {
                let route_patterns: Vec<&RoutePattern> = patterns
                    .iter()
                    .copied()
                    .filter(|p| p.route_id == route.id)
                    .collect();
                let [d0, d1] = route_directions(index, route, stop, &route_patterns);
                if direction_id == 0 { d0 } else { d1 }
            })
            .collect();
        Direction::merge(&per_route, direction_id).unwrap_or(Direction {
            name: None,
            destination: None,
            id: direction_id,
        })
    });

    StaticStop {
        stop: stop.clone(),
        stop_ids: family,
        directions,
        leaves,
    }
}

/// Direction labels for one route at a stop.
fn route_directions(
    index: &ReferenceIndex,
    route: &Route,
    stop: &Stop,
    patterns: &[&RoutePattern],
) -> [Direction; 2] {
    if !has_branch_overrides(&route.id) {
        return [0u8, 1].map(|d| Direction::for_route(route, d));
    }
    [0u8, 1].map(|direction_id| {
        let typical_stops = patterns
            .iter()
            .find(|p| p.direction_id == direction_id && p.typicality == Some(Typicality::Typical))
            .and_then(|p| index.pattern_stop_ids(p));
        Direction::at_stop(route, direction_id, &stop.id, typical_stops.as_deref(), None)
    })
}

fn pattern_direction(
    index: &ReferenceIndex,
    stop: &Stop,
    route: &Route,
    pattern: &RoutePattern,
) -> Direction {
    if !has_branch_overrides(&route.id) {
        return Direction::for_route(route, pattern.direction_id);
    }
    let headsign = index
        .representative_trip(pattern)
        .map(|t| t.headsign.as_str());
    let stop_ids = index.pattern_stop_ids(pattern);
    Direction::at_stop(route, pattern.direction_id, &stop.id, stop_ids.as_deref(), headsign)
}

fn make_leaf(
    index: &ReferenceIndex,
    grouping: LeafGrouping,
    direction_id: u8,
    mut patterns: Vec<&RoutePattern>,
    family: &[StopId],
) -> StaticLeaf {
    patterns.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then_with(|| a.id.cmp(&b.id)));
    let route_ids = sorted_routes(index, patterns.iter().copied())
        .into_iter()
        .map(|r| r.id.clone())
        .collect();
    let stop_ids = stops_served(index, &patterns, family);

    StaticLeaf {
        grouping,
        direction_id,
        route_ids,
        patterns: patterns.into_iter().cloned().collect(),
        stop_ids,
    }
}

/// Narrow a stop family to the platforms the patterns actually call at.
///
/// The grouping stop itself is always kept. If the patterns' stop lists are
/// unknown or miss every child, the whole family is kept.
fn stops_served(index: &ReferenceIndex, patterns: &[&RoutePattern], family: &[StopId]) -> Vec<StopId> {
    let served: HashSet<&StopId> = patterns
        .iter()
        .filter_map(|p| index.representative_trip(p))
        .filter_map(|t| t.stop_ids.as_ref())
        .flatten()
        .collect();

    let Some((root, children)) = family.split_first() else {
        return Vec::new();
    };
    let narrowed: Vec<&StopId> = children.iter().filter(|id| served.contains(id)).collect();
    if narrowed.is_empty() {
        return family.to_vec();
    }
    std::iter::once(root).chain(narrowed).cloned().collect()
}
