//! Card, stop and leaf ordering.
//!
//! Every comparator ends in an id tie-break, so identical input always
//! sorts identically.

use std::cmp::Ordering;

use super::model::{LeafCard, RouteCard, StopCard};

/// Absent distances sort after present ones.
fn cmp_distance(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Order route cards.
///
/// Cards are ranked by:
/// 1. Pinned before unpinned
/// 2. Service bucket (active, then scheduled today, then no service)
/// 3. Subway before other modes
/// 4. Distance from the query point (nearer is better)
/// 5. Route or line sort order
pub fn compare_cards(a: &RouteCard, b: &RouteCard) -> Ordering {
    b.pinned
        .cmp(&a.pinned)
        .then_with(|| a.service.cmp(&b.service))
        .then_with(|| b.is_subway.cmp(&a.is_subway))
        .then_with(|| cmp_distance(a.distance_m, b.distance_m))
        .then_with(|| a.sort_order.cmp(&b.sort_order))
        .then_with(|| a.id().cmp(b.id()))
}

/// Order the stops of one card, nearest first.
pub fn compare_stops(a: &StopCard, b: &StopCard) -> Ordering {
    cmp_distance(a.distance_m, b.distance_m).then_with(|| a.stop_id.cmp(&b.stop_id))
}

/// Order the leaves at one stop.
///
/// Direction first, then direction groupings before single headsigns, then
/// pattern sort order.
pub fn compare_leaves(a: &LeafCard, b: &LeafCard) -> Ordering {
    a.direction_id
        .cmp(&b.direction_id)
        .then_with(|| {
            b.grouping
                .is_by_direction()
                .cmp(&a.grouping.is_by_direction())
        })
        .then_with(|| a.sort_order.cmp(&b.sort_order))
        .then_with(|| a.label().cmp(b.label()))
        .then_with(|| a.pattern_ids.cmp(&b.pattern_ids))
}

/// Sort cards, and the stops and leaves inside them.
pub fn sort_cards(cards: &mut [RouteCard]) {
    for card in cards.iter_mut() {
        for stop in &mut card.stops {
            stop.leaves.sort_by(compare_leaves);
        }
        card.stops.sort_by(compare_stops);
    }
    cards.sort_by(compare_cards);
}
