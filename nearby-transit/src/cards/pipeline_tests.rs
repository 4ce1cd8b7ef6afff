//! End-to-end tests for the card pipeline.

use std::collections::HashSet;

use super::*;
use crate::display::{NoTripsReason, TripInstantDisplay};
use crate::domain::{
    AlertId, Effect, Prediction, Schedule, ScheduleRelationship, StopEdgeType, Trip, Typicality,
};
use crate::fixtures::{ReferenceBuilder, alert, at, entity, now, prediction, schedule, trip};

/// Live feeds for one run. Each feed can be marked as still loading.
#[derive(Default)]
struct Feeds {
    schedules: ScheduleSnapshot,
    predictions: PredictionSnapshot,
    alerts: AlertSnapshot,
    schedules_loading: bool,
    predictions_loading: bool,
    alerts_loading: bool,
}

impl Feeds {
    fn schedule(&mut self, trip: &Trip, stop: &str, minutes: i64) -> &mut Schedule {
        self.schedules.trips.insert(trip.id.clone(), trip.clone());
        self.schedules.schedules.push(schedule(trip, stop, 1, at(minutes)));
        let last = self.schedules.schedules.len() - 1;
        &mut self.schedules.schedules[last]
    }

    fn predict(&mut self, trip: &Trip, stop: &str, minutes: i64) -> &mut Prediction {
        self.predictions.trips.insert(trip.id.clone(), trip.clone());
        let p = prediction(trip, stop, 1, at(minutes));
        self.predictions.predictions.entry(p.id.clone()).or_insert(p)
    }

    fn alert(&mut self, alert: Alert) {
        self.alerts.alerts.insert(alert.id.clone(), alert);
    }

    fn run(&self, index: &ReferenceIndex, stops: &[&str], config: &CardConfig) -> CardResult {
        let schedules = loadable(self.schedules_loading, self.schedules.clone());
        let predictions = loadable(self.predictions_loading, self.predictions.clone());
        let alerts = loadable(self.alerts_loading, self.alerts.clone());
        let stop_ids: Vec<StopId> = stops.iter().map(|s| StopId::new(s)).collect();

        let request = CardRequest {
            index,
            stop_ids: &stop_ids,
            schedules: &schedules,
            predictions: &predictions,
            alerts: &alerts,
            now: now(),
        };
        route_cards_for_stops(&request, config)
    }
}

fn loadable<T>(loading: bool, value: T) -> Loadable<T> {
    if loading {
        Loadable::Loading
    } else {
        Loadable::Loaded(value)
    }
}

/// One bus route with a single pattern from s1 to s2.
fn bus_route() -> ReferenceIndex {
    let mut b = ReferenceBuilder::new();
    b.stop("s1");
    b.stop("s2");
    b.route("1", RouteType::Bus, 1);
    b.pattern("1-0", "1", 0, ["s1", "s2"], "Harvard");
    b.finish()
}

/// One heavy rail route with a single pattern from s1 to s2.
fn subway_route() -> ReferenceIndex {
    let mut b = ReferenceBuilder::new();
    b.stop("s1");
    b.stop("s2");
    b.route("Red", RouteType::HeavyRail, 1);
    b.pattern("Red-0", "Red", 0, ["s1", "s2"], "Ashmont");
    b.finish()
}

fn cards(result: &CardResult) -> &[RouteCard] {
    match &result.cards {
        Loadable::Loaded(cards) => cards,
        Loadable::Loading => panic!("cards still loading"),
    }
}

fn only_leaf(result: &CardResult) -> &LeafCard {
    let leaves: Vec<&LeafCard> = cards(result).iter().flat_map(RouteCard::leaves).collect();
    assert_eq!(leaves.len(), 1, "expected exactly one leaf, got {leaves:?}");
    leaves[0]
}

fn displays(leaf: &LeafCard) -> Vec<TripInstantDisplay> {
    leaf.status.trips().iter().map(|t| t.display.clone()).collect()
}

#[test]
fn bus_predictions_show_minutes_in_order() {
    let index = bus_route();
    let mut feeds = Feeds::default();
    feeds.predict(&trip("t2", "1", "1-0", 0, "Harvard"), "s1", 9);
    feeds.predict(&trip("t1", "1", "1-0", 0, "Harvard"), "s1", 5);

    let result = feeds.run(&index, &["s1"], &CardConfig::default());

    let leaf = only_leaf(&result);
    assert_eq!(
        displays(leaf),
        vec![TripInstantDisplay::Minutes(5), TripInstantDisplay::Minutes(9)]
    );
    assert_eq!(leaf.status.trips()[0].id, "t1-1");
    assert_eq!(cards(&result)[0].service, ServiceBucket::Active);
}

#[test]
fn cancelled_trip_shows_scheduled_time_in_filtered_stop_details() {
    let index = bus_route();
    let mut feeds = Feeds::default();
    let t = trip("t1", "1", "1-0", 0, "Harvard");
    feeds.schedule(&t, "s1", 10);
    let cancelled = feeds.predict(&t, "s1", 10);
    cancelled.arrival_time = None;
    cancelled.departure_time = None;
    cancelled.schedule_relationship = ScheduleRelationship::Cancelled;

    let filtered = feeds.run(&index, &["s1"], &CardConfig::new(CardContext::StopDetailsFiltered));
    assert_eq!(
        displays(only_leaf(&filtered)),
        vec![TripInstantDisplay::Cancelled(at(10))]
    );

    let nearby = feeds.run(&index, &["s1"], &CardConfig::default());
    assert!(only_leaf(&nearby).status.trips().is_empty());
}

#[test]
fn subway_schedule_only_service_is_hidden() {
    let index = subway_route();
    let mut feeds = Feeds::default();
    feeds.schedule(&trip("t1", "Red", "Red-0", 0, "Ashmont"), "s1", 10);

    let result = feeds.run(&index, &["s1"], &CardConfig::default());

    assert!(cards(&result).is_empty());
    assert_eq!(result.stats.hidden_leaves, 1);
}

#[test]
fn bus_schedule_only_service_shows_schedule_minutes() {
    let index = bus_route();
    let mut feeds = Feeds::default();
    feeds.schedule(&trip("t1", "1", "1-0", 0, "Harvard"), "s1", 10);

    let result = feeds.run(&index, &["s1"], &CardConfig::default());

    assert_eq!(
        displays(only_leaf(&result)),
        vec![TripInstantDisplay::ScheduleMinutes(10)]
    );
}

#[test]
fn subway_schedule_only_waits_for_predictions() {
    let index = subway_route();
    let mut feeds = Feeds {
        predictions_loading: true,
        ..Default::default()
    };
    feeds.schedule(&trip("t1", "Red", "Red-0", 0, "Ashmont"), "s1", 10);

    let result = feeds.run(&index, &["s1"], &CardConfig::default());

    assert_eq!(only_leaf(&result).status, LeafStatus::Loading);
}

#[test]
fn suspension_replaces_departures() {
    let index = bus_route();
    let mut feeds = Feeds::default();
    feeds.predict(&trip("t1", "1", "1-0", 0, "Harvard"), "s1", 5);
    feeds.alert(alert("a1", Effect::Suspension, vec![entity("1", None)]));

    let result = feeds.run(&index, &["s1"], &CardConfig::default());

    assert_eq!(
        only_leaf(&result).status,
        LeafStatus::Disrupted {
            alert_id: AlertId::new("a1"),
            effect: Effect::Suspension,
        }
    );
    assert_eq!(cards(&result)[0].service, ServiceBucket::Active);
}

#[test]
fn secondary_alert_becomes_badge() {
    let index = bus_route();
    let mut feeds = Feeds::default();
    feeds.predict(&trip("t1", "1", "1-0", 0, "Harvard"), "s1", 5);
    feeds.alert(alert("a1", Effect::Detour, vec![entity("1", None)]));

    let result = feeds.run(&index, &["s1"], &CardConfig::default());

    let leaf = only_leaf(&result);
    assert_eq!(displays(leaf), vec![TripInstantDisplay::Minutes(5)]);
    assert_eq!(
        leaf.alert.as_ref().map(|b| b.alert_id.clone()),
        Some(AlertId::new("a1"))
    );
}

#[test]
fn loading_until_alerts_arrive() {
    let index = bus_route();
    let mut feeds = Feeds {
        alerts_loading: true,
        ..Default::default()
    };
    feeds.predict(&trip("t1", "1", "1-0", 0, "Harvard"), "s1", 5);

    let result = feeds.run(&index, &["s1"], &CardConfig::default());

    assert_eq!(result.cards, Loadable::Loading);
    assert_eq!(result.stats, PipelineStats::default());
}

#[test]
fn no_trips_reason_without_service() {
    let index = bus_route();
    let feeds = Feeds::default();

    let result = feeds.run(&index, &["s1"], &CardConfig::default());

    assert_eq!(
        only_leaf(&result).status,
        LeafStatus::NoTrips {
            reason: NoTripsReason::NoSchedulesToday
        }
    );
    assert_eq!(cards(&result)[0].service, ServiceBucket::NoService);
}

#[test]
fn service_ended_after_last_departure() {
    let index = bus_route();
    let mut feeds = Feeds::default();
    feeds.schedule(&trip("t1", "1", "1-0", 0, "Harvard"), "s1", -30);

    let result = feeds.run(&index, &["s1"], &CardConfig::default());

    assert_eq!(
        only_leaf(&result).status,
        LeafStatus::NoTrips {
            reason: NoTripsReason::ServiceEndedToday
        }
    );
    assert_eq!(cards(&result)[0].service, ServiceBucket::ScheduledToday);
}

#[test]
fn arrival_only_leaf_is_hidden() {
    let mut b = ReferenceBuilder::new();
    b.stop("s1");
    b.stop("s2");
    b.route("1", RouteType::Bus, 1);
    b.pattern("1-0", "1", 0, ["s1", "s2"], "Harvard");
    b.pattern("1-1", "1", 1, ["s2", "s1"], "Dudley");
    let index = b.finish();

    let mut feeds = Feeds::default();
    let terminating = feeds.schedule(&trip("t1", "1", "1-1", 1, "Dudley"), "s1", 5);
    terminating.pick_up_type = StopEdgeType::Unavailable;

    let result = feeds.run(&index, &["s1"], &CardConfig::default());

    let patterns: Vec<String> = cards(&result)
        .iter()
        .flat_map(RouteCard::leaves)
        .flat_map(|l| l.pattern_ids.iter().map(|p| p.to_string()))
        .collect();
    assert_eq!(patterns, vec!["1-0"]);
}

#[test]
fn non_typical_pattern_needs_service_within_horizon() {
    let mut b = ReferenceBuilder::new();
    b.stop("s1");
    b.stop("s2");
    b.route("1", RouteType::Bus, 1);
    b.pattern("1-0", "1", 0, ["s1", "s2"], "Harvard");
    b.pattern("1-0-x", "1", 0, ["s1", "s2"], "Kenmore").typicality = Some(Typicality::Deviation);
    let index = b.finish();

    let mut feeds = Feeds::default();
    feeds.predict(&trip("t1", "1", "1-0-x", 0, "Kenmore"), "s1", 200);

    let headsigns = |result: &CardResult| -> Vec<String> {
        cards(result)
            .iter()
            .flat_map(RouteCard::leaves)
            .map(|l| l.label().to_string())
            .collect()
    };

    let nearby = feeds.run(&index, &["s1"], &CardConfig::default());
    assert_eq!(headsigns(&nearby), vec!["Harvard"]);

    let filtered = feeds.run(&index, &["s1"], &CardConfig::new(CardContext::StopDetailsFiltered));
    assert_eq!(headsigns(&filtered), vec!["Harvard", "Kenmore"]);
}

#[test]
fn unknown_trips_are_counted() {
    let index = bus_route();
    let mut feeds = Feeds::default();
    feeds.predict(&trip("t1", "1", "1-0", 0, "Harvard"), "s1", 5);
    feeds.predictions.trips.clear();

    let result = feeds.run(&index, &["s1"], &CardConfig::default());

    assert_eq!(result.stats.skipped_trips.unknown_trips, 1);
    assert!(only_leaf(&result).status.trips().is_empty());
}

/// Two bus routes and a grouped two-branch tram line.
///
/// Route 1 serves `near` and `mid`, route 2 and the tram serve `mid` and
/// `far`.
fn busy_reference() -> ReferenceIndex {
    let mut b = ReferenceBuilder::new();
    b.stop("near");
    b.stop("mid").latitude = 42.36;
    b.stop("far").latitude = 42.40;
    b.route("1", RouteType::Bus, 10);
    b.pattern("1-0", "1", 0, ["near", "mid"], "Harvard");
    b.pattern("1-1", "1", 1, ["mid", "near"], "Dudley");
    b.route("2", RouteType::Bus, 5);
    b.pattern("2-0", "2", 0, ["far", "mid"], "Central");
    b.line("line-Tram", true);
    b.route_in_line("Tram-A", RouteType::LightRail, 1, "line-Tram");
    b.route_in_line("Tram-B", RouteType::LightRail, 2, "line-Tram");
    b.directions("Tram-A", ["Westbound", "Eastbound"], ["Kenmore", "Downtown"]);
    b.directions("Tram-B", ["Westbound", "Eastbound"], ["Kenmore", "Downtown"]);
    b.pattern("A-0", "Tram-A", 0, ["mid", "far"], "Boston College");
    b.pattern("B-0", "Tram-B", 0, ["mid", "far"], "Cleveland Circle");
    b.finish()
}

fn busy_feeds() -> Feeds {
    let mut feeds = Feeds::default();
    feeds.predict(&trip("a1", "Tram-A", "A-0", 0, "Boston College"), "mid", 3);
    feeds.predict(&trip("b1", "Tram-B", "B-0", 0, "Cleveland Circle"), "mid", 4);
    feeds.predict(&trip("t1", "1", "1-0", 0, "Harvard"), "near", 6);
    feeds.schedule(&trip("t2", "2", "2-0", 0, "Central"), "mid", 15);
    feeds
}

#[test]
fn pipeline_is_idempotent() {
    let index = busy_reference();
    let feeds = busy_feeds();
    let config = CardConfig::default().with_position(Position::new(42.35, -71.06));

    let first = feeds.run(&index, &["near", "mid", "far"], &config);
    let second = feeds.run(&index, &["near", "mid", "far"], &config);

    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(cards(&first)).unwrap(),
        serde_json::to_string(cards(&second)).unwrap()
    );
}

#[test]
fn no_pattern_in_two_leaves() {
    let index = busy_reference();
    let feeds = busy_feeds();

    let result = feeds.run(&index, &["near", "mid", "far"], &CardConfig::default());

    let all: Vec<String> = cards(&result)
        .iter()
        .flat_map(RouteCard::leaves)
        .flat_map(|l| l.pattern_ids.iter().map(|p| p.to_string()))
        .collect();
    let unique: HashSet<&String> = all.iter().collect();
    assert_eq!(all.len(), unique.len(), "duplicated patterns in {all:?}");
}

#[test]
fn grouped_line_shares_one_direction_leaf() {
    let index = busy_reference();
    let feeds = busy_feeds();

    let result = feeds.run(&index, &["mid"], &CardConfig::default());

    let tram = cards(&result)
        .iter()
        .find(|c| c.id() == "line-Tram")
        .expect("tram line card");
    let leaf = tram.leaves().next().expect("tram leaf");
    assert!(leaf.grouping.is_by_direction());
    let headsigns: Vec<&str> = leaf.status.trips().iter().map(|t| t.headsign.as_str()).collect();
    assert_eq!(headsigns, vec!["Boston College", "Cleveland Circle"]);
}

#[test]
fn cards_sort_by_mode_then_distance_then_pin() {
    let index = busy_reference();
    let feeds = Feeds::default();
    let config = CardConfig::default().with_position(Position::new(42.35, -71.06));

    // Without live data every card is in the same bucket. Route 2 has the
    // lower sort order but only reaches the far stop.
    let result = feeds.run(&index, &["far", "near"], &config);
    let ids: Vec<&str> = cards(&result).iter().map(RouteCard::id).collect();
    assert_eq!(ids, vec!["line-Tram", "1", "2"]);
    assert!(cards(&result).iter().all(|c| c.service == ServiceBucket::NoService));

    let pinned = config.with_pinned(["2"]);
    let result = feeds.run(&index, &["far", "near"], &pinned);
    let ids: Vec<&str> = cards(&result).iter().map(RouteCard::id).collect();
    assert_eq!(ids, vec!["2", "line-Tram", "1"]);
    assert!(cards(&result)[0].pinned);
}

#[test]
fn stats_summarise_the_run() {
    let index = busy_reference();
    let feeds = busy_feeds();

    let result = feeds.run(&index, &["near", "mid", "far", "missing"], &CardConfig::default());

    assert_eq!(result.stats.cards, cards(&result).len());
    assert_eq!(
        result.stats.leaves,
        cards(&result).iter().map(|c| c.leaves().count()).sum::<usize>()
    );
    assert_eq!(result.stats.skipped_reference, 1);
}
