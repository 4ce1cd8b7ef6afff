//! What a whole leaf shows: departures, a disruption, or why there are none.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::instant::{DisplayContext, TripInstantDisplay};
use crate::domain::{Alert, AlertId, Effect, RouteId, RouteType};
use crate::upcoming::UpcomingTrip;

/// Rows shown for a leaf with a single destination.
pub const TYPICAL_LEAF_ROWS: usize = 2;
/// Rows shown for a non-bus leaf serving several destinations.
pub const BRANCHING_LEAF_ROWS: usize = 3;

/// One row of departures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TripDisplay {
    pub id: String,
    pub route_id: RouteId,
    pub headsign: String,
    pub display: TripInstantDisplay,
}

/// Why a leaf has nothing to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoTripsReason {
    /// Trips are expected but none can be shown right now.
    PredictionsUnavailable,
    ServiceEndedToday,
    NoSchedulesToday,
}

impl NoTripsReason {
    pub fn from_trips(trips: &[UpcomingTrip], has_schedules_today: bool, now: DateTime<Utc>) -> Self {
        if trips.iter().any(|t| t.time().is_some_and(|time| time > now)) {
            NoTripsReason::PredictionsUnavailable
        } else if has_schedules_today {
            NoTripsReason::ServiceEndedToday
        } else {
            NoTripsReason::NoSchedulesToday
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum LeafStatus {
    /// Nothing to show yet and the data that could fill it is still loading.
    Loading,
    /// A major alert replaces departures.
    Disrupted { alert_id: AlertId, effect: Effect },
    Departures { trips: Vec<TripDisplay> },
    NoTrips { reason: NoTripsReason },
}

/// Maximum rows for a leaf, or `None` for no limit.
pub fn row_limit(context: DisplayContext, branching: bool, route_type: RouteType) -> Option<usize> {
    if context == DisplayContext::StopDetailsFiltered {
        None
    } else if branching && route_type != RouteType::Bus {
        Some(BRANCHING_LEAF_ROWS)
    } else {
        Some(TYPICAL_LEAF_ROWS)
    }
}

/// Format `trips` in order, leaving out rows that are never listed.
pub fn format_trips(
    trips: &[UpcomingTrip],
    route_type: RouteType,
    now: DateTime<Utc>,
    context: DisplayContext,
    limit: Option<usize>,
) -> Vec<TripDisplay> {
    trips
        .iter()
        .filter_map(|trip| {
            let display = TripInstantDisplay::for_trip(trip, route_type, now, context);
            (!display.is_hidden()).then(|| TripDisplay {
                id: trip.id(),
                route_id: trip.trip().route_id.clone(),
                headsign: trip.headsign().to_string(),
                display,
            })
        })
        .take(limit.unwrap_or(usize::MAX))
        .collect()
}

/// Inputs for [`LeafStatus::resolve`] beyond the trips themselves.
#[derive(Debug, Clone, Copy)]
pub struct LeafContext<'a> {
    pub route_type: RouteType,
    pub context: DisplayContext,
    pub now: DateTime<Utc>,
    pub major_alert: Option<&'a Alert>,
    pub branching: bool,
    pub has_schedules_today: bool,
    pub all_loaded: bool,
}

impl LeafStatus {
    pub fn resolve(trips: &[UpcomingTrip], leaf: &LeafContext<'_>) -> Self {
        if let Some(alert) = leaf.major_alert {
            return LeafStatus::Disrupted {
                alert_id: alert.id.clone(),
                effect: alert.effect,
            };
        }

        let limit = row_limit(leaf.context, leaf.branching, leaf.route_type);
        let rows = format_trips(trips, leaf.route_type, leaf.now, leaf.context, limit);
        if !rows.is_empty() {
            return LeafStatus::Departures { trips: rows };
        }
        if !leaf.all_loaded {
            return LeafStatus::Loading;
        }
        LeafStatus::NoTrips {
            reason: NoTripsReason::from_trips(trips, leaf.has_schedules_today, leaf.now),
        }
    }

    pub fn trips(&self) -> &[TripDisplay] {
        match self {
            LeafStatus::Departures { trips } => trips,
            _ => &[],
        }
    }

    /// Departures to show, or a disruption standing in for them.
    pub fn is_active(&self) -> bool {
        matches!(self, LeafStatus::Departures { .. } | LeafStatus::Disrupted { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ScheduleRelationship, Trip};
    use crate::fixtures::{alert, at, entity, now, prediction, schedule, trip};

    fn t(id: &str) -> Trip {
        trip(id, "r1", "p1", 0, "Downtown")
    }

    fn predicted(id: &str, minutes: i64) -> UpcomingTrip {
        let t = t(id);
        UpcomingTrip::new(t.clone(), None, Some(prediction(&t, "s1", 1, at(minutes))), None).unwrap()
    }

    fn ctx() -> LeafContext<'static> {
        LeafContext {
            route_type: RouteType::Bus,
            context: DisplayContext::NearbyTransit,
            now: now(),
            major_alert: None,
            branching: false,
            has_schedules_today: true,
            all_loaded: true,
        }
    }

    #[test]
    fn row_limits() {
        assert_eq!(row_limit(DisplayContext::StopDetailsFiltered, true, RouteType::HeavyRail), None);
        assert_eq!(row_limit(DisplayContext::NearbyTransit, true, RouteType::HeavyRail), Some(3));
        assert_eq!(row_limit(DisplayContext::NearbyTransit, true, RouteType::Bus), Some(2));
        assert_eq!(row_limit(DisplayContext::NearbyTransit, false, RouteType::HeavyRail), Some(2));
    }

    #[test]
    fn departures_are_limited() {
        let trips = vec![predicted("a", 2), predicted("b", 5), predicted("c", 9)];

        let status = LeafStatus::resolve(&trips, &ctx());

        let minutes: Vec<_> = status.trips().iter().map(|r| r.display.clone()).collect();
        assert_eq!(
            minutes,
            vec![TripInstantDisplay::Minutes(2), TripInstantDisplay::Minutes(5)]
        );
        assert_eq!(status.trips()[0].id, "a-1");
    }

    #[test]
    fn hidden_rows_do_not_use_the_limit() {
        let mut skipped = prediction(&t("a"), "s1", 1, at(2));
        skipped.schedule_relationship = ScheduleRelationship::Skipped;
        let trips = vec![
            UpcomingTrip::new(t("a"), None, Some(skipped), None).unwrap(),
            predicted("b", 5),
            predicted("c", 9),
        ];

        let rows = format_trips(&trips, RouteType::Bus, now(), DisplayContext::NearbyTransit, Some(2));

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].display, TripInstantDisplay::Minutes(5));
    }

    #[test]
    fn major_alert_disrupts_even_with_trips() {
        let suspension = alert("a1", Effect::Suspension, vec![entity("r1", None)]);
        let leaf = LeafContext {
            major_alert: Some(&suspension),
            ..ctx()
        };

        let status = LeafStatus::resolve(&[predicted("a", 2)], &leaf);

        assert_eq!(
            status,
            LeafStatus::Disrupted {
                alert_id: AlertId::new("a1"),
                effect: Effect::Suspension,
            }
        );
        assert!(status.is_active());
    }

    #[test]
    fn loading_until_everything_arrives() {
        let leaf = LeafContext {
            all_loaded: false,
            ..ctx()
        };

        assert_eq!(LeafStatus::resolve(&[], &leaf), LeafStatus::Loading);
    }

    #[test]
    fn no_trips_reasons() {
        let future_subway = {
            let t = t("a");
            UpcomingTrip::new(t.clone(), Some(schedule(&t, "s1", 1, at(10))), None, None).unwrap()
        };
        let subway = LeafContext {
            route_type: RouteType::HeavyRail,
            ..ctx()
        };
        assert_eq!(
            LeafStatus::resolve(&[future_subway], &subway),
            LeafStatus::NoTrips { reason: NoTripsReason::PredictionsUnavailable }
        );

        assert_eq!(
            LeafStatus::resolve(&[], &ctx()),
            LeafStatus::NoTrips { reason: NoTripsReason::ServiceEndedToday }
        );

        let nothing_today = LeafContext {
            has_schedules_today: false,
            ..ctx()
        };
        assert_eq!(
            LeafStatus::resolve(&[], &nothing_today),
            LeafStatus::NoTrips { reason: NoTripsReason::NoSchedulesToday }
        );
    }

    #[test]
    fn status_serializes_with_kind() {
        let json = serde_json::to_value(LeafStatus::NoTrips {
            reason: NoTripsReason::ServiceEndedToday,
        })
        .unwrap();

        assert_eq!(
            json,
            serde_json::json!({"kind": "no_trips", "reason": "service_ended_today"})
        );
    }
}
