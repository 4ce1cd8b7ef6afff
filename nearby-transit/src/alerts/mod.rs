//! Which alerts apply to a leaf, and how loudly.
//!
//! Matching is permissive: an informed entity that leaves a field unset
//! applies regardless of that field. A Major alert replaces the leaf's
//! departures; a Secondary one is shown beside them as a badge.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{
    Activity, Alert, AlertId, AlertSignificance, Effect, EntityQuery, RouteId, StopAlertState,
    StopId, Trip, TripId,
};
use crate::hierarchy::{StaticLeaf, StaticStop};
use crate::reference::ReferenceIndex;
use crate::snapshot::AlertSnapshot;

const BOARD: &[Activity] = &[Activity::Board];
const EXIT_OR_RIDE: &[Activity] = &[Activity::Exit, Activity::Ride];

/// Active alerts worth showing at all.
///
/// Alerts below Accessibility are dropped, or below Minor when minor alerts
/// are wanted.
pub fn relevant_alerts(
    snapshot: &AlertSnapshot,
    now: DateTime<Utc>,
    include_minor: bool,
) -> Vec<&Alert> {
    let floor = if include_minor {
        AlertSignificance::Minor
    } else {
        AlertSignificance::Accessibility
    };
    snapshot
        .alerts
        .values()
        .filter(|a| a.is_active(now) && a.significance() >= floor)
        .collect()
}

/// Alerts affecting boarding on any of `route_ids`.
///
/// `stop_ids == None` matches alerts at any stop.
pub fn applicable_alerts<'a>(
    alerts: &[&'a Alert],
    direction_id: Option<u8>,
    route_ids: &[RouteId],
    stop_ids: Option<&[StopId]>,
    trip_id: Option<&TripId>,
) -> Vec<&'a Alert> {
    let query = EntityQuery {
        activities: Some(BOARD),
        direction_id,
        routes: Some(route_ids),
        stops: stop_ids,
        trip: trip_id,
    };
    alerts
        .iter()
        .copied()
        .filter(|a| a.any_entity_satisfies(&query))
        .collect()
}

/// Elevator closures at any of `stop_ids` that affect wheelchair users.
pub fn elevator_alerts<'a>(alerts: &[&'a Alert], stop_ids: &[StopId]) -> Vec<&'a Alert> {
    let query = EntityQuery {
        activities: Some(&[Activity::UsingWheelchair]),
        stops: Some(stop_ids),
        ..Default::default()
    };
    alerts
        .iter()
        .copied()
        .filter(|a| a.effect == Effect::ElevatorClosure)
        .filter(|a| {
            a.informed_entity
                .iter()
                .any(|e| e.stop.is_some() && e.satisfies(&query))
        })
        .collect()
}

/// Alerts at the first stop after `target` on `trip` that has any alert
/// not already in effect at `target`.
///
/// Only alerts naming specific stops are considered, so a route-wide alert
/// never shows up as "downstream".
pub fn downstream_alerts<'a>(
    alerts: &[&'a Alert],
    trip: &Trip,
    target: &[StopId],
) -> Vec<&'a Alert> {
    let Some(stop_ids) = trip.stop_ids.as_deref() else {
        return Vec::new();
    };
    let alerts: Vec<&Alert> = alerts
        .iter()
        .copied()
        .filter(|a| a.has_stops_specified() && a.significance() >= AlertSignificance::Accessibility)
        .collect();
    let routes = std::slice::from_ref(&trip.route_id);
    let affects = |alert: &Alert, stops: &[StopId]| {
        alert.any_entity_satisfies(&EntityQuery {
            activities: Some(EXIT_OR_RIDE),
            direction_id: Some(trip.direction_id),
            routes: Some(routes),
            stops: Some(stops),
            trip: None,
        })
    };

    let at_target: Vec<&AlertId> = alerts
        .iter()
        .copied()
        .filter(|&a| affects(a, target))
        .map(|a| &a.id)
        .collect();

    let Some(target_index) = stop_ids.iter().position(|s| target.contains(s)) else {
        return Vec::new();
    };

    stop_ids[target_index + 1..]
        .iter()
        .map(|stop| {
            alerts
                .iter()
                .copied()
                .filter(|&a| affects(a, std::slice::from_ref(stop)) && !at_target.contains(&&a.id))
                .collect::<Vec<_>>()
        })
        .find(|found| !found.is_empty())
        .unwrap_or_default()
}

/// Badge for an alert shown beside departures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertBadge {
    pub alert_id: AlertId,
    pub state: StopAlertState,
    pub significance: AlertSignificance,
}

impl AlertBadge {
    pub fn for_alert(alert: &Alert) -> Self {
        Self {
            alert_id: alert.id.clone(),
            state: alert.stop_alert_state(),
            significance: alert.significance(),
        }
    }
}

/// Alerts resolved for one leaf.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeafAlerts<'a> {
    /// Alerts affecting boarding here, plus elevator closures.
    pub here: Vec<&'a Alert>,
    /// Alerts further along this leaf's patterns.
    pub downstream: Vec<&'a Alert>,
}

impl<'a> LeafAlerts<'a> {
    /// Resolve the alerts for `leaf` at `stop`.
    pub fn resolve(
        index: &ReferenceIndex,
        alerts: &[&'a Alert],
        stop: &StaticStop,
        leaf: &StaticLeaf,
    ) -> Self {
        let mut here = applicable_alerts(
            alerts,
            Some(leaf.direction_id),
            &leaf.route_ids,
            Some(&stop.stop_ids),
            None,
        );
        for alert in elevator_alerts(alerts, &stop.stop_ids) {
            if !here.iter().any(|a| a.id == alert.id) {
                here.push(alert);
            }
        }

        let mut downstream: Vec<&'a Alert> = Vec::new();
        for pattern in &leaf.patterns {
            let Some(trip) = index.representative_trip(pattern) else {
                continue;
            };
            for alert in downstream_alerts(alerts, trip, &stop.stop_ids) {
                if !downstream.iter().any(|a| a.id == alert.id) {
                    downstream.push(alert);
                }
            }
        }

        Self { here, downstream }
    }

    /// The alert that replaces departures, if any.
    pub fn major(&self) -> Option<&'a Alert> {
        self.here
            .iter()
            .copied()
            .find(|a| a.significance() >= AlertSignificance::Major)
    }

    /// The alert shown beside departures: a secondary alert here, or else
    /// the first alert downstream.
    ///
    /// Downstream alerts are taken at any significance. A major disruption
    /// further along the trip still leaves departures here, so it is shown
    /// as a badge.
    pub fn secondary(&self) -> Option<&'a Alert> {
        self.here
            .iter()
            .copied()
            .find(|a| {
                let significance = a.significance();
                significance >= AlertSignificance::Secondary
                    && significance < AlertSignificance::Major
            })
            .or_else(|| self.downstream.first().copied())
    }

    pub fn badge(&self) -> Option<AlertBadge> {
        self.secondary().map(AlertBadge::for_alert)
    }
}
