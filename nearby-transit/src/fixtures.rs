//! Object builders shared by unit tests.

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::domain::{
    ActivePeriod, Activity, Alert, AlertId, Cause, CurrentStatus, Effect, InformedEntity, Lifecycle,
    Line, LineId, Prediction, PredictionId, Route, RouteId, RoutePattern, RoutePatternId,
    RouteType, Schedule, ScheduleRelationship, StopEdgeType, Stop, StopId, Trip, TripId, Typicality,
    Vehicle, VehicleId,
};
use crate::reference::ReferenceIndex;
use crate::snapshot::ReferenceSnapshot;

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap()
}

/// `now()` plus a number of minutes.
pub fn at(minutes: i64) -> DateTime<Utc> {
    now() + Duration::minutes(minutes)
}

/// `now()` plus a number of seconds.
pub fn at_secs(seconds: i64) -> DateTime<Utc> {
    now() + Duration::seconds(seconds)
}

/// Incrementally assembles a reference snapshot.
#[derive(Debug, Default)]
pub struct ReferenceBuilder {
    snapshot: ReferenceSnapshot,
    next_sort_order: i32,
}

impl ReferenceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&mut self, id: &str) -> &mut Stop {
        let stop = Stop {
            id: StopId::new(id),
            name: id.to_string(),
            latitude: 42.35,
            longitude: -71.06,
            parent_station_id: None,
            child_stop_ids: Vec::new(),
        };
        self.snapshot.stops.entry(stop.id.clone()).or_insert(stop)
    }

    pub fn parent_station(&mut self, id: &str, children: &[&str]) -> &mut Stop {
        for child in children {
            self.stop(child).parent_station_id = Some(StopId::new(id));
        }
        let parent = self.stop(id);
        parent.child_stop_ids = children.iter().map(|c| StopId::new(c)).collect();
        parent
    }

    pub fn route(&mut self, id: &str, route_type: RouteType, sort_order: i32) -> &mut Route {
        let route = Route {
            id: RouteId::new(id),
            route_type,
            sort_order,
            short_name: id.to_string(),
            long_name: String::new(),
            direction_names: [Some("Outbound".into()), Some("Inbound".into())],
            direction_destinations: [None, None],
            line_id: None,
            is_shuttle: false,
        };
        self.snapshot.routes.entry(route.id.clone()).or_insert(route)
    }

    pub fn route_in_line(
        &mut self,
        id: &str,
        route_type: RouteType,
        sort_order: i32,
        line: &str,
    ) -> &mut Route {
        let route = self.route(id, route_type, sort_order);
        route.line_id = Some(LineId::new(line));
        route
    }

    pub fn shuttle(&mut self, route_id: &str) {
        if let Some(route) = self.snapshot.routes.get_mut(&RouteId::new(route_id)) {
            route.is_shuttle = true;
        }
    }

    pub fn directions(&mut self, route_id: &str, names: [&str; 2], destinations: [&str; 2]) {
        if let Some(route) = self.snapshot.routes.get_mut(&RouteId::new(route_id)) {
            route.direction_names = names.map(|n| Some(n.to_string()));
            route.direction_destinations = destinations.map(|d| Some(d.to_string()));
        }
    }

    pub fn line(&mut self, id: &str, is_grouped: bool) -> &mut Line {
        let line = Line {
            id: LineId::new(id),
            short_name: String::new(),
            long_name: id.to_string(),
            sort_order: 0,
            is_grouped,
        };
        self.snapshot.lines.entry(line.id.clone()).or_insert(line)
    }

    /// Add a typical pattern whose representative trip `{id}-rep` calls at
    /// `stops` under `headsign`.
    pub fn pattern<'s>(
        &mut self,
        id: &str,
        route: &str,
        direction_id: u8,
        stops: impl IntoIterator<Item = &'s str>,
        headsign: &str,
    ) -> &mut RoutePattern {
        self.next_sort_order += 1;
        let trip = Trip {
            id: TripId::new(format!("{id}-rep")),
            route_id: RouteId::new(route),
            direction_id,
            headsign: headsign.to_string(),
            route_pattern_id: Some(RoutePatternId::new(id)),
            stop_ids: Some(stops.into_iter().map(StopId::new).collect()),
        };
        let pattern = RoutePattern {
            id: RoutePatternId::new(id),
            route_id: RouteId::new(route),
            direction_id,
            sort_order: self.next_sort_order,
            typicality: Some(Typicality::Typical),
            representative_trip_id: trip.id.clone(),
            name: String::new(),
        };
        self.snapshot.trips.insert(trip.id.clone(), trip);
        self.snapshot
            .route_patterns
            .entry(pattern.id.clone())
            .or_insert(pattern)
    }

    pub fn snapshot(&self) -> ReferenceSnapshot {
        self.snapshot.clone()
    }

    pub fn finish(self) -> ReferenceIndex {
        ReferenceIndex::from_snapshot(self.snapshot)
    }
}

/// A trip running on `pattern` with its own id.
pub fn trip(id: &str, route: &str, pattern: &str, direction_id: u8, headsign: &str) -> Trip {
    Trip {
        id: TripId::new(id),
        route_id: RouteId::new(route),
        direction_id,
        headsign: headsign.to_string(),
        route_pattern_id: Some(RoutePatternId::new(pattern)),
        stop_ids: None,
    }
}

/// A schedule arriving and departing at `time`.
pub fn schedule(trip: &Trip, stop: &str, stop_sequence: u32, time: DateTime<Utc>) -> Schedule {
    Schedule {
        trip_id: trip.id.clone(),
        stop_id: StopId::new(stop),
        stop_sequence,
        route_id: trip.route_id.clone(),
        arrival_time: Some(time),
        departure_time: Some(time),
        pick_up_type: StopEdgeType::Regular,
        drop_off_type: StopEdgeType::Regular,
        stop_headsign: None,
    }
}

/// A scheduled prediction arriving and departing at `time`.
pub fn prediction(trip: &Trip, stop: &str, stop_sequence: u32, time: DateTime<Utc>) -> Prediction {
    Prediction {
        id: PredictionId::new(format!("{}-{stop}-{stop_sequence}", trip.id)),
        trip_id: trip.id.clone(),
        stop_id: StopId::new(stop),
        stop_sequence,
        route_id: trip.route_id.clone(),
        arrival_time: Some(time),
        departure_time: Some(time),
        schedule_relationship: ScheduleRelationship::Scheduled,
        status: None,
        vehicle_id: None,
    }
}

pub fn vehicle(id: &str, status: CurrentStatus, stop: &str, trip: &Trip) -> Vehicle {
    Vehicle {
        id: VehicleId::new(id),
        current_status: status,
        stop_id: Some(StopId::new(stop)),
        trip_id: Some(trip.id.clone()),
    }
}

/// An open-ended alert active since an hour before `now()`.
pub fn alert(id: &str, effect: Effect, entities: Vec<InformedEntity>) -> Alert {
    Alert {
        id: AlertId::new(id),
        active_period: vec![ActivePeriod {
            start: at(-60),
            end: None,
        }],
        cause: Cause::Other,
        effect,
        header: None,
        informed_entity: entities,
        lifecycle: Lifecycle::New,
        severity: 5,
    }
}

/// An entity for boarding (and riding through) a route, optionally at one stop.
pub fn entity(route: &str, stop: Option<&str>) -> InformedEntity {
    InformedEntity {
        activities: vec![Activity::Board, Activity::Exit, Activity::Ride],
        route: Some(RouteId::new(route)),
        stop: stop.map(StopId::new),
        ..Default::default()
    }
}
