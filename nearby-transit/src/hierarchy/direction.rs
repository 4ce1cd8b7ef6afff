//! Direction labels and the branch override table.
//!
//! Most directions are labelled straight from the route's direction names
//! and destinations. A few branching routes need a label that depends on
//! where along the route the rider is standing, matching station signage
//! ("Copley & West" before the western branches split). Those are hand-coded
//! below and are intentionally not generalised.

use serde::Serialize;

use crate::domain::{Route, RouteId, StopId};

/// Label for one direction of travel at a stop.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Direction {
    pub name: Option<String>,
    /// `None` when several destinations are served and none is representative.
    pub destination: Option<String>,
    pub id: u8,
}

/// Direction label for a destination that is only a terminal for some
/// branches partway along a line. Never shown as a grouped direction.
pub const MID_LINE_TERMINAL: &str = "Government Center";

const NORTH_STATION_AND_NORTH: &str = "North Station & North";

/// One direction's override sequence: parent stop ids in order along the
/// typical pattern, each with the label that applies up to and including
/// that stop. `None` means "use the route's own label".
type BranchLabels = &'static [(&'static str, Option<&'static str>)];

const BRANCH_OVERRIDES: &[(&str, [Option<BranchLabels>; 2])] = &[
    (
        "Green",
        [
            Some(&[
                ("place-armnl", Some("Copley & West")),
                ("place-hymnl", Some("Kenmore & West")),
                ("place-prmnl", None),
                ("place-kencl", None),
            ]),
            Some(&[
                ("place-boyls", Some("Park St & North")),
                ("place-pktrm", Some("Gov Ctr & North")),
                ("place-haecl", Some(NORTH_STATION_AND_NORTH)),
                ("place-spmnl", Some("Lechmere & North")),
                ("place-lech", None),
            ]),
        ],
    ),
    (
        "Red",
        [
            Some(&[
                ("place-jfk", None),
                ("place-asmnl", Some("Ashmont")),
                ("place-brntn", Some("Braintree")),
            ]),
            None,
        ],
    ),
];

/// Routes that share another route's override entry.
const OVERRIDE_ALIASES: &[(&str, &str)] = &[
    ("Green-B", "Green"),
    ("Green-C", "Green"),
    ("Green-D", "Green"),
    ("Green-E", "Green"),
];

fn override_key(route_id: &RouteId) -> &str {
    OVERRIDE_ALIASES
        .iter()
        .find(|(alias, _)| *alias == route_id.as_str())
        .map(|(_, target)| *target)
        .unwrap_or(route_id.as_str())
}

fn branch_labels(route_id: &RouteId) -> Option<&'static [Option<BranchLabels>; 2]> {
    let key = override_key(route_id);
    BRANCH_OVERRIDES
        .iter()
        .find(|(id, _)| *id == key)
        .map(|(_, labels)| labels)
}

/// Whether the route has any position-dependent direction labels.
pub fn has_branch_overrides(route_id: &RouteId) -> bool {
    branch_labels(route_id).is_some()
}

/// The override label for `stop_id` on a route whose stops (parent ids, in
/// travel order) are `route_stop_ids`.
///
/// Picks the first override stop at or after the rider's stop.
pub fn branch_destination(
    direction_id: u8,
    route_id: &RouteId,
    stop_id: &StopId,
    route_stop_ids: &[StopId],
) -> Option<&'static str> {
    let cases = branch_labels(route_id)?
        .get(usize::from(direction_id))?
        .as_ref()?;
    let position = |id: &str| route_stop_ids.iter().position(|s| s.as_str() == id);
    let stop_index = position(stop_id.as_str())?;

    cases
        .iter()
        .find(|(case_stop, _)| position(*case_stop).is_some_and(|i| stop_index <= i))
        .and_then(|(_, label)| *label)
}

impl Direction {
    pub fn new(name: Option<&str>, destination: Option<&str>, id: u8) -> Self {
        Self {
            name: name.map(str::to_owned),
            destination: destination.map(str::to_owned),
            id,
        }
    }

    /// The route's own label for a direction.
    pub fn for_route(route: &Route, direction_id: u8) -> Self {
        Self::new(
            route.direction_name(direction_id),
            route.direction_destination(direction_id),
            direction_id,
        )
    }

    /// Label at a specific stop.
    ///
    /// Precedence: branch override, then the pattern's own destination (for
    /// atypical patterns heading somewhere unusual), then the route default.
    pub fn at_stop(
        route: &Route,
        direction_id: u8,
        stop_id: &StopId,
        route_stop_ids: Option<&[StopId]>,
        pattern_destination: Option<&str>,
    ) -> Self {
        let destination = route_stop_ids
            .and_then(|ids| branch_destination(direction_id, &route.id, stop_id, ids))
            .or(pattern_destination)
            .or(route.direction_destination(direction_id));
        Self::new(route.direction_name(direction_id), destination, direction_id)
    }

    /// Combine the per-route directions of a grouped line into one label.
    ///
    /// One shared destination is used as is. Branches that terminate at the
    /// mid-line terminal collapse into the direction continuing past it.
    /// Otherwise only the direction name is shown.
    pub fn merge(directions: &[Direction], direction_id: u8) -> Option<Self> {
        let first = directions.first()?;
        let mut destinations: Vec<Option<&str>> = Vec::new();
        for d in directions {
            if !destinations.contains(&d.destination.as_deref()) {
                destinations.push(d.destination.as_deref());
            }
        }

        if destinations.len() == 1 {
            return Some(first.clone());
        }
        if destinations.len() == 2
            && destinations.contains(&Some(MID_LINE_TERMINAL))
            && destinations.contains(&Some(NORTH_STATION_AND_NORTH))
        {
            return directions
                .iter()
                .find(|d| d.destination.as_deref() == Some(NORTH_STATION_AND_NORTH))
                .cloned();
        }
        Some(Self {
            name: first.name.clone(),
            destination: None,
            id: direction_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RouteType;

    fn route(id: &str) -> Route {
        Route {
            id: RouteId::new(id),
            route_type: RouteType::LightRail,
            sort_order: 1,
            short_name: String::new(),
            long_name: String::new(),
            direction_names: [Some("West".into()), Some("East".into())],
            direction_destinations: [Some("Riverside".into()), Some("Union Square".into())],
            line_id: None,
            is_shuttle: false,
        }
    }

    fn stops(ids: &[&str]) -> Vec<StopId> {
        ids.iter().map(|s| StopId::new(s)).collect()
    }

    fn green_d_eastbound() -> Vec<StopId> {
        stops(&[
            "place-river",
            "place-kencl",
            "place-hymnl",
            "place-coecl",
            "place-armnl",
            "place-boyls",
            "place-pktrm",
            "place-gover",
            "place-haecl",
            "place-spmnl",
            "place-lech",
            "place-unsqu",
        ])
    }

    #[test]
    fn route_without_overrides_uses_defaults() {
        let r = route("Orange");
        let d = Direction::at_stop(&r, 0, &StopId::new("x"), Some(&stops(&["x", "y"])), None);

        assert_eq!(d, Direction::new(Some("West"), Some("Riverside"), 0));
        assert!(!has_branch_overrides(&r.id));
    }

    #[test]
    fn aliased_routes_share_overrides() {
        assert!(has_branch_overrides(&RouteId::new("Green-D")));
        assert!(has_branch_overrides(&RouteId::new("Red")));
    }

    #[test]
    fn trunk_labels_change_along_the_route() {
        let ids = green_d_eastbound();
        let r = route("Green-D");
        let at = |stop: &str| {
            Direction::at_stop(&r, 1, &StopId::new(stop), Some(&ids), None).destination
        };

        assert_eq!(at("place-kencl").as_deref(), Some("Park St & North"));
        assert_eq!(at("place-boyls").as_deref(), Some("Park St & North"));
        assert_eq!(at("place-pktrm").as_deref(), Some("Gov Ctr & North"));
        assert_eq!(at("place-gover").as_deref(), Some(NORTH_STATION_AND_NORTH));
        assert_eq!(at("place-spmnl").as_deref(), Some("Lechmere & North"));
        // Past the last override the route default applies
        assert_eq!(at("place-lech").as_deref(), Some("Union Square"));
        assert_eq!(at("place-unsqu").as_deref(), Some("Union Square"));
    }

    #[test]
    fn stop_off_route_gets_no_override() {
        let ids = green_d_eastbound();
        assert_eq!(
            branch_destination(1, &RouteId::new("Green-D"), &StopId::new("place-nowhere"), &ids),
            None
        );
    }

    #[test]
    fn direction_without_overrides() {
        let ids = stops(&["place-brntn", "place-jfk", "place-alfcl"]);
        assert_eq!(
            branch_destination(1, &RouteId::new("Red"), &StopId::new("place-brntn"), &ids),
            None
        );
    }

    #[test]
    fn pattern_destination_beats_route_default() {
        let r = route("Orange");
        let d = Direction::at_stop(&r, 0, &StopId::new("x"), None, Some("Forest Hills"));

        assert_eq!(d.destination.as_deref(), Some("Forest Hills"));
    }

    #[test]
    fn merge_single_destination() {
        let a = Direction::new(Some("East"), Some("Park St & North"), 1);
        let merged = Direction::merge(&[a.clone(), a.clone()], 1).unwrap();

        assert_eq!(merged, a);
    }

    #[test]
    fn merge_mid_line_terminal() {
        let gov = Direction::new(Some("East"), Some(MID_LINE_TERMINAL), 1);
        let north = Direction::new(Some("East"), Some(NORTH_STATION_AND_NORTH), 1);
        let merged = Direction::merge(&[gov, north.clone()], 1).unwrap();

        assert_eq!(merged, north);
    }

    #[test]
    fn merge_diverging_destinations() {
        let a = Direction::new(Some("West"), Some("Boston College"), 0);
        let b = Direction::new(Some("West"), Some("Riverside"), 0);
        let merged = Direction::merge(&[a, b], 0).unwrap();

        assert_eq!(merged, Direction::new(Some("West"), None, 0));
        assert!(Direction::merge(&[], 0).is_none());
    }
}
