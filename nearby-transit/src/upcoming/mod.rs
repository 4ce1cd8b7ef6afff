//! Live trip occurrences.
//!
//! Schedules and predictions arrive independently. They are merged into
//! [`UpcomingTrip`]s and then split between the leaves of a static
//! hierarchy.

mod matcher;
mod trip;

pub use matcher::{LeafTrips, MatchedTrips, SkipCounts, match_trips};
pub use trip::{UpcomingTrip, all_arrival_only};
