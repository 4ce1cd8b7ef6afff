//! Display states for trips and leaves.
//!
//! Everything here is a pure function of its inputs and the caller's `now`.

mod format;
mod instant;

pub use format::{
    BRANCHING_LEAF_ROWS, LeafContext, LeafStatus, NoTripsReason, TYPICAL_LEAF_ROWS, TripDisplay,
    format_trips, row_limit,
};
pub use instant::{
    APPROACH_CUTOFF, ARRIVAL_CUTOFF, BOARDING_CUTOFF, DISTANT_FUTURE_CUTOFF, DisplayContext,
    TripInstantDisplay,
};
