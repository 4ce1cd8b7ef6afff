//! Nearby transit departures.
//!
//! Turns reference data and live schedule, prediction and alert snapshots
//! into ordered route cards for the stops near a rider: "what leaves from
//! around here, and when?"

pub mod alerts;
pub mod cards;
pub mod display;
pub mod domain;
pub mod hierarchy;
pub mod reference;
pub mod replay;
pub mod snapshot;
pub mod terminal;
pub mod upcoming;

#[cfg(test)]
mod fixtures;
