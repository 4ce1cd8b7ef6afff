//! How one upcoming trip is shown.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::domain::{CurrentStatus, RouteType, ScheduleRelationship, StopTimes};
use crate::upcoming::UpcomingTrip;

/// A vehicle stopped at the stop this close to departure is boarding.
pub const BOARDING_CUTOFF: Duration = Duration::seconds(30);
pub const ARRIVAL_CUTOFF: Duration = Duration::seconds(30);
pub const APPROACH_CUTOFF: Duration = Duration::seconds(60);
/// From this far out a clock time is shown instead of a minute count.
pub const DISTANT_FUTURE_CUTOFF: Duration = Duration::minutes(60);

/// Which screen a trip is shown on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayContext {
    NearbyTransit,
    StopDetailsUnfiltered,
    StopDetailsFiltered,
    TripDetails,
}

impl DisplayContext {
    fn shows_cancellations(self) -> bool {
        matches!(self, DisplayContext::StopDetailsFiltered | DisplayContext::TripDetails)
    }
}

/// The state in which a single trip is displayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum TripInstantDisplay {
    /// Free text from the prediction, shown verbatim.
    Overridden(String),
    Hidden,
    /// The vehicle will not stop here.
    Skipped(Option<DateTime<Utc>>),
    Cancelled(DateTime<Utc>),
    Boarding,
    Arriving,
    Approaching,
    /// Bus arriving, where boarding and arriving are too close to tell apart.
    Now,
    Minutes(i64),
    ScheduleMinutes(i64),
    ScheduleTime {
        time: DateTime<Utc>,
        headline: bool,
    },
    Time {
        time: DateTime<Utc>,
        headline: bool,
    },
    /// Predicted clock time next to a scheduled one it differs from.
    TimeWithSchedule {
        time: DateTime<Utc>,
        scheduled: DateTime<Utc>,
        headline: bool,
    },
}

/// Whole minutes until `time`, rounding half a minute up.
fn minutes_until(now: DateTime<Utc>, time: DateTime<Utc>) -> i64 {
    (time - now).num_seconds().saturating_add(30).div_euclid(60)
}

fn same_minute(a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
    a.timestamp().div_euclid(60) == b.timestamp().div_euclid(60)
}

impl TripInstantDisplay {
    /// Decide how `trip` is shown at `now`.
    ///
    /// A prediction status always wins. Then skipped and cancelled stops,
    /// then the vehicle's proximity, then a minute count, and finally a
    /// clock time for anything far enough out. Subway trips without a
    /// prediction are hidden outside trip details.
    pub fn for_trip(
        trip: &UpcomingTrip,
        route_type: RouteType,
        now: DateTime<Utc>,
        context: DisplayContext,
    ) -> Self {
        let prediction = trip.prediction();
        let schedule = trip.schedule();

        let allow_arrival_only = context == DisplayContext::TripDetails;
        let schedule_based = matches!(route_type, RouteType::CommuterRail | RouteType::Ferry);
        let force_as_time = context == DisplayContext::TripDetails || schedule_based;
        let headline = schedule_based && context != DisplayContext::TripDetails;
        let prediction_time = prediction.and_then(|p| p.stop_time_after(now));
        let schedule_time = schedule.and_then(|s| s.stop_time_after(now));

        if let Some(status) = prediction.and_then(|p| p.status.as_ref()) {
            return Self::Overridden(status.clone());
        }

        if prediction.is_some_and(|p| p.schedule_relationship == ScheduleRelationship::Skipped) {
            return match schedule.and_then(|s| s.stop_time()) {
                Some(time) => Self::Skipped(Some(time)),
                None => Self::Hidden,
            };
        }

        if prediction.is_some_and(|p| p.is_cancelled())
            && !route_type.is_subway()
            && context.shows_cancellations()
            && let Some(time) = schedule_time.filter(|t| *t >= now)
        {
            return Self::Cancelled(time);
        }

        let Some(prediction) = prediction else {
            return match (schedule, schedule_time) {
                (Some(s), Some(time)) if s.departure_time.is_some() || allow_arrival_only => {
                    if route_type.is_subway() && context != DisplayContext::TripDetails {
                        return Self::Hidden;
                    }
                    let minutes = minutes_until(now, time);
                    if force_as_time || minutes >= DISTANT_FUTURE_CUTOFF.num_minutes() {
                        Self::ScheduleTime { time, headline }
                    } else {
                        Self::ScheduleMinutes(minutes)
                    }
                }
                _ => Self::Hidden,
            };
        };

        let Some(time) = prediction_time else {
            return Self::Hidden;
        };
        if prediction.departure_time.is_none() && !allow_arrival_only {
            return Self::Hidden;
        }
        let remaining = time - now;
        let minutes = minutes_until(now, time);

        if force_as_time {
            if remaining < Duration::zero() {
                return Self::Hidden;
            }
            return match schedule_time {
                Some(scheduled)
                    if context == DisplayContext::StopDetailsFiltered
                        && !same_minute(scheduled, time) =>
                {
                    Self::TimeWithSchedule {
                        time,
                        scheduled,
                        headline,
                    }
                }
                _ => Self::Time { time, headline },
            };
        }

        if route_type == RouteType::Bus {
            return if remaining < Duration::zero() {
                Self::Hidden
            } else if remaining <= ARRIVAL_CUTOFF {
                Self::Now
            } else if remaining >= DISTANT_FUTURE_CUTOFF {
                Self::Time {
                    time,
                    headline: false,
                }
            } else {
                Self::Minutes(minutes)
            };
        }

        let arrived = prediction.has_arrived_but_not_departed(now);
        let boarding = trip.vehicle().is_some_and(|v| {
            v.current_status == CurrentStatus::StoppedAt
                && v.stop_id.as_ref() == Some(&prediction.stop_id)
                && v.trip_id.as_ref() == Some(&prediction.trip_id)
        });
        if boarding && (remaining <= BOARDING_CUTOFF || arrived) {
            return Self::Boarding;
        }
        if remaining < Duration::zero() {
            return Self::Hidden;
        }
        if remaining <= ARRIVAL_CUTOFF || arrived {
            return Self::Arriving;
        }
        if remaining <= APPROACH_CUTOFF {
            return Self::Approaching;
        }
        if remaining >= DISTANT_FUTURE_CUTOFF {
            return Self::Time {
                time,
                headline: false,
            };
        }
        Self::Minutes(minutes)
    }

    /// Rows that are never listed.
    pub fn is_hidden(&self) -> bool {
        matches!(self, Self::Hidden | Self::Skipped(_))
    }
}
