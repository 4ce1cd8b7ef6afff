//! Configuration for building route cards.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::display::DisplayContext;
use crate::domain::Position;

/// Where the cards are shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardContext {
    #[default]
    NearbyTransit,
    StopDetailsUnfiltered,
    StopDetailsFiltered,
    Favorites,
}

impl CardContext {
    pub fn display_context(self) -> DisplayContext {
        match self {
            CardContext::NearbyTransit | CardContext::Favorites => DisplayContext::NearbyTransit,
            CardContext::StopDetailsUnfiltered => DisplayContext::StopDetailsUnfiltered,
            CardContext::StopDetailsFiltered => DisplayContext::StopDetailsFiltered,
        }
    }

    /// Cancelled trips are only listed once a rider has picked a direction.
    pub fn hides_cancellations(self) -> bool {
        matches!(self, CardContext::NearbyTransit | CardContext::StopDetailsUnfiltered)
    }
}

/// Configuration parameters for one card build.
#[derive(Debug, Clone, PartialEq)]
pub struct CardConfig {
    pub context: CardContext,

    /// Non-typical patterns are only shown with a trip within this many
    /// minutes. `None` means any upcoming trip counts.
    pub hide_non_typical_beyond_mins: Option<i64>,

    /// Show alerts of Minor significance as well.
    pub include_minor_alerts: bool,

    /// Route or line ids the rider has pinned. Pinned cards sort first.
    pub pinned: BTreeSet<String>,

    /// Distances are measured from here. Without it, cards are not ordered
    /// by distance.
    pub sort_from: Option<Position>,
}

impl CardConfig {
    /// Create a configuration with the defaults for `context`.
    pub fn new(context: CardContext) -> Self {
        let hide_non_typical_beyond_mins = match context {
            CardContext::NearbyTransit | CardContext::StopDetailsUnfiltered => Some(120),
            CardContext::StopDetailsFiltered | CardContext::Favorites => None,
        };
        Self {
            context,
            hide_non_typical_beyond_mins,
            include_minor_alerts: matches!(
                context,
                CardContext::StopDetailsUnfiltered | CardContext::StopDetailsFiltered
            ),
            pinned: BTreeSet::new(),
            sort_from: None,
        }
    }

    pub fn with_pinned<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pinned.extend(ids.into_iter().map(Into::into));
        self
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.sort_from = Some(position);
        self
    }

    /// Returns the non-typical horizon as a Duration.
    pub fn hide_non_typical_beyond(&self) -> Option<Duration> {
        self.hide_non_typical_beyond_mins.map(Duration::minutes)
    }

    /// The instant beyond which non-typical service is hidden.
    pub fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.hide_non_typical_beyond().map(|d| now + d)
    }

    pub fn is_pinned(&self, id: &str) -> bool {
        self.pinned.contains(id)
    }
}

impl Default for CardConfig {
    fn default() -> Self {
        Self::new(CardContext::NearbyTransit)
    }
}
