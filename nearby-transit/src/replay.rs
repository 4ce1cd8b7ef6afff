//! Snapshot bundles replayed through the card pipeline.
//!
//! A bundle captures every input of one pipeline run in a single JSON
//! document, so a run can be reproduced from disk. A live snapshot that is
//! `null` or absent is treated as still loading.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::cards::{CardConfig, CardContext, CardRequest, CardResult, route_cards_for_stops};
use crate::domain::{Position, StopId};
use crate::reference::ReferenceIndex;
use crate::snapshot::{
    AlertSnapshot, Loadable, PredictionSnapshot, ReferenceSnapshot, ScheduleSnapshot,
};

/// Errors from loading a replay bundle.
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    /// The bundle file could not be read
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The bundle is not valid JSON of the expected shape
    #[error("invalid bundle: {0}")]
    Json(#[from] serde_json::Error),

    /// A bundle must name at least one stop
    #[error("bundle lists no stops")]
    EmptyStopList,
}

/// All inputs of one pipeline run.
#[derive(Debug, Clone, Deserialize)]
pub struct ReplayBundle {
    pub reference: ReferenceSnapshot,
    #[serde(default)]
    pub schedules: Option<ScheduleSnapshot>,
    #[serde(default)]
    pub predictions: Option<PredictionSnapshot>,
    #[serde(default)]
    pub alerts: Option<AlertSnapshot>,
    /// Nearest first.
    pub stop_ids: Vec<StopId>,
    pub now: DateTime<Utc>,
    #[serde(default)]
    pub position: Option<Position>,
    #[serde(default)]
    pub context: CardContext,
    #[serde(default)]
    pub pinned: Vec<String>,
}

/// Read and validate a bundle from `path`.
pub fn load(path: impl AsRef<Path>) -> Result<ReplayBundle, ReplayError> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path).map_err(|source| ReplayError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let bundle = ReplayBundle::from_json(&json)?;
    debug!(
        path = %path.display(),
        stops = bundle.stop_ids.len(),
        routes = bundle.reference.routes.len(),
        "Loaded replay bundle"
    );
    Ok(bundle)
}

impl ReplayBundle {
    pub fn from_json(json: &str) -> Result<Self, ReplayError> {
        let bundle: ReplayBundle = serde_json::from_str(json)?;
        if bundle.stop_ids.is_empty() {
            return Err(ReplayError::EmptyStopList);
        }
        Ok(bundle)
    }

    /// The card configuration this bundle asks for.
    pub fn config(&self) -> CardConfig {
        let config = CardConfig::new(self.context).with_pinned(self.pinned.iter().cloned());
        match self.position {
            Some(position) => config.with_position(position),
            None => config,
        }
    }

    /// Run the pipeline over this bundle.
    pub fn run(&self) -> CardResult {
        let index = ReferenceIndex::from_snapshot(self.reference.clone());
        let schedules: Loadable<ScheduleSnapshot> = self.schedules.clone().into();
        let predictions: Loadable<PredictionSnapshot> = self.predictions.clone().into();
        let alerts: Loadable<AlertSnapshot> = self.alerts.clone().into();

        let request = CardRequest {
            index: &index,
            stop_ids: &self.stop_ids,
            schedules: &schedules,
            predictions: &predictions,
            alerts: &alerts,
            now: self.now,
        };
        route_cards_for_stops(&request, &self.config())
    }
}
