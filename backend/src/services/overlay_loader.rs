//! Batched overlay loading with partial-failure accounting.
//!
//! One `/visualize/batch` request per checked `(date, sensor)` item, all in
//! flight at once. Each request settles to an [`OverlayBatchOutcome`]; a
//! failure never aborts the others. Once every request has settled the
//! outcomes are put back into checked-item order and applied to the
//! [`OverlayMap`] one by one:
//!
//! - every returned layer is added to the map
//! - the first non-true-color layer becomes visible and the active legend
//! - progress moves from 5 to 95 as items are applied, then to 100
//!
//! The batch then ends as [`BatchStatus::Failed`], [`BatchStatus::Partial`]
//! or [`BatchStatus::Loaded`].

use chrono::NaiveDate;
use futures::stream::{FuturesUnordered, StreamExt};
use log::{debug, info, warn};
use serde::Serialize;

use super::aoi::require_valid;
use super::error::PreconditionError;
use super::overlay_map::OverlayMap;
use super::status::{ProgressSink, StatusKind};
use crate::api::{
    AreaOfInterest, CheckedItem, IndexId, OverlayRequest, Sensor, VisualizeRequest,
    VisualizeResponse,
};
use crate::models::indices::{filter_for_sensor, is_true_color, TRUE_COLOR};
use crate::remote::{ExplorerBackend, RemoteError};

/// Progress reserved for setup before the batch starts.
pub const PROGRESS_START: u8 = 5;
/// Share of the progress bar spread across batch items.
pub const PROGRESS_SPAN: f64 = 90.0;

/// How one item of the batch settled.
#[derive(Debug, Clone)]
pub enum ItemOutcome {
    Ok(VisualizeResponse),
    Error(RemoteError),
}

/// Settled request for one checked item.
#[derive(Debug, Clone)]
pub struct OverlayBatchOutcome {
    /// Index of the item in the original selection.
    pub position: usize,
    pub date: NaiveDate,
    pub sensor: Sensor,
    pub outcome: ItemOutcome,
}

impl OverlayBatchOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self.outcome, ItemOutcome::Ok(_))
    }
}

/// Terminal state of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum BatchStatus {
    /// No layer could be added.
    Failed,
    /// Some items failed, some layers were added.
    Partial { loaded: usize, failed: usize },
    /// Every item succeeded.
    Loaded { loaded: usize },
}

impl BatchStatus {
    pub fn classify(loaded: usize, failed: usize) -> Self {
        if loaded == 0 {
            BatchStatus::Failed
        } else if failed > 0 {
            BatchStatus::Partial { loaded, failed }
        } else {
            BatchStatus::Loaded { loaded }
        }
    }

    pub fn kind(&self) -> StatusKind {
        match self {
            BatchStatus::Failed => StatusKind::Error,
            BatchStatus::Partial { .. } => StatusKind::Warning,
            BatchStatus::Loaded { .. } => StatusKind::Success,
        }
    }

    pub fn message(&self) -> String {
        match self {
            BatchStatus::Failed => "Could not load any map layers. The selected dates may not have matching index data.".to_string(),
            BatchStatus::Partial { loaded, failed } => format!(
                "Map layers loaded ({} OK, {} date(s) failed). Toggle layers in the panel.",
                loaded, failed
            ),
            BatchStatus::Loaded { loaded } => format!(
                "Map ready: {} layers loaded. Toggle visibility in the layer panel.",
                loaded
            ),
        }
    }
}

/// Counters and outcome of an applied batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub status: BatchStatus,
    pub total: usize,
    pub loaded: usize,
    pub failed: usize,
    /// Id of the layer that was made visible, if any.
    pub first_visible: Option<String>,
}

/// One request per checked item with the selection narrowed to the item's
/// sensor, plus the true-color layer.
pub fn build_requests(items: &[CheckedItem], selected: &[IndexId]) -> Vec<OverlayRequest> {
    items
        .iter()
        .map(|item| {
            let mut indices = filter_for_sensor(selected, &item.sensor);
            if !indices.iter().any(|i| i.as_str() == TRUE_COLOR) {
                indices.push(IndexId::from(TRUE_COLOR));
            }
            OverlayRequest {
                date: item.date,
                sensor: item.sensor.clone(),
                indices,
            }
        })
        .collect()
}

/// Reject a batch that cannot start.
pub fn check_preconditions(
    items: &[CheckedItem],
    selected: &[IndexId],
    aoi: Option<&AreaOfInterest>,
) -> Result<(), PreconditionError> {
    if items.is_empty() {
        return Err(PreconditionError::NoDatesSelected);
    }
    require_valid(aoi)?;
    if selected.is_empty() {
        return Err(PreconditionError::NoIndices);
    }
    Ok(())
}

/// Issue every request concurrently and wait for all of them.
///
/// The returned outcomes are in request order regardless of completion order.
pub async fn fetch_all(
    backend: &dyn ExplorerBackend,
    aoi: &AreaOfInterest,
    cloud_cover: u8,
    requests: &[OverlayRequest],
) -> Vec<OverlayBatchOutcome> {
    let mut pending: FuturesUnordered<_> = requests
        .iter()
        .enumerate()
        .map(|(position, request)| {
            let body = VisualizeRequest {
                date: request.date,
                sensor: request.sensor.clone(),
                indices: request.indices.clone(),
                geojson: aoi.clone(),
                cloud_cover,
            };
            async move {
                let outcome = match backend.visualize_batch(&body).await {
                    Ok(response) => ItemOutcome::Ok(response),
                    Err(e) => {
                        warn!("Overlay batch failed for {} {}: {}", body.date, body.sensor, e);
                        ItemOutcome::Error(e)
                    }
                };
                OverlayBatchOutcome {
                    position,
                    date: body.date,
                    sensor: body.sensor,
                    outcome,
                }
            }
        })
        .collect();

    let mut outcomes = Vec::with_capacity(requests.len());
    while let Some(outcome) = pending.next().await {
        debug!("Overlay item {} settled (ok: {})", outcome.position, outcome.is_ok());
        outcomes.push(outcome);
    }
    outcomes.sort_by_key(|o| o.position);
    outcomes
}

fn progress_for(completed: usize, total: usize) -> u8 {
    let share = completed as f64 / total.max(1) as f64;
    (f64::from(PROGRESS_START) + PROGRESS_SPAN * share).round() as u8
}

/// Apply settled outcomes to `map` in order and classify the batch.
///
/// The map is expected to be freshly reset; layers are appended.
pub fn apply(
    outcomes: Vec<OverlayBatchOutcome>,
    map: &mut OverlayMap,
    sink: &dyn ProgressSink,
) -> BatchSummary {
    let total = outcomes.len();
    let mut completed = 0;
    let mut loaded = 0;
    let mut failed = 0;
    let mut first_visible: Option<String> = None;

    for item in outcomes {
        completed += 1;
        sink.progress(progress_for(completed, total));

        let response = match item.outcome {
            ItemOutcome::Ok(response) => response,
            ItemOutcome::Error(_) => {
                failed += 1;
                sink.report(
                    StatusKind::Loading,
                    &format!("Loading layers... {} / {} dates processed", completed, total),
                );
                continue;
            }
        };

        for layer in response.layers {
            let show = first_visible.is_none() && !is_true_color(layer.index_name.as_str());
            let index = layer.index_name.clone();
            let added = map.add_layer(
                layer.index_name,
                item.date,
                item.sensor.clone(),
                layer.layer_url,
                show,
            );
            if show {
                first_visible = Some(added.id.clone());
                map.set_active_legend(index.as_str());
            }
            loaded += 1;
        }

        let elapsed = response
            .elapsed_ms
            .filter(|ms| *ms > 0.0)
            .map(|ms| format!(" ({:.1}s)", ms / 1000.0))
            .unwrap_or_default();
        sink.report(
            StatusKind::Loading,
            &format!("Loading layers... {} / {} dates processed{}", completed, total, elapsed),
        );
    }

    sink.progress(100);
    let status = BatchStatus::classify(loaded, failed);
    sink.report(status.kind(), &status.message());
    info!(
        "Overlay batch finished: {} items, {} layers loaded, {} failed",
        total, loaded, failed
    );

    BatchSummary {
        status,
        total,
        loaded,
        failed,
        first_visible,
    }
}

/// Full load against a map owned by the caller: reset, fan out, apply.
///
/// Not additive: layers from any previous load are removed first.
pub async fn load(
    backend: &dyn ExplorerBackend,
    aoi: Option<&AreaOfInterest>,
    cloud_cover: u8,
    items: &[CheckedItem],
    selected: &[IndexId],
    map: &mut OverlayMap,
    sink: &dyn ProgressSink,
) -> Result<BatchSummary, PreconditionError> {
    check_preconditions(items, selected, aoi)?;
    let aoi = require_valid(aoi)?;

    sink.report(StatusKind::Loading, "Generating map overlays...");
    sink.progress(PROGRESS_START);
    map.reset();

    let requests = build_requests(items, selected);
    let outcomes = fetch_all(backend, aoi, cloud_cover, &requests).await;
    Ok(apply(outcomes, map, sink))
}
