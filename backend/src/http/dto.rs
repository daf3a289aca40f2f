//! Request and response bodies for the HTTP API.
//!
//! Most responses reuse the service-layer types directly since they already
//! derive `Serialize`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub use crate::services::{
    ActiveAoi, AnalysisReport, BatchSummary, ChartData, ChartTab, OverlayLayer, OverlayMap,
    ParcelMatch, PixelReport, SessionSnapshot, StatusSnapshot,
};
pub use crate::storage::{PreferencesSnapshot, PreferencesUpdate, SavedField};

use crate::api::{CheckedItem, IndexId};
use crate::models::indices::IndexInfo;
use crate::models::DateRange;
use crate::services::AnalysisInput;

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Backend mode (`http` or `local`)
    pub backend: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldNameRequest {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldNameResponse {
    pub field_name: String,
}

/// Pasted polygon coordinates, `[[[lon, lat], ...]]` as text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoJsonRequest {
    pub coordinates: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParcelSearchRequest {
    pub query: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LocateRequest {
    pub lat: f64,
    pub lng: f64,
}

/// Analysis form. The date range only counts when both ends are given.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisRequest {
    #[serde(default)]
    pub field_name: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub indices: Vec<IndexId>,
}

impl From<AnalysisRequest> for AnalysisInput {
    fn from(request: AnalysisRequest) -> Self {
        let date_range = match (request.start_date, request.end_date) {
            (Some(start), Some(end)) => Some(DateRange::new(start, end)),
            _ => None,
        };
        AnalysisInput {
            field_name: request.field_name.unwrap_or_default(),
            date_range,
            indices: request.indices,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChartQuery {
    #[serde(default)]
    pub filter: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartResponse {
    pub tabs: Vec<ChartTab>,
    pub chart: ChartData,
}

/// Checked dates to load; `indices` defaults to the last analysis selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlayLoadRequest {
    pub items: Vec<CheckedItem>,
    #[serde(default)]
    pub indices: Option<Vec<IndexId>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OverlayLoadResponse {
    pub summary: BatchSummary,
    pub overlays: OverlayMap,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LayerVisibilityRequest {
    pub visible: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OpacityRequest {
    pub opacity: u8,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OpacityResponse {
    pub opacity: u8,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PixelRequest {
    pub lat: f64,
    pub lng: f64,
    pub zoom: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct SavedFieldListResponse {
    pub fields: Vec<SavedField>,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SavedFieldLoadResponse {
    pub field: SavedField,
    pub aoi: Option<ActiveAoi>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IndexCatalogResponse {
    pub indices: Vec<IndexInfo>,
    pub sentinel2: Vec<&'static str>,
    pub landsat: Vec<&'static str>,
}
