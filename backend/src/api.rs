//! Public API surface for the explorer.
//!
//! Wire and domain types shared by the remote client, the service layer and
//! the HTTP API. All types derive Serialize/Deserialize for JSON serialization;
//! field names follow the remote analysis service.

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub use crate::models::geometry::{AreaOfInterest, BoundingBox};

/// Vegetation / drought index identifier (e.g. `NDVI`, `LST`, `RGB`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndexId(String);

impl IndexId {
    pub fn new(value: impl Into<String>) -> Self {
        IndexId(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IndexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for IndexId {
    fn from(value: &str) -> Self {
        IndexId(value.to_string())
    }
}

impl From<String> for IndexId {
    fn from(value: String) -> Self {
        IndexId(value)
    }
}

impl Borrow<str> for IndexId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for IndexId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for IndexId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Satellite platform that produced an observation.
///
/// Serialized with the names the analysis service uses (`"Sentinel-2"`,
/// `"Landsat 8/9"`); the short aliases `S2`/`optical` and `L8/9`/`thermal`
/// are accepted on input. Any other name is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Sensor {
    /// Sentinel-2 MSI (optical, vegetation indices)
    Sentinel2,
    /// Landsat 8/9 (thermal, drought indices)
    Landsat,
    /// Unrecognised platform; accepts every index
    Other(String),
}

impl Sensor {
    pub fn name(&self) -> &str {
        match self {
            Sensor::Sentinel2 => "Sentinel-2",
            Sensor::Landsat => "Landsat 8/9",
            Sensor::Other(name) => name,
        }
    }

    /// Short tag shown next to overlay entries.
    pub fn tag(&self) -> &str {
        match self {
            Sensor::Sentinel2 => "S2",
            Sensor::Landsat => "L8/9",
            Sensor::Other(name) => name,
        }
    }
}

impl From<String> for Sensor {
    fn from(value: String) -> Self {
        match value.trim() {
            "Sentinel-2" | "S2" | "optical" => Sensor::Sentinel2,
            "Landsat 8/9" | "Landsat" | "L8/9" | "thermal" => Sensor::Landsat,
            _ => Sensor::Other(value),
        }
    }
}

impl From<&str> for Sensor {
    fn from(value: &str) -> Self {
        Sensor::from(value.to_string())
    }
}

impl From<Sensor> for String {
    fn from(value: Sensor) -> Self {
        value.name().to_string()
    }
}

impl fmt::Display for Sensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Request body for `POST /calculate/biomass`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisQuery {
    pub field_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub indices: Vec<IndexId>,
    pub geojson: AreaOfInterest,
    pub cloud_cover: u8,
}

/// One cloud-free satellite pass found by the analysis service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationRecord {
    pub date: NaiveDate,
    pub sensor: Sensor,
    #[serde(default)]
    pub values: BTreeMap<IndexId, Option<f64>>,
}

impl ObservationRecord {
    pub fn value(&self, index: &IndexId) -> Option<f64> {
        self.values.get(index).copied().flatten()
    }
}

/// Response of `POST /calculate/biomass`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default)]
    pub period_summary: BTreeMap<IndexId, Option<f64>>,
    #[serde(default)]
    pub timeseries: Vec<ObservationRecord>,
}

impl AnalysisResult {
    /// Period average for an index; a missing key reads as null.
    pub fn summary_value(&self, index: &IndexId) -> Option<f64> {
        self.period_summary.get(index).copied().flatten()
    }

    pub fn count_for(&self, sensor: &Sensor) -> usize {
        self.timeseries.iter().filter(|t| &t.sensor == sensor).count()
    }
}

/// A (date, sensor) observation the user checked for map display.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CheckedItem {
    pub date: NaiveDate,
    pub sensor: Sensor,
}

impl CheckedItem {
    pub fn new(date: NaiveDate, sensor: impl Into<Sensor>) -> Self {
        Self {
            date,
            sensor: sensor.into(),
        }
    }
}

/// One overlay request per checked item, with the sensor-filtered indices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayRequest {
    pub date: NaiveDate,
    pub sensor: Sensor,
    pub indices: Vec<IndexId>,
}

/// Request body for `POST /visualize/batch`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualizeRequest {
    pub date: NaiveDate,
    pub sensor: Sensor,
    pub indices: Vec<IndexId>,
    pub geojson: AreaOfInterest,
    pub cloud_cover: u8,
}

/// Rendered tile layer for one index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerUrl {
    pub index_name: IndexId,
    pub layer_url: String,
}

/// Response of `POST /visualize/batch`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisualizeResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<f64>,
    #[serde(default)]
    pub layers: Vec<LayerUrl>,
}

/// Request body for `POST /api/pixel-value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PixelQuery {
    pub lat: f64,
    pub lng: f64,
    pub date: NaiveDate,
    pub sensor: Sensor,
    pub indices: Vec<IndexId>,
    pub geojson: AreaOfInterest,
    pub cloud_cover: u8,
}

/// Response of `POST /api/pixel-value`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PixelValues {
    #[serde(default)]
    pub values: BTreeMap<IndexId, f64>,
}

/// Cadastral parcel returned by the parcel search/locate endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParcelInfo {
    pub geojson: AreaOfInterest,
    #[serde(default)]
    pub parcel_id: String,
    #[serde(default)]
    pub voivodeship: String,
    #[serde(default)]
    pub county: String,
    #[serde(default)]
    pub commune: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub parcel: String,
}

/// Response of `GET /api/uldk/search` and `GET /api/uldk/locate`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParcelSearchResponse {
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub results: Vec<ParcelInfo>,
}
