//! Area-of-interest sources.
//!
//! An AOI comes from exactly one of: parcel search, a map click resolved to a
//! parcel, pasted polygon coordinates, or a saved field. Each source produces
//! an [`ActiveAoi`]; the session swaps it in whole.

use log::{debug, info};
use serde::Serialize;

use super::error::{ExplorerError, ExplorerResult, PreconditionError};
use crate::api::{AreaOfInterest, BoundingBox, ParcelInfo, ParcelSearchResponse};
use crate::models::parse_pasted_coordinates;
use crate::remote::{ExplorerBackend, RemoteError};
use crate::storage::{FieldInfo, SavedField, SavedFields, StorageResult};

pub const SEARCH_NOT_FOUND: &str = "No parcel found. Check the ID or name.";
pub const SEARCH_EMPTY: &str = "No parcel found.";
pub const LOCATE_NOT_FOUND: &str =
    "No cadastral parcel found at this location. This service covers Poland only.";
pub const LOCATE_EMPTY: &str = "No parcel found at this location.";

/// Where the current AOI came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AoiSource {
    ParcelSearch { query: String, total: usize },
    MapClick { lat: f64, lng: f64 },
    Pasted { vertex_count: usize },
    SavedField { name: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveAoi {
    pub geometry: AreaOfInterest,
    pub source: AoiSource,
    pub info: Option<FieldInfo>,
    /// Extent to center the map on.
    pub bounds: Option<BoundingBox>,
}

/// The AOI an operation will send, provided one is set and well formed.
pub fn require_valid(aoi: Option<&AreaOfInterest>) -> Result<&AreaOfInterest, PreconditionError> {
    let aoi = aoi.ok_or(PreconditionError::MissingAoi)?;
    aoi.validate()
        .map_err(|e| PreconditionError::InvalidAoi(e.to_string()))?;
    Ok(aoi)
}

impl ActiveAoi {
    pub fn new(geometry: AreaOfInterest, source: AoiSource, info: Option<FieldInfo>) -> Self {
        let bounds = geometry.bounding_box();
        Self {
            geometry,
            source,
            info,
            bounds,
        }
    }

    fn from_parcel(parcel: &ParcelInfo, source: AoiSource) -> Self {
        Self::new(parcel.geojson.clone(), source, Some(FieldInfo::from(parcel)))
    }
}

/// Resolved parcel lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParcelMatch {
    pub parcel: ParcelInfo,
    /// Number of matches the service reported; only the first is used.
    pub total: usize,
    pub aoi: ActiveAoi,
}

fn lookup_error(err: RemoteError, not_found: &str) -> ExplorerError {
    if err.is_not_found() {
        ExplorerError::ParcelNotFound(not_found.to_string())
    } else {
        ExplorerError::Remote(err)
    }
}

fn first_result(
    response: ParcelSearchResponse,
    empty: &str,
) -> ExplorerResult<(ParcelInfo, usize)> {
    if response.count == 0 {
        return Err(ExplorerError::ParcelNotFound(empty.to_string()));
    }
    let total = response.count;
    response
        .results
        .into_iter()
        .next()
        .map(|p| (p, total))
        .ok_or_else(|| ExplorerError::ParcelNotFound(empty.to_string()))
}

/// Look a parcel up by id or "region number" and take the first match.
pub async fn search_parcel(backend: &dyn ExplorerBackend, query: &str) -> ExplorerResult<ParcelMatch> {
    let query = query.trim();
    if query.is_empty() {
        return Err(PreconditionError::EmptyParcelQuery.into());
    }
    let response = backend
        .search_parcel(query)
        .await
        .map_err(|e| lookup_error(e, SEARCH_NOT_FOUND))?;
    let (parcel, total) = first_result(response, SEARCH_EMPTY)?;
    info!(
        "Parcel search '{}' matched {} (first: {})",
        query, total, parcel.parcel_id
    );
    let aoi = ActiveAoi::from_parcel(
        &parcel,
        AoiSource::ParcelSearch {
            query: query.to_string(),
            total,
        },
    );
    Ok(ParcelMatch { parcel, total, aoi })
}

/// Resolve a map click to the cadastral parcel under it.
pub async fn locate_parcel(
    backend: &dyn ExplorerBackend,
    lat: f64,
    lng: f64,
) -> ExplorerResult<ParcelMatch> {
    let response = backend
        .locate_parcel(lat, lng)
        .await
        .map_err(|e| lookup_error(e, LOCATE_NOT_FOUND))?;
    let (parcel, total) = first_result(response, LOCATE_EMPTY)?;
    debug!("Located parcel {} at {:.5}, {:.5}", parcel.parcel_id, lat, lng);
    let aoi = ActiveAoi::from_parcel(&parcel, AoiSource::MapClick { lat, lng });
    Ok(ParcelMatch { parcel, total, aoi })
}

/// Polygon from pasted `[[[lon, lat], ...]]` text.
pub fn from_pasted(text: &str) -> ExplorerResult<ActiveAoi> {
    let pasted = parse_pasted_coordinates(text)?;
    Ok(ActiveAoi::new(
        pasted.aoi,
        AoiSource::Pasted {
            vertex_count: pasted.vertex_count,
        },
        None,
    ))
}

pub fn from_saved(field: &SavedField) -> ActiveAoi {
    ActiveAoi::new(
        field.geojson.clone(),
        AoiSource::SavedField {
            name: field.name.clone(),
        },
        field.info.clone(),
    )
}

/// Push the AOI to the saved-field list when the field has a name.
pub fn remember(
    saved: &SavedFields,
    field_name: &str,
    aoi: &ActiveAoi,
) -> StorageResult<Option<SavedField>> {
    let name = field_name.trim();
    if name.is_empty() {
        return Ok(None);
    }
    saved
        .save(name, aoi.geometry.clone(), aoi.info.clone())
        .map(Some)
}
