//! Pixel inspector: index values at a clicked map location.

use std::ops::RangeInclusive;

use chrono::NaiveDate;
use serde::Serialize;

use super::conditions::{evaluate, Condition};
use super::aoi::require_valid;
use super::error::PreconditionError;
use super::overlay_map::OverlayLayer;
use crate::api::{AreaOfInterest, IndexId, PixelQuery, PixelValues, Sensor};
use crate::models::indices::{format_stat_value, is_landsat_only, is_sentinel_only, short_name};

/// Map zoom levels at which pixel values are meaningful.
pub const INSPECT_ZOOM: RangeInclusive<u8> = 15..=19;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PixelReading {
    pub index: IndexId,
    pub short_name: String,
    pub value: f64,
    pub formatted: String,
    pub condition: Condition,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PixelReport {
    pub lat: f64,
    pub lng: f64,
    pub date: NaiveDate,
    pub sensor: Sensor,
    /// Empty when the service has no data at this location.
    pub readings: Vec<PixelReading>,
}

/// Requested indices the layer's sensor actually measures.
///
/// Stricter than overlay filtering: indices outside both sensor groups
/// (true color included) are dropped unless the sensor is unknown.
pub fn indices_for(requested: &[IndexId], sensor: &Sensor) -> Vec<IndexId> {
    requested
        .iter()
        .filter(|i| match sensor {
            Sensor::Sentinel2 => is_sentinel_only(i.as_str()),
            Sensor::Landsat => is_landsat_only(i.as_str()),
            Sensor::Other(_) => true,
        })
        .cloned()
        .collect()
}

/// Build the query for a click, or say why it cannot be made.
#[allow(clippy::too_many_arguments)]
pub fn build_query(
    lat: f64,
    lng: f64,
    zoom: u8,
    layer: Option<&OverlayLayer>,
    aoi: Option<&AreaOfInterest>,
    requested: Option<&[IndexId]>,
    cloud_cover: u8,
) -> Result<PixelQuery, PreconditionError> {
    let layer = layer.ok_or(PreconditionError::NoVisibleLayer)?;
    let aoi = require_valid(aoi)?;
    let requested = requested.ok_or(PreconditionError::NoAnalysis)?;
    let indices = indices_for(requested, &layer.sensor);
    if indices.is_empty() {
        return Err(PreconditionError::NoIndices);
    }
    if !INSPECT_ZOOM.contains(&zoom) {
        return Err(PreconditionError::ZoomOutOfRange {
            zoom,
            min: *INSPECT_ZOOM.start(),
        });
    }
    Ok(PixelQuery {
        lat,
        lng,
        date: layer.date,
        sensor: layer.sensor.clone(),
        indices,
        geojson: aoi.clone(),
        cloud_cover,
    })
}

pub fn annotate(query: &PixelQuery, values: PixelValues) -> PixelReport {
    let readings = values
        .values
        .into_iter()
        .map(|(index, value)| PixelReading {
            short_name: short_name(index.as_str()).to_string(),
            formatted: format_stat_value(index.as_str(), Some(value)),
            condition: evaluate(index.as_str(), Some(value)),
            index,
            value,
        })
        .collect();
    PixelReport {
        lat: query.lat,
        lng: query.lng,
        date: query.date,
        sensor: query.sensor.clone(),
        readings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn layer(index: &str, sensor: Sensor) -> OverlayLayer {
        OverlayLayer {
            id: "layer-1".into(),
            index: index.into(),
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            sensor,
            url: "https://tiles".into(),
            visible: true,
        }
    }

    fn ids(names: &[&str]) -> Vec<IndexId> {
        names.iter().map(|n| IndexId::from(*n)).collect()
    }

    #[test]
    fn test_indices_follow_layer_sensor() {
        let requested = ids(&["NDVI", "LST", "RGB", "EVI"]);
        assert_eq!(indices_for(&requested, &Sensor::Sentinel2), ids(&["NDVI", "EVI"]));
        assert_eq!(indices_for(&requested, &Sensor::Landsat), ids(&["LST"]));
        assert_eq!(indices_for(&requested, &Sensor::Other("MODIS".into())).len(), 4);
    }

    #[test]
    fn test_query_preconditions() {
        let aoi = AreaOfInterest::polygon(json!([[[19.0, 50.0], [19.1, 50.1], [19.0, 50.0]]]));
        let l = layer("NDVI", Sensor::Sentinel2);
        let requested = ids(&["NDVI", "LST"]);

        let err = build_query(50.0, 19.0, 16, None, Some(&aoi), Some(&requested), 20);
        assert_eq!(err, Err(PreconditionError::NoVisibleLayer));
        let err = build_query(50.0, 19.0, 16, Some(&l), None, Some(&requested), 20);
        assert_eq!(err, Err(PreconditionError::MissingAoi));
        let err = build_query(50.0, 19.0, 16, Some(&l), Some(&aoi), None, 20);
        assert_eq!(err, Err(PreconditionError::NoAnalysis));
        let err = build_query(50.0, 19.0, 12, Some(&l), Some(&aoi), Some(&requested), 20);
        assert_eq!(err, Err(PreconditionError::ZoomOutOfRange { zoom: 12, min: 15 }));

        let query = build_query(50.0, 19.0, 19, Some(&l), Some(&aoi), Some(&requested), 20).unwrap();
        assert_eq!(query.indices, ids(&["NDVI"]));
        assert_eq!(query.date, l.date);
    }

    #[test]
    fn test_annotate_formats_values() {
        let aoi = AreaOfInterest::polygon(json!([[[19.0, 50.0]]]));
        let l = layer("LST", Sensor::Landsat);
        let query = build_query(50.0, 19.0, 17, Some(&l), Some(&aoi), Some(&ids(&["LST"])), 20).unwrap();
        let values = PixelValues {
            values: [(IndexId::from("LST"), 23.46)].into_iter().collect(),
        };
        let report = annotate(&query, values);
        assert_eq!(report.readings.len(), 1);
        assert_eq!(report.readings[0].formatted, "23.5 °C");
    }
}
