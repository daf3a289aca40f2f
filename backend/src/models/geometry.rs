//! Area-of-interest geometry.
//!
//! The AOI is kept as a GeoJSON geometry object (`type` + `coordinates`) and
//! sent to the analysis service untouched. Helpers here cover the few things
//! the explorer needs to know about it locally: a bounding box for centering,
//! the vertex count of the outer ring, and parsing of pasted coordinates.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Errors raised while turning user input into an AOI.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error("Please paste coordinates")]
    EmptyInput,
    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),
}

/// GeoJSON geometry describing the field boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaOfInterest {
    #[serde(rename = "type")]
    pub geometry_type: String,
    pub coordinates: Value,
}

/// Axis-aligned extent in longitude/latitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lng: f64,
    pub min_lat: f64,
    pub max_lng: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    fn extend(&mut self, lng: f64, lat: f64) {
        self.min_lng = self.min_lng.min(lng);
        self.max_lng = self.max_lng.max(lng);
        self.min_lat = self.min_lat.min(lat);
        self.max_lat = self.max_lat.max(lat);
    }
}

impl AreaOfInterest {
    /// Build a `Polygon` geometry from a ring array.
    pub fn polygon(rings: Value) -> Self {
        Self {
            geometry_type: "Polygon".to_string(),
            coordinates: rings,
        }
    }

    /// Check the geometry carries a type and a non-empty coordinate array.
    pub fn validate(&self) -> Result<(), InputError> {
        if self.geometry_type.trim().is_empty() {
            return Err(InputError::InvalidGeometry("missing geometry type".into()));
        }
        match self.coordinates.as_array() {
            Some(items) if !items.is_empty() => Ok(()),
            _ => Err(InputError::InvalidGeometry("missing coordinates".into())),
        }
    }

    /// Extent over every position in the geometry, whatever its nesting depth.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let mut bbox: Option<BoundingBox> = None;
        visit_positions(&self.coordinates, &mut |lng, lat| match bbox.as_mut() {
            Some(b) => b.extend(lng, lat),
            None => {
                bbox = Some(BoundingBox {
                    min_lng: lng,
                    min_lat: lat,
                    max_lng: lng,
                    max_lat: lat,
                })
            }
        });
        bbox
    }

    /// Number of vertices in the first (outer) ring of a polygon.
    ///
    /// For a `MultiPolygon` the outer ring of the first polygon is counted.
    pub fn vertex_count(&self) -> usize {
        let outer = match self.geometry_type.as_str() {
            "MultiPolygon" => self.coordinates.get(0).and_then(|p| p.get(0)),
            _ => self.coordinates.get(0),
        };
        outer.and_then(Value::as_array).map_or(0, Vec::len)
    }
}

fn as_position(value: &Value) -> Option<(f64, f64)> {
    let items = value.as_array()?;
    if items.len() < 2 {
        return None;
    }
    let lng = items[0].as_f64()?;
    let lat = items[1].as_f64()?;
    Some((lng, lat))
}

fn visit_positions(value: &Value, f: &mut impl FnMut(f64, f64)) {
    if let Some((lng, lat)) = as_position(value) {
        f(lng, lat);
        return;
    }
    if let Some(items) = value.as_array() {
        for item in items {
            visit_positions(item, f);
        }
    }
}

/// Pasted-coordinates result: the polygon plus the outer ring size.
#[derive(Debug, Clone, PartialEq)]
pub struct PastedPolygon {
    pub aoi: AreaOfInterest,
    pub vertex_count: usize,
}

/// Parse a pasted ring array (`[[[lon, lat], ...]]`) into a polygon AOI.
pub fn parse_pasted_coordinates(text: &str) -> Result<PastedPolygon, InputError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(InputError::EmptyInput);
    }

    let value: Value = serde_json::from_str(text)
        .map_err(|e| InputError::InvalidCoordinates(format!("not valid JSON ({})", e)))?;

    let rings = value
        .as_array()
        .ok_or_else(|| InputError::InvalidCoordinates("expected an array of rings".into()))?;
    let outer = rings
        .first()
        .and_then(Value::as_array)
        .ok_or_else(|| InputError::InvalidCoordinates("expected an array of rings".into()))?;
    if !outer.first().is_some_and(Value::is_array) {
        return Err(InputError::InvalidCoordinates(
            "expected [[[lon, lat], ...]]".into(),
        ));
    }

    for (ring_idx, ring) in rings.iter().enumerate() {
        let vertices = ring.as_array().ok_or_else(|| {
            InputError::InvalidCoordinates(format!("ring {} is not an array", ring_idx))
        })?;
        for (vertex_idx, vertex) in vertices.iter().enumerate() {
            match as_position(vertex) {
                Some((lng, lat)) if lng.is_finite() && lat.is_finite() => {}
                _ => {
                    return Err(InputError::InvalidCoordinates(format!(
                        "vertex {} of ring {} is not a [lon, lat] pair",
                        vertex_idx, ring_idx
                    )))
                }
            }
        }
    }

    let aoi = AreaOfInterest::polygon(value);
    let vertex_count = aoi.vertex_count();
    Ok(PastedPolygon { aoi, vertex_count })
}
