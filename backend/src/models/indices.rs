//! Index catalog: sensor membership, display metadata and value formatting.

use serde::Serialize;

use crate::api::{IndexId, Sensor};

/// Pseudo-index requested with every overlay batch as a visual reference.
pub const TRUE_COLOR: &str = "RGB";

/// Indices computed from Sentinel-2 optical bands.
pub const SENTINEL2_INDICES: &[&str] = &[
    "NDVI", "NDRE", "GNDVI", "EVI", "SAVI", "CIre", "MTCI", "IRECI", "NDMI", "NMDI",
];

/// Indices computed from Landsat 8/9 thermal bands.
pub const LANDSAT_INDICES: &[&str] = &["LST", "VSWI", "TVDI", "TCI", "VHI"];

/// Display metadata for a single index.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct IndexInfo {
    pub id: &'static str,
    pub short: &'static str,
    pub full: &'static str,
    pub formula: &'static str,
    pub description: &'static str,
    /// Legend end labels (low, high).
    pub range: (&'static str, &'static str),
    pub chart_color: Option<&'static str>,
    pub is_true_color: bool,
}

const fn info(
    id: &'static str,
    short: &'static str,
    full: &'static str,
    formula: &'static str,
    description: &'static str,
    range: (&'static str, &'static str),
    chart_color: &'static str,
) -> IndexInfo {
    IndexInfo {
        id,
        short,
        full,
        formula,
        description,
        range,
        chart_color: Some(chart_color),
        is_true_color: false,
    }
}

static CATALOG: &[IndexInfo] = &[
    info("NDVI", "NDVI", "Normalized Difference Vegetation Index", "(B8 − B4) / (B8 + B4)",
        "Crops 0.1–0.3 early growth, 0.4–0.6 mid-season, 0.6–0.9 peak canopy.",
        ("-0.2", "1.0"), "#1a9850"),
    info("NDRE", "NDRE", "Normalized Difference Red Edge Index", "(B8 − B5) / (B8 + B5)",
        "Best at mid-to-late season; <0.2 bare soil, 0.2–0.6 developing, >0.6 healthy.",
        ("-0.2", "0.8"), "#6ece58"),
    info("GNDVI", "GNDVI", "Green Normalized Difference Vegetation Index", "(B8 − B3) / (B8 + B3)",
        "More sensitive to chlorophyll & nitrogen than NDVI in dense canopies.",
        ("-0.2", "0.9"), "#66bd63"),
    info("EVI", "EVI", "Enhanced Vegetation Index", "2.5 × (B8 − B4) / (B8 + 6·B4 − 7.5·B2 + 1)",
        "Healthy crops 0.2–0.8; corrects atmospheric & soil noise in high-LAI.",
        ("-0.2", "0.8"), "#74A901"),
    info("SAVI", "SAVI", "Soil Adjusted Vegetation Index", "1.5 × (B8 − B4) / (B8 + B4 + L)",
        "Best when canopy cover <40%; reduces soil brightness in sparse crops.",
        ("-0.2", "0.8"), "#35978f"),
    info("CIre", "CI-re", "Chlorophyll Index – Red Edge", "(B7 / B5) − 1",
        "Linear proxy for canopy chlorophyll; crops typically 1–8.",
        ("0", "10"), "#238443"),
    info("MTCI", "MTCI", "MERIS Terrestrial Chlorophyll Index", "(B6 − B5) / (B5 − B4)",
        "Near-linear with chlorophyll; crops 1–5, peak canopy ≈ 4–6.",
        ("0", "6"), "#e31a1c"),
    info("IRECI", "IRECI", "Inverted Red-Edge Chlorophyll Index", "(B7 − B4) / (B5 / B6)",
        "Four-band red-edge chlorophyll; crops ~0.2–2.5, dense canopy up to 3.",
        ("0", "3"), "#d7301f"),
    info("NDMI", "NDMI", "Normalized Difference Moisture Index", "(B8 − B11) / (B8 + B11)",
        "Leaf water content; <−0.2 dry stress, 0–0.4 adequate, >0.4 well-watered.",
        ("-0.8", "0.8"), "#2166ac"),
    info("NMDI", "NMDI", "Normalized Multi-band Drought Index", "(B8 − (B11 − B12)) / (B8 + (B11 − B12))",
        "Dual-SWIR drought monitor; higher values = more soil/vegetation moisture.",
        ("0", "1.0"), "#4575b4"),
    info("LST", "LST", "Land Surface Temperature", "Landsat ST_B10 → °C",
        "Thermal IR surface temp; crops stressed above 35 °C, optimal 15–30 °C.",
        ("0 °C", "45 °C"), "#e31a1c"),
    info("VSWI", "VSWI", "Vegetation Supply Water Index", "NDVI / LST (°C)",
        "Water-availability proxy; higher = well-watered, lower = drought stress.",
        ("0", "0.06"), "#1a9850"),
    info("TVDI", "TVDI", "Temperature–Vegetation Dryness Index", "(LST − LSTmin) / (LSTmax − LSTmin)",
        "Spatial moisture pattern; 0 = wet surface, 1 = dry/stressed surface.",
        ("0", "1"), "#b2182b"),
    info("TCI", "TCI", "Temperature Condition Index", "(LSTmax − LST) / (LSTmax − LSTmin) × 100",
        "Kogan (1995); 0 % = extreme heat stress, 100 % = cool optimal.",
        ("0", "100"), "#fc8d59"),
    info("VHI", "VHI", "Vegetation Health Index", "0.5 × VCI + 0.5 × TCI",
        "Composite; <40 drought, 40–60 fair, >60 healthy vegetation.",
        ("0", "100"), "#66bd63"),
    IndexInfo {
        id: TRUE_COLOR,
        short: "RGB",
        full: "True Color Composite",
        formula: "Red / Green / Blue",
        description: "Natural-color satellite scene for visual reference.",
        range: ("Dark", "Bright"),
        chart_color: None,
        is_true_color: true,
    },
];

/// Every known index, in catalog order.
pub fn catalog() -> &'static [IndexInfo] {
    CATALOG
}

/// Look up display metadata; `None` for unknown ids.
pub fn index_info(index: &str) -> Option<&'static IndexInfo> {
    CATALOG.iter().find(|i| i.id == index)
}

/// Short display name, falling back to the raw id.
pub fn short_name(index: &str) -> &str {
    index_info(index).map_or(index, |i| i.short)
}

pub fn is_true_color(index: &str) -> bool {
    index == TRUE_COLOR
}

pub fn is_sentinel_only(index: &str) -> bool {
    SENTINEL2_INDICES.contains(&index)
}

pub fn is_landsat_only(index: &str) -> bool {
    LANDSAT_INDICES.contains(&index)
}

/// Whether `index` can be rendered from an observation of `sensor`.
///
/// The two membership sets are disjoint; an index in neither set is valid for
/// every sensor.
pub fn is_valid_for(index: &str, sensor: &Sensor) -> bool {
    match sensor {
        Sensor::Sentinel2 => !is_landsat_only(index),
        Sensor::Landsat => !is_sentinel_only(index),
        Sensor::Other(_) => true,
    }
}

/// Keep only the indices valid for `sensor`, preserving order.
pub fn filter_for_sensor(indices: &[IndexId], sensor: &Sensor) -> Vec<IndexId> {
    indices
        .iter()
        .filter(|idx| is_valid_for(idx.as_str(), sensor))
        .cloned()
        .collect()
}

/// Format a period or pixel value the way summary tiles display it.
pub fn format_stat_value(index: &str, value: Option<f64>) -> String {
    let Some(v) = value else {
        return "N/A".to_string();
    };
    match index {
        "LST" => format!("{:.1} °C", v),
        "TCI" | "VHI" => format!("{:.1} %", v),
        "VSWI" => format!("{:.4}", v),
        "CIre" | "MTCI" | "IRECI" => format!("{:.2}", v),
        _ => format!("{:.3}", v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership_is_disjoint() {
        for idx in SENTINEL2_INDICES {
            assert!(!LANDSAT_INDICES.contains(idx), "{} in both sets", idx);
        }
        assert_eq!(catalog().len(), SENTINEL2_INDICES.len() + LANDSAT_INDICES.len() + 1);
    }

    #[test]
    fn test_validity_by_sensor() {
        assert!(is_valid_for("NDVI", &Sensor::Sentinel2));
        assert!(!is_valid_for("LST", &Sensor::Sentinel2));
        assert!(is_valid_for("LST", &Sensor::Landsat));
        assert!(!is_valid_for("NDVI", &Sensor::Landsat));
        // Unknown and true-color ids are universally valid.
        assert!(is_valid_for("RGB", &Sensor::Landsat));
        assert!(is_valid_for("FOO", &Sensor::Sentinel2));
        assert!(is_valid_for("LST", &Sensor::Other("MODIS".into())));
    }

    #[test]
    fn test_filter_preserves_order() {
        let selected: Vec<IndexId> = ["LST", "NDVI", "TCI", "EVI"]
            .into_iter()
            .map(IndexId::from)
            .collect();
        let s2 = filter_for_sensor(&selected, &Sensor::Sentinel2);
        assert_eq!(s2, vec![IndexId::from("NDVI"), IndexId::from("EVI")]);
        let ls = filter_for_sensor(&selected, &Sensor::Landsat);
        assert_eq!(ls, vec![IndexId::from("LST"), IndexId::from("TCI")]);
    }

    #[test]
    fn test_format_stat_value() {
        assert_eq!(format_stat_value("NDVI", None), "N/A");
        assert_eq!(format_stat_value("LST", Some(27.345)), "27.3 °C");
        assert_eq!(format_stat_value("VHI", Some(55.0)), "55.0 %");
        assert_eq!(format_stat_value("VSWI", Some(0.031234)), "0.0312");
        assert_eq!(format_stat_value("MTCI", Some(3.14159)), "3.14");
        assert_eq!(format_stat_value("NDVI", Some(0.61)), "0.610");
    }

    #[test]
    fn test_short_names() {
        assert_eq!(short_name("CIre"), "CI-re");
        assert_eq!(short_name("UNKNOWN"), "UNKNOWN");
        assert!(index_info("RGB").unwrap().is_true_color);
    }
}
