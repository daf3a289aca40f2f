//! Results view built from an analysis response: summary tiles, missing-data
//! warnings and the observation dates grouped by sensor.

use chrono::NaiveDate;
use serde::Serialize;

use super::conditions::{evaluate, Condition};
use crate::api::{AnalysisResult, IndexId, Sensor};
use crate::models::indices::{format_stat_value, is_landsat_only, is_sentinel_only, short_name};

/// One period-average tile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryTile {
    pub index: IndexId,
    pub short_name: String,
    pub value: f64,
    pub formatted: String,
    pub condition: Condition,
}

/// Why a group of indices has no period value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingReason {
    /// The sensor was requested but produced no cloud-free observation.
    NoImages,
    /// Observations exist but the value could not be computed.
    CloudCover,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingGroup {
    pub sensor: Sensor,
    pub indices: Vec<IndexId>,
    pub reason: MissingReason,
    pub message: String,
}

/// Missing-data warning box.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingDataWarning {
    pub missing: usize,
    pub total: usize,
    pub title: String,
    pub groups: Vec<MissingGroup>,
    pub hint: String,
}

/// Observation dates for one sensor, in response order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateGroup {
    pub sensor: Sensor,
    pub label: &'static str,
    pub dates: Vec<NaiveDate>,
}

/// Everything the results panel shows for an analysis with data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultsView {
    pub tiles: Vec<SummaryTile>,
    pub warning: Option<MissingDataWarning>,
    pub date_groups: Vec<DateGroup>,
    pub observation_count: usize,
}

/// Tiles for every requested index with a non-null period value, in request order.
pub fn summary_tiles(result: &AnalysisResult, requested: &[IndexId]) -> Vec<SummaryTile> {
    requested
        .iter()
        .filter_map(|idx| {
            let value = result.summary_value(idx)?;
            Some(SummaryTile {
                index: idx.clone(),
                short_name: short_name(idx.as_str()).to_string(),
                value,
                formatted: format_stat_value(idx.as_str(), Some(value)),
                condition: evaluate(idx.as_str(), Some(value)),
            })
        })
        .collect()
}

fn join_short_names(indices: &[IndexId]) -> String {
    indices
        .iter()
        .map(|i| short_name(i.as_str()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn missing_group(
    sensor: Sensor,
    missing: Vec<IndexId>,
    sensor_requested: bool,
    observations: usize,
) -> MissingGroup {
    let names = join_short_names(&missing);
    let (reason, message) = if sensor_requested && observations == 0 {
        let message = match sensor {
            Sensor::Landsat => format!(
                "{}: no cloud-free Landsat 8/9 (thermal) images found. Thermal satellites revisit every 8-16 days.",
                names
            ),
            _ => format!(
                "{}: no cloud-free Sentinel-2 (optical) images found during this period.",
                names
            ),
        };
        (MissingReason::NoImages, message)
    } else {
        (
            MissingReason::CloudCover,
            format!("{}: could not be computed (likely persistent cloud cover).", names),
        )
    };
    MissingGroup {
        sensor,
        indices: missing,
        reason,
        message,
    }
}

/// Warning for requested indices whose period value is null.
///
/// Indices outside both sensor groups count towards the title but get no
/// line of their own; with no lines there is no warning.
pub fn missing_data_warning(
    result: &AnalysisResult,
    requested: &[IndexId],
    sentinel_count: usize,
    landsat_count: usize,
) -> Option<MissingDataWarning> {
    let missing: Vec<&IndexId> = requested
        .iter()
        .filter(|i| result.summary_value(i).is_none())
        .collect();
    if missing.is_empty() {
        return None;
    }

    let requested_s2 = requested.iter().any(|i| is_sentinel_only(i.as_str()));
    let requested_ls = requested.iter().any(|i| is_landsat_only(i.as_str()));
    let missing_s2: Vec<IndexId> = missing
        .iter()
        .filter(|i| is_sentinel_only(i.as_str()))
        .map(|i| (*i).clone())
        .collect();
    let missing_ls: Vec<IndexId> = missing
        .iter()
        .filter(|i| is_landsat_only(i.as_str()))
        .map(|i| (*i).clone())
        .collect();

    let mut groups = Vec::new();
    if !missing_s2.is_empty() {
        groups.push(missing_group(Sensor::Sentinel2, missing_s2, requested_s2, sentinel_count));
    }
    if !missing_ls.is_empty() {
        groups.push(missing_group(Sensor::Landsat, missing_ls, requested_ls, landsat_count));
    }
    if groups.is_empty() {
        return None;
    }

    Some(MissingDataWarning {
        missing: missing.len(),
        total: requested.len(),
        title: format!(
            "Missing data for {} of {} indices:",
            missing.len(),
            requested.len()
        ),
        groups,
        hint: "Try extending the date range or selecting a different time period.".to_string(),
    })
}

/// Optical dates first, then thermal; empty groups are left out.
pub fn date_groups(result: &AnalysisResult) -> Vec<DateGroup> {
    [(Sensor::Sentinel2, "Optical"), (Sensor::Landsat, "Thermal")]
        .into_iter()
        .filter_map(|(sensor, label)| {
            let dates: Vec<NaiveDate> = result
                .timeseries
                .iter()
                .filter(|t| t.sensor == sensor)
                .map(|t| t.date)
                .collect();
            (!dates.is_empty()).then_some(DateGroup {
                sensor,
                label,
                dates,
            })
        })
        .collect()
}

/// "No data" when there are no observations or every requested index is null.
pub fn is_empty_result(result: &AnalysisResult, requested: &[IndexId]) -> bool {
    result.timeseries.is_empty() || requested.iter().all(|i| result.summary_value(i).is_none())
}

pub fn build_view(result: &AnalysisResult, requested: &[IndexId]) -> ResultsView {
    let sentinel_count = result.count_for(&Sensor::Sentinel2);
    let landsat_count = result.count_for(&Sensor::Landsat);
    ResultsView {
        tiles: summary_tiles(result, requested),
        warning: missing_data_warning(result, requested, sentinel_count, landsat_count),
        date_groups: date_groups(result),
        observation_count: sentinel_count + landsat_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ObservationRecord;
    use std::collections::BTreeMap;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn result(summary: &[(&str, Option<f64>)], passes: &[(&str, Sensor)]) -> AnalysisResult {
        AnalysisResult {
            period_summary: summary
                .iter()
                .map(|(k, v)| (IndexId::from(*k), *v))
                .collect(),
            timeseries: passes
                .iter()
                .map(|(date, sensor)| ObservationRecord {
                    date: d(date),
                    sensor: sensor.clone(),
                    values: BTreeMap::new(),
                })
                .collect(),
        }
    }

    fn ids(names: &[&str]) -> Vec<IndexId> {
        names.iter().map(|n| IndexId::from(*n)).collect()
    }

    #[test]
    fn test_tiles_skip_null_and_keep_order() {
        let r = result(
            &[("NDVI", Some(0.62)), ("LST", None), ("CIre", Some(3.456))],
            &[("2024-05-01", Sensor::Sentinel2)],
        );
        let tiles = summary_tiles(&r, &ids(&["CIre", "LST", "NDVI"]));
        assert_eq!(tiles.len(), 2);
        assert_eq!(tiles[0].short_name, "CI-re");
        assert_eq!(tiles[0].formatted, "3.46");
        assert_eq!(tiles[1].condition.label, "Good");
    }

    #[test]
    fn test_warning_distinguishes_no_images_from_clouds() {
        let r = result(
            &[("NDVI", Some(0.6)), ("NDRE", None), ("LST", None)],
            &[("2024-05-01", Sensor::Sentinel2)],
        );
        let requested = ids(&["NDVI", "NDRE", "LST"]);
        let warning = missing_data_warning(&r, &requested, 1, 0).unwrap();
        assert_eq!(warning.title, "Missing data for 2 of 3 indices:");
        assert_eq!(warning.groups.len(), 2);
        assert_eq!(warning.groups[0].reason, MissingReason::CloudCover);
        assert_eq!(warning.groups[0].indices, ids(&["NDRE"]));
        assert_eq!(warning.groups[1].reason, MissingReason::NoImages);
        assert!(warning.groups[1].message.starts_with("LST: no cloud-free Landsat"));
    }

    #[test]
    fn test_no_warning_when_only_true_color_missing() {
        let r = result(&[("NDVI", Some(0.6))], &[("2024-05-01", Sensor::Sentinel2)]);
        assert!(missing_data_warning(&r, &ids(&["NDVI", "RGB"]), 1, 0).is_none());
    }

    #[test]
    fn test_empty_result_detection() {
        let requested = ids(&["NDVI", "EVI"]);
        let no_passes = result(&[("NDVI", Some(0.5))], &[]);
        assert!(is_empty_result(&no_passes, &requested));

        let all_null = result(&[("NDVI", None)], &[("2024-05-01", Sensor::Sentinel2)]);
        assert!(is_empty_result(&all_null, &requested));

        let partial = result(&[("NDVI", None), ("EVI", Some(0.3))], &[("2024-05-01", Sensor::Sentinel2)]);
        assert!(!is_empty_result(&partial, &requested));
    }

    #[test]
    fn test_date_groups_order() {
        let r = result(
            &[],
            &[
                ("2024-05-03", Sensor::Landsat),
                ("2024-05-01", Sensor::Sentinel2),
                ("2024-05-06", Sensor::Sentinel2),
            ],
        );
        let groups = date_groups(&r);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].sensor, Sensor::Sentinel2);
        assert_eq!(groups[0].dates, vec![d("2024-05-01"), d("2024-05-06")]);
        assert_eq!(groups[1].label, "Thermal");
    }
}
