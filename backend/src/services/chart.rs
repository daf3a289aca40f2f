//! Time-series chart data for the last analysis.
//!
//! Only the data side: tabs, datasets and the date axis. Drawing is left to
//! whatever charting library consumes the JSON.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Serialize;

use crate::api::{AnalysisResult, IndexId};
use crate::models::indices::{index_info, is_landsat_only, IndexInfo};

/// Filter value selecting every charted index.
pub const ALL_FILTER: &str = "all";
pub const DEFAULT_CHART_COLOR: &str = "#2563eb";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartTab {
    pub filter: String,
    pub label: String,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartPoint {
    pub x: NaiveDate,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartDataset {
    pub index: IndexId,
    pub label: String,
    pub color: String,
    /// Landsat series are drawn dashed.
    pub dashed: bool,
    pub points: Vec<ChartPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub filter: String,
    pub labels: Vec<NaiveDate>,
    pub datasets: Vec<ChartDataset>,
}

fn chartable(index: &IndexId) -> Option<&'static IndexInfo> {
    index_info(index.as_str()).filter(|info| !info.is_true_color)
}

/// "All" followed by each requested index that has at least one value.
pub fn tabs(result: &AnalysisResult, requested: &[IndexId]) -> Vec<ChartTab> {
    let mut tabs = vec![ChartTab {
        filter: ALL_FILTER.to_string(),
        label: "All".to_string(),
        color: None,
    }];
    for index in requested {
        let Some(info) = chartable(index) else {
            continue;
        };
        if result.timeseries.iter().any(|t| t.value(index).is_some()) {
            tabs.push(ChartTab {
                filter: index.to_string(),
                label: info.short.to_string(),
                color: Some(info.chart_color.unwrap_or(DEFAULT_CHART_COLOR).to_string()),
            });
        }
    }
    tabs
}

/// Datasets for `filter` (`"all"` or a single index id).
pub fn chart_data(result: &AnalysisResult, requested: &[IndexId], filter: &str) -> ChartData {
    let shown: Vec<IndexId> = if filter == ALL_FILTER {
        requested.to_vec()
    } else {
        vec![IndexId::from(filter)]
    };

    let datasets = shown
        .iter()
        .filter_map(|index| {
            let info = chartable(index)?;
            let points: Vec<ChartPoint> = result
                .timeseries
                .iter()
                .filter_map(|t| t.value(index).map(|y| ChartPoint { x: t.date, y }))
                .collect();
            if points.is_empty() {
                return None;
            }
            Some(ChartDataset {
                index: index.clone(),
                label: info.short.to_string(),
                color: info.chart_color.unwrap_or(DEFAULT_CHART_COLOR).to_string(),
                dashed: is_landsat_only(index.as_str()),
                points,
            })
        })
        .collect();

    let labels: BTreeSet<NaiveDate> = result.timeseries.iter().map(|t| t.date).collect();

    ChartData {
        filter: filter.to_string(),
        labels: labels.into_iter().collect(),
        datasets,
    }
}
