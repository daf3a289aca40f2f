//! In-memory analysis service.
//!
//! `LocalBackend` answers every endpoint without network access. Replies can
//! be scripted per endpoint (and per `(date, sensor)` for overlay batches, with
//! an optional delay); anything unscripted gets deterministic synthetic data so
//! the explorer can run end to end in `local` mode. The most recent
//! [`MAX_RECORDED_CALLS`] calls and overlay completions are recorded.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::f64::consts::PI;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Datelike, Duration as ChronoDuration, NaiveDate};
use log::debug;
use parking_lot::Mutex;

use super::backend::ExplorerBackend;
use super::error::{Operation, RemoteError, RemoteResult};
use crate::api::{
    AnalysisQuery, AnalysisResult, CheckedItem, IndexId, LayerUrl, ObservationRecord,
    ParcelInfo, ParcelSearchResponse, PixelQuery, PixelValues, Sensor, VisualizeRequest,
    VisualizeResponse,
};
use crate::models::indices::{is_landsat_only, is_sentinel_only, is_true_color, is_valid_for};

const SENTINEL2_REVISIT_DAYS: i64 = 5;
const LANDSAT_REVISIT_DAYS: i64 = 8;
const LANDSAT_OFFSET_DAYS: i64 = 2;

/// Capacity of the call and completion logs; older entries are dropped.
pub const MAX_RECORDED_CALLS: usize = 500;

/// A call received by the backend, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    Analyze(AnalysisQuery),
    Visualize(VisualizeRequest),
    Pixel(PixelQuery),
    SearchParcel(String),
    LocateParcel { lat: f64, lng: f64 },
}

#[derive(Debug, Clone)]
struct Scripted<T> {
    delay: Duration,
    reply: RemoteResult<T>,
}

impl<T: Clone> Scripted<T> {
    async fn play(&self) -> RemoteResult<T> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.reply.clone()
    }
}

#[derive(Default)]
struct Scripts {
    analysis: Option<Scripted<AnalysisResult>>,
    visualize: HashMap<(NaiveDate, Sensor), Scripted<VisualizeResponse>>,
    pixel: Option<RemoteResult<PixelValues>>,
    parcels: Vec<ParcelInfo>,
}

#[derive(Default)]
pub struct LocalBackend {
    scripts: Mutex<Scripts>,
    calls: Mutex<VecDeque<RecordedCall>>,
    completions: Mutex<VecDeque<CheckedItem>>,
}

impl LocalBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a parcel that search and locate can find.
    pub fn with_parcel(self, parcel: ParcelInfo) -> Self {
        self.scripts.lock().parcels.push(parcel);
        self
    }

    pub fn script_analysis(&self, reply: RemoteResult<AnalysisResult>) {
        self.script_analysis_delayed(Duration::ZERO, reply);
    }

    pub fn script_analysis_delayed(&self, delay: Duration, reply: RemoteResult<AnalysisResult>) {
        self.scripts.lock().analysis = Some(Scripted { delay, reply });
    }

    /// Script the overlay reply for one `(date, sensor)` pair.
    pub fn script_visualize(
        &self,
        date: NaiveDate,
        sensor: Sensor,
        delay: Duration,
        reply: RemoteResult<VisualizeResponse>,
    ) {
        self.scripts
            .lock()
            .visualize
            .insert((date, sensor), Scripted { delay, reply });
    }

    pub fn script_pixel(&self, reply: RemoteResult<PixelValues>) {
        self.scripts.lock().pixel = Some(reply);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().iter().cloned().collect()
    }

    /// Overlay requests only, in dispatch order.
    pub fn visualize_requests(&self) -> Vec<VisualizeRequest> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                RecordedCall::Visualize(r) => Some(r.clone()),
                _ => None,
            })
            .collect()
    }

    /// `(date, sensor)` of each overlay request, in the order replies finished.
    pub fn visualize_completions(&self) -> Vec<CheckedItem> {
        self.completions.lock().iter().cloned().collect()
    }

    fn record(&self, call: RecordedCall) {
        push_bounded(&mut self.calls.lock(), call);
    }
}

fn push_bounded<T>(log: &mut VecDeque<T>, entry: T) {
    log.push_back(entry);
    if log.len() > MAX_RECORDED_CALLS {
        log.pop_front();
    }
}

#[async_trait]
impl ExplorerBackend for LocalBackend {
    async fn analyze(&self, query: &AnalysisQuery) -> RemoteResult<AnalysisResult> {
        self.record(RecordedCall::Analyze(query.clone()));
        let scripted = self.scripts.lock().analysis.clone();
        match scripted {
            Some(script) => script.play().await,
            None => Ok(synthetic_analysis(query)),
        }
    }

    async fn visualize_batch(&self, request: &VisualizeRequest) -> RemoteResult<VisualizeResponse> {
        self.record(RecordedCall::Visualize(request.clone()));
        let scripted = self
            .scripts
            .lock()
            .visualize
            .get(&(request.date, request.sensor.clone()))
            .cloned();
        let reply = match scripted {
            Some(script) => script.play().await,
            None => Ok(synthetic_layers(request)),
        };
        push_bounded(
            &mut self.completions.lock(),
            CheckedItem::new(request.date, request.sensor.clone()),
        );
        debug!(
            "local visualize {} {} -> {}",
            request.date,
            request.sensor,
            if reply.is_ok() { "ok" } else { "error" }
        );
        reply
    }

    async fn pixel_value(&self, query: &PixelQuery) -> RemoteResult<PixelValues> {
        self.record(RecordedCall::Pixel(query.clone()));
        if let Some(reply) = self.scripts.lock().pixel.clone() {
            return reply;
        }
        let values = query
            .indices
            .iter()
            .filter(|idx| is_valid_for(idx.as_str(), &query.sensor))
            .filter_map(|idx| synthetic_value(idx.as_str(), query.date).map(|v| (idx.clone(), v)))
            .collect();
        Ok(PixelValues { values })
    }

    async fn search_parcel(&self, query: &str) -> RemoteResult<ParcelSearchResponse> {
        self.record(RecordedCall::SearchParcel(query.to_string()));
        let needle = query.trim().to_lowercase();
        let results: Vec<ParcelInfo> = self
            .scripts
            .lock()
            .parcels
            .iter()
            .filter(|p| {
                p.parcel_id.to_lowercase().contains(&needle)
                    || format!("{} {}", p.region, p.parcel).to_lowercase() == needle
            })
            .cloned()
            .collect();
        if results.is_empty() {
            return Err(RemoteError::not_found(Operation::SearchParcel, "No parcel found"));
        }
        Ok(ParcelSearchResponse {
            count: results.len(),
            results,
        })
    }

    async fn locate_parcel(&self, lat: f64, lng: f64) -> RemoteResult<ParcelSearchResponse> {
        self.record(RecordedCall::LocateParcel { lat, lng });
        let hit = self.scripts.lock().parcels.iter().find(|p| {
            p.geojson.bounding_box().is_some_and(|b| {
                (b.min_lat..=b.max_lat).contains(&lat) && (b.min_lng..=b.max_lng).contains(&lng)
            })
        })
        .cloned();
        match hit {
            Some(parcel) => Ok(ParcelSearchResponse {
                count: 1,
                results: vec![parcel],
            }),
            None => Err(RemoteError::not_found(
                Operation::LocateParcel,
                "No cadastral parcel found at this location",
            )),
        }
    }

    fn name(&self) -> &'static str {
        "local"
    }
}

/// Seasonal curve per index: `(baseline, amplitude)`.
fn seasonal_profile(index: &str) -> Option<(f64, f64)> {
    let profile = match index {
        "NDVI" => (0.55, 0.2),
        "NDRE" => (0.35, 0.12),
        "GNDVI" => (0.5, 0.15),
        "EVI" => (0.45, 0.2),
        "SAVI" => (0.4, 0.15),
        "CIre" => (3.5, 2.0),
        "MTCI" => (2.8, 1.2),
        "IRECI" => (1.2, 0.6),
        "NDMI" => (0.15, 0.15),
        "NMDI" => (0.5, 0.1),
        "LST" => (24.0, 8.0),
        "VSWI" => (0.025, 0.01),
        "TVDI" => (0.5, 0.2),
        "TCI" => (55.0, 20.0),
        "VHI" => (45.0, 15.0),
        _ => return None,
    };
    Some(profile)
}

fn synthetic_value(index: &str, date: NaiveDate) -> Option<f64> {
    let (baseline, amplitude) = seasonal_profile(index)?;
    // Peak around late June.
    let phase = 2.0 * PI * (date.ordinal() as f64 - 80.0) / 365.0;
    let value = baseline + amplitude * phase.sin();
    Some((value * 10_000.0).round() / 10_000.0)
}

fn observation_dates(start: NaiveDate, end: NaiveDate, offset: i64, step: i64) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    let mut current = start + ChronoDuration::days(offset);
    while current <= end {
        dates.push(current);
        current += ChronoDuration::days(step);
    }
    dates
}

fn synthetic_analysis(query: &AnalysisQuery) -> AnalysisResult {
    let wants = |pred: fn(&str) -> bool| query.indices.iter().any(|i| pred(i.as_str()));
    let mut timeseries = Vec::new();

    let mut passes: Vec<(NaiveDate, Sensor)> = Vec::new();
    if wants(is_sentinel_only) {
        passes.extend(
            observation_dates(query.start_date, query.end_date, 0, SENTINEL2_REVISIT_DAYS)
                .into_iter()
                .map(|d| (d, Sensor::Sentinel2)),
        );
    }
    if wants(is_landsat_only) {
        passes.extend(
            observation_dates(query.start_date, query.end_date, LANDSAT_OFFSET_DAYS, LANDSAT_REVISIT_DAYS)
                .into_iter()
                .map(|d| (d, Sensor::Landsat)),
        );
    }
    passes.sort_by_key(|(d, _)| *d);

    for (date, sensor) in passes {
        let values: BTreeMap<IndexId, Option<f64>> = query
            .indices
            .iter()
            .filter(|i| !is_true_color(i.as_str()) && is_valid_for(i.as_str(), &sensor))
            .map(|i| (i.clone(), synthetic_value(i.as_str(), date)))
            .collect();
        timeseries.push(ObservationRecord {
            date,
            sensor,
            values,
        });
    }

    let period_summary = query
        .indices
        .iter()
        .filter(|i| !is_true_color(i.as_str()))
        .map(|i| {
            let samples: Vec<f64> = timeseries.iter().filter_map(|t| t.value(i)).collect();
            let mean = (!samples.is_empty())
                .then(|| samples.iter().sum::<f64>() / samples.len() as f64);
            (i.clone(), mean)
        })
        .collect();

    AnalysisResult {
        period_summary,
        timeseries,
    }
}

fn sensor_slug(sensor: &Sensor) -> String {
    match sensor {
        Sensor::Sentinel2 => "s2".to_string(),
        Sensor::Landsat => "landsat".to_string(),
        Sensor::Other(name) => name.to_lowercase().replace(|c: char| !c.is_alphanumeric(), "-"),
    }
}

fn synthetic_layers(request: &VisualizeRequest) -> VisualizeResponse {
    let layers = request
        .indices
        .iter()
        .map(|idx| LayerUrl {
            index_name: idx.clone(),
            layer_url: format!(
                "local://tiles/{}/{}/{}/{{z}}/{{x}}/{{y}}",
                sensor_slug(&request.sensor),
                request.date,
                idx
            ),
        })
        .collect();
    VisualizeResponse {
        elapsed_ms: Some(0.0),
        layers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::AreaOfInterest;
    use serde_json::json;

    fn aoi() -> AreaOfInterest {
        AreaOfInterest::polygon(json!([[[21.0, 52.0], [21.1, 52.0], [21.1, 52.1], [21.0, 52.0]]]))
    }

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[tokio::test]
    async fn test_synthetic_analysis_by_sensor() {
        let backend = LocalBackend::new();
        let query = AnalysisQuery {
            field_id: "F".into(),
            start_date: d("2024-05-01"),
            end_date: d("2024-05-31"),
            indices: vec!["NDVI".into(), "LST".into()],
            geojson: aoi(),
            cloud_cover: 20,
        };
        let result = backend.analyze(&query).await.unwrap();
        assert_eq!(result.count_for(&Sensor::Sentinel2), 7);
        assert_eq!(result.count_for(&Sensor::Landsat), 4);
        for record in &result.timeseries {
            match record.sensor {
                Sensor::Sentinel2 => assert!(!record.values.contains_key("LST")),
                _ => assert!(!record.values.contains_key("NDVI")),
            }
        }
        assert!(result.summary_value(&"NDVI".into()).is_some());
        assert_eq!(backend.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_scripted_visualize_failure() {
        let backend = LocalBackend::new();
        backend.script_visualize(
            d("2024-05-09"),
            Sensor::Sentinel2,
            Duration::ZERO,
            Err(RemoteError::status(Operation::VisualizeBatch, 500, None)),
        );
        let mut request = VisualizeRequest {
            date: d("2024-05-09"),
            sensor: Sensor::Sentinel2,
            indices: vec!["NDVI".into(), "RGB".into()],
            geojson: aoi(),
            cloud_cover: 20,
        };
        assert!(backend.visualize_batch(&request).await.is_err());
        request.date = d("2024-05-01");
        let ok = backend.visualize_batch(&request).await.unwrap();
        assert_eq!(ok.layers.len(), 2);
        assert_eq!(backend.visualize_completions().len(), 2);
    }

    #[tokio::test]
    async fn test_recorded_logs_are_bounded() {
        let backend = LocalBackend::new();
        let start = d("2024-01-01");
        for offset in 0..(MAX_RECORDED_CALLS as i64 + 20) {
            let request = VisualizeRequest {
                date: start + ChronoDuration::days(offset),
                sensor: Sensor::Sentinel2,
                indices: vec!["NDVI".into()],
                geojson: aoi(),
                cloud_cover: 20,
            };
            backend.visualize_batch(&request).await.unwrap();
        }

        let calls = backend.calls();
        let completions = backend.visualize_completions();
        assert_eq!(calls.len(), MAX_RECORDED_CALLS);
        assert_eq!(completions.len(), MAX_RECORDED_CALLS);
        let last = start + ChronoDuration::days(MAX_RECORDED_CALLS as i64 + 19);
        assert_eq!(completions.last().map(|c| c.date), Some(last));
        assert_eq!(backend.visualize_requests()[0].date, start + ChronoDuration::days(20));
    }

    #[tokio::test]
    async fn test_parcel_lookup() {
        let parcel = ParcelInfo {
            geojson: aoi(),
            parcel_id: "141201_1.0001.123".into(),
            voivodeship: "mazowieckie".into(),
            county: "".into(),
            commune: "Gmina".into(),
            region: "Obręb".into(),
            parcel: "123".into(),
        };
        let backend = LocalBackend::new().with_parcel(parcel);
        let found = backend.search_parcel("0001.123").await.unwrap();
        assert_eq!(found.count, 1);
        assert!(backend.locate_parcel(52.05, 21.05).await.is_ok());
        assert!(backend.locate_parcel(50.0, 19.0).await.unwrap_err().is_not_found());
        assert!(backend.search_parcel("nothing").await.unwrap_err().is_not_found());
    }
}
