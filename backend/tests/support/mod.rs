#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};

use axum::Router;
use chrono::NaiveDate;
use serde_json::json;

use biomass_explorer::api::{
    AnalysisResult, AreaOfInterest, IndexId, LayerUrl, ObservationRecord, ParcelInfo, Sensor,
    VisualizeResponse,
};
use biomass_explorer::config::ExplorerConfig;
use biomass_explorer::remote::{BackendType, ExplorerBackend, LocalBackend};
use biomass_explorer::services::ExplorerSession;
use biomass_explorer::storage::{KeyValueStore, MemoryStore};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// This is panic-safe (restores variables on unwind) and also serializes access to
/// process-global env vars to avoid flaky tests when Rust runs tests in parallel.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

// =============================================================================
// Fake upstream analysis service
// =============================================================================

/// Serve `router` on an ephemeral localhost port and return its base URL.
///
/// The server lives until the test runtime shuts down.
pub async fn spawn_upstream(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    format!("http://{}", addr)
}

// =============================================================================
// Fixtures
// =============================================================================

pub const FIELD_RING: &str = "[[[21.0, 52.0], [21.1, 52.0], [21.1, 52.1], [21.0, 52.1], [21.0, 52.0]]]";

pub fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("valid date")
}

pub fn ids(names: &[&str]) -> Vec<IndexId> {
    names.iter().map(|n| IndexId::from(*n)).collect()
}

pub fn field_aoi() -> AreaOfInterest {
    AreaOfInterest::polygon(json!([[
        [21.0, 52.0],
        [21.1, 52.0],
        [21.1, 52.1],
        [21.0, 52.1],
        [21.0, 52.0]
    ]]))
}

pub fn parcel() -> ParcelInfo {
    ParcelInfo {
        geojson: field_aoi(),
        parcel_id: "141201_1.0001.123/4".to_string(),
        voivodeship: "mazowieckie".to_string(),
        county: "warszawski zachodni".to_string(),
        commune: "Izabelin".to_string(),
        region: "Hornówek".to_string(),
        parcel: "123/4".to_string(),
    }
}

pub fn observation(date: &str, sensor: Sensor, values: &[(&str, Option<f64>)]) -> ObservationRecord {
    ObservationRecord {
        date: d(date),
        sensor,
        values: values
            .iter()
            .map(|(k, v)| (IndexId::from(*k), *v))
            .collect(),
    }
}

pub fn analysis_result(
    summary: &[(&str, Option<f64>)],
    timeseries: Vec<ObservationRecord>,
) -> AnalysisResult {
    AnalysisResult {
        period_summary: summary
            .iter()
            .map(|(k, v)| (IndexId::from(*k), *v))
            .collect::<BTreeMap<_, _>>(),
        timeseries,
    }
}

/// Reply with one tile layer per index, in the given order.
pub fn layers(date: &str, indices: &[&str]) -> VisualizeResponse {
    VisualizeResponse {
        elapsed_ms: Some(1200.0),
        layers: indices
            .iter()
            .map(|idx| LayerUrl {
                index_name: IndexId::from(*idx),
                layer_url: format!("https://tiles.test/{}/{}/{{z}}/{{x}}/{{y}}", date, idx),
            })
            .collect(),
    }
}

pub fn local_config() -> ExplorerConfig {
    ExplorerConfig {
        backend_type: BackendType::Local,
        ..ExplorerConfig::default()
    }
}

/// Session over a scriptable local backend and an in-memory store.
pub fn local_session() -> (Arc<LocalBackend>, Arc<ExplorerSession>) {
    let backend = Arc::new(LocalBackend::new().with_parcel(parcel()));
    let session = session_with(backend.clone(), Arc::new(MemoryStore::new()));
    (backend, session)
}

pub fn session_with(
    backend: Arc<dyn ExplorerBackend>,
    store: Arc<dyn KeyValueStore>,
) -> Arc<ExplorerSession> {
    Arc::new(ExplorerSession::new(backend, local_config(), store).expect("session"))
}
