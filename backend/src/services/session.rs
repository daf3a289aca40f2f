//! Application state and the operations that change it.
//!
//! `ExplorerSession` owns the current AOI, the field name, the last analysis
//! and the overlay map. Everything goes through its methods; the state lock
//! is only taken between awaits, never across one.
//!
//! Analyses and overlay loads are not cancelled when a newer one starts.
//! Instead each start bumps a generation counter and a run whose generation
//! is stale when its requests settle is dropped without touching the state.

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use log::{debug, info, warn};
use parking_lot::RwLock;
use serde::Serialize;

use super::analysis::{
    self, AnalysisInput, AnalysisOutcome, AnalysisRecord, AnalysisReport, PROGRESS_STARTED,
    STATUS_SEARCHING,
};
use super::aoi::{self, ActiveAoi, ParcelMatch};
use super::chart::{self, ChartData, ChartTab};
use super::error::{ExplorerError, ExplorerResult, PreconditionError};
use super::overlay_loader::{self, BatchSummary};
use super::overlay_map::{OverlayLayer, OverlayMap};
use super::pixel::{self, PixelReport};
use super::status::{ProgressSink, StatusKind, StatusSnapshot, StatusTracker};
use crate::api::{CheckedItem, IndexId};
use crate::config::ExplorerConfig;
use crate::models::DateRange;
use crate::remote::{BackendFactory, ExplorerBackend};
use crate::storage::{
    FileStore, KeyValueStore, Preferences, PreferencesSnapshot, PreferencesUpdate, SavedField,
    SavedFields,
};

#[derive(Debug, Default)]
struct SessionState {
    aoi: Option<ActiveAoi>,
    field_name: String,
    last_analysis: Option<AnalysisRecord>,
    overlays: OverlayMap,
    overlay_generation: u64,
    analysis_generation: u64,
}

/// Last analysis as reported in the session snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisSummary {
    pub field_id: String,
    pub date_range: DateRange,
    pub requested_indices: Vec<IndexId>,
    pub elapsed_secs: f64,
    pub outcome: AnalysisOutcome,
}

impl From<&AnalysisRecord> for AnalysisSummary {
    fn from(record: &AnalysisRecord) -> Self {
        Self {
            field_id: record.field_id.clone(),
            date_range: record.date_range,
            requested_indices: record.requested_indices.clone(),
            elapsed_secs: record.elapsed.as_secs_f64(),
            outcome: record.outcome(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub field_name: String,
    pub aoi: Option<ActiveAoi>,
    pub status: StatusSnapshot,
    pub overlays: OverlayMap,
    pub analysis: Option<AnalysisSummary>,
}

/// Forwards progress only while its overlay load is still the current one.
struct GenerationSink<'a> {
    session: &'a ExplorerSession,
    generation: u64,
}

impl GenerationSink<'_> {
    fn is_current(&self) -> bool {
        self.session.state.read().overlay_generation == self.generation
    }
}

impl ProgressSink for GenerationSink<'_> {
    fn progress(&self, percent: u8) {
        if self.is_current() {
            self.session.status.set_progress(percent);
        }
    }

    fn report(&self, kind: StatusKind, message: &str) {
        if self.is_current() {
            self.session.status.set(kind, message);
        }
    }
}

pub struct ExplorerSession {
    backend: Arc<dyn ExplorerBackend>,
    config: ExplorerConfig,
    state: RwLock<SessionState>,
    saved_fields: SavedFields,
    preferences: Preferences,
    status: StatusTracker,
}

impl ExplorerSession {
    /// Start a session; bumps the persisted field counter once.
    pub fn new(
        backend: Arc<dyn ExplorerBackend>,
        config: ExplorerConfig,
        store: Arc<dyn KeyValueStore>,
    ) -> ExplorerResult<Self> {
        let preferences = Preferences::new(store.clone());
        let counter = preferences.next_field_number()?;
        debug!("Session started, field counter at {}", counter);
        Ok(Self {
            backend,
            config,
            state: RwLock::new(SessionState::default()),
            saved_fields: SavedFields::new(store),
            preferences,
            status: StatusTracker::new(),
        })
    }

    /// Session with the configured backend and a file store under `data_dir`.
    pub fn open(config: ExplorerConfig) -> ExplorerResult<Self> {
        let backend = BackendFactory::create(&config)?;
        let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::in_dir(&config.data_dir)?);
        info!(
            "Opening session with {} backend, data in {}",
            backend.name(),
            config.data_dir.display()
        );
        Self::new(backend, config, store)
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn config(&self) -> &ExplorerConfig {
        &self.config
    }

    pub fn status(&self) -> &StatusTracker {
        &self.status
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.read();
        SessionSnapshot {
            field_name: state.field_name.clone(),
            aoi: state.aoi.clone(),
            status: self.status.snapshot(),
            overlays: state.overlays.clone(),
            analysis: state.last_analysis.as_ref().map(AnalysisSummary::from),
        }
    }

    fn notify_failure(&self, err: &ExplorerError) {
        match err {
            ExplorerError::Superseded => {}
            e if e.is_user_input() => self.status.warning(e.user_message()),
            e => self.status.error(format!("Error: {}", e.user_message())),
        }
    }

    // ------------------------------------------------------------------
    // Field name and AOI
    // ------------------------------------------------------------------

    pub fn field_name(&self) -> String {
        self.state.read().field_name.clone()
    }

    pub fn set_field_name(&self, name: &str) {
        self.state.write().field_name = name.trim().to_string();
    }

    pub fn aoi(&self) -> Option<ActiveAoi> {
        self.state.read().aoi.clone()
    }

    /// Replace the AOI and remember it under the current field name.
    pub fn set_aoi(&self, aoi: ActiveAoi) -> ExplorerResult<ActiveAoi> {
        let field_name = {
            let mut state = self.state.write();
            state.aoi = Some(aoi.clone());
            state.field_name.clone()
        };
        if let Some(saved) = aoi::remember(&self.saved_fields, &field_name, &aoi)? {
            debug!("Remembered AOI as saved field '{}'", saved.name);
        }
        Ok(aoi)
    }

    pub async fn search_parcel(&self, query: &str) -> ExplorerResult<ParcelMatch> {
        let found = aoi::search_parcel(self.backend.as_ref(), query)
            .await
            .inspect_err(|e| self.notify_failure(e))?;
        self.set_aoi(found.aoi.clone())?;
        Ok(found)
    }

    pub async fn locate_parcel(&self, lat: f64, lng: f64) -> ExplorerResult<ParcelMatch> {
        let found = aoi::locate_parcel(self.backend.as_ref(), lat, lng)
            .await
            .inspect_err(|e| self.notify_failure(e))?;
        self.set_aoi(found.aoi.clone())?;
        Ok(found)
    }

    pub fn apply_pasted_coordinates(&self, text: &str) -> ExplorerResult<ActiveAoi> {
        let parsed = aoi::from_pasted(text)?;
        self.set_aoi(parsed)
    }

    // ------------------------------------------------------------------
    // Saved fields and preferences
    // ------------------------------------------------------------------

    pub fn saved_fields(&self) -> Vec<SavedField> {
        self.saved_fields.list()
    }

    /// Restore a saved field's name and boundary.
    pub fn load_saved_field(&self, index: usize) -> ExplorerResult<SavedField> {
        let field = self
            .saved_fields
            .get(index)
            .ok_or(PreconditionError::UnknownSavedField(index))?;
        self.set_field_name(&field.name);
        self.set_aoi(aoi::from_saved(&field))?;
        info!("Loaded saved field '{}'", field.name);
        Ok(field)
    }

    pub fn remove_saved_field(&self, index: usize) -> ExplorerResult<SavedField> {
        self.saved_fields
            .remove(index)?
            .ok_or_else(|| PreconditionError::UnknownSavedField(index).into())
    }

    pub fn preferences(&self) -> PreferencesSnapshot {
        self.preferences.snapshot()
    }

    pub fn update_preferences(&self, update: &PreferencesUpdate) -> ExplorerResult<PreferencesSnapshot> {
        Ok(self.preferences.apply(update)?)
    }

    // ------------------------------------------------------------------
    // Analysis
    // ------------------------------------------------------------------

    pub fn last_analysis(&self) -> Option<AnalysisRecord> {
        self.state.read().last_analysis.clone()
    }

    /// Run an analysis for the current AOI, judging dates against today.
    pub async fn run_analysis(&self, input: AnalysisInput) -> ExplorerResult<AnalysisReport> {
        self.run_analysis_on(input, Local::now().date_naive()).await
    }

    pub async fn run_analysis_on(
        &self,
        input: AnalysisInput,
        today: NaiveDate,
    ) -> ExplorerResult<AnalysisReport> {
        let aoi = self.state.read().aoi.as_ref().map(|a| a.geometry.clone());
        let (range, date_warning) = analysis::check_preconditions(&input, aoi.as_ref(), today)
            .inspect_err(|e| self.notify_failure(e))?;
        let aoi = aoi.ok_or(PreconditionError::MissingAoi)?;

        let field_id = match input.field_name.trim() {
            "" => self.preferences.default_field_name(),
            name => name.to_string(),
        };

        let generation = {
            let mut state = self.state.write();
            state.field_name = field_id.clone();
            state.overlays.reset();
            state.overlay_generation += 1;
            state.analysis_generation += 1;
            state.analysis_generation
        };

        self.status.loading(STATUS_SEARCHING);
        self.status.set_progress(PROGRESS_STARTED);

        let query = analysis::build_query(
            &field_id,
            range,
            &input.indices,
            &aoi,
            self.config.cloud_cover,
        );
        let (result, elapsed) = match analysis::execute(self.backend.as_ref(), &query, &self.status).await {
            Ok(done) => done,
            Err(e) => {
                let err = ExplorerError::from(e);
                if self.state.read().analysis_generation == generation {
                    self.notify_failure(&err);
                    self.status.hide_progress();
                }
                return Err(err);
            }
        };

        let record = AnalysisRecord {
            field_id: field_id.clone(),
            date_range: range,
            requested_indices: input.indices,
            result,
            elapsed,
        };
        let outcome = record.outcome();
        {
            let mut state = self.state.write();
            if state.analysis_generation != generation {
                debug!("Discarding superseded analysis for '{}'", field_id);
                return Err(ExplorerError::Superseded);
            }
            state.last_analysis = Some(record);
        }

        let (kind, message) = analysis::completion_status(&outcome, elapsed);
        self.status.set(kind, message);

        if matches!(outcome, AnalysisOutcome::Results(_)) {
            if let Err(e) = self.saved_fields.save(&field_id, aoi, None) {
                warn!("Could not remember field '{}': {}", field_id, e);
            }
        }
        self.status.set_progress(100);
        self.status.hide_progress();

        Ok(AnalysisReport {
            field_id,
            outcome,
            date_warning: date_warning.map(|w| w.message()),
            elapsed_secs: elapsed.as_secs_f64(),
        })
    }

    pub fn chart_tabs(&self) -> ExplorerResult<Vec<ChartTab>> {
        let state = self.state.read();
        let record = state.last_analysis.as_ref().ok_or(PreconditionError::NoAnalysis)?;
        Ok(chart::tabs(&record.result, &record.requested_indices))
    }

    pub fn chart(&self, filter: &str) -> ExplorerResult<ChartData> {
        let state = self.state.read();
        let record = state.last_analysis.as_ref().ok_or(PreconditionError::NoAnalysis)?;
        Ok(chart::chart_data(&record.result, &record.requested_indices, filter))
    }

    // ------------------------------------------------------------------
    // Overlays
    // ------------------------------------------------------------------

    pub fn overlays(&self) -> OverlayMap {
        self.state.read().overlays.clone()
    }

    /// Load overlays for the checked dates.
    ///
    /// With no explicit selection the indices of the last analysis are used.
    pub async fn load_overlays(
        &self,
        items: Vec<CheckedItem>,
        indices: Option<Vec<IndexId>>,
    ) -> ExplorerResult<BatchSummary> {
        let (aoi, selected) = {
            let state = self.state.read();
            let selected = indices
                .or_else(|| state.last_analysis.as_ref().map(|r| r.requested_indices.clone()))
                .unwrap_or_default();
            (state.aoi.as_ref().map(|a| a.geometry.clone()), selected)
        };
        overlay_loader::check_preconditions(&items, &selected, aoi.as_ref())
            .map_err(ExplorerError::from)
            .inspect_err(|e| self.notify_failure(e))?;

        let generation = {
            let mut state = self.state.write();
            state.overlays.reset();
            state.overlay_generation += 1;
            state.overlay_generation
        };

        let sink = GenerationSink {
            session: self,
            generation,
        };
        let mut map = OverlayMap::new();
        let summary = overlay_loader::load(
            self.backend.as_ref(),
            aoi.as_ref(),
            self.config.cloud_cover,
            &items,
            &selected,
            &mut map,
            &sink,
        )
        .await?;

        let mut state = self.state.write();
        if state.overlay_generation != generation {
            debug!("Discarding superseded overlay batch ({} items)", summary.total);
            return Err(ExplorerError::Superseded);
        }
        state.overlays = map;
        drop(state);
        self.status.hide_progress();
        Ok(summary)
    }

    /// Remove every overlay; an in-flight load is discarded when it settles.
    pub fn clear_overlays(&self) {
        let mut state = self.state.write();
        state.overlays.reset();
        state.overlay_generation += 1;
    }

    pub fn set_layer_visible(&self, layer_id: &str, visible: bool) -> ExplorerResult<OverlayLayer> {
        self.state
            .write()
            .overlays
            .set_visible(layer_id, visible)
            .cloned()
            .ok_or_else(|| PreconditionError::UnknownLayer(layer_id.to_string()).into())
    }

    pub fn set_opacity(&self, percent: u8) -> u8 {
        let mut state = self.state.write();
        state.overlays.set_opacity(percent);
        state.overlays.opacity()
    }

    pub fn set_active_legend(&self, index: &str) -> ExplorerResult<()> {
        if self.state.write().overlays.set_active_legend(index) {
            Ok(())
        } else {
            Err(PreconditionError::UnknownLegend(index.to_string()).into())
        }
    }

    // ------------------------------------------------------------------
    // Pixel inspector
    // ------------------------------------------------------------------

    pub async fn inspect_pixel(&self, lat: f64, lng: f64, zoom: u8) -> ExplorerResult<PixelReport> {
        let query = {
            let state = self.state.read();
            pixel::build_query(
                lat,
                lng,
                zoom,
                state.overlays.first_visible_data_layer(),
                state.aoi.as_ref().map(|a| &a.geometry),
                state
                    .last_analysis
                    .as_ref()
                    .map(|r| r.requested_indices.as_slice()),
                self.config.cloud_cover,
            )?
        };
        let values = self.backend.pixel_value(&query).await?;
        Ok(pixel::annotate(&query, values))
    }
}
