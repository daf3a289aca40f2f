//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the
//! explorer session.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;

use super::dto::{
    ActiveAoi, AnalysisReport, AnalysisRequest, ChartQuery, ChartResponse, FieldNameRequest,
    FieldNameResponse, GeoJsonRequest, HealthResponse, IndexCatalogResponse,
    LayerVisibilityRequest, LocateRequest, OpacityRequest, OpacityResponse, OverlayLayer,
    OverlayLoadRequest, OverlayLoadResponse, OverlayMap, ParcelMatch, ParcelSearchRequest,
    PixelReport, PixelRequest, PreferencesSnapshot, PreferencesUpdate, SavedField,
    SavedFieldListResponse, SavedFieldLoadResponse, SessionSnapshot, StatusSnapshot,
};
use super::error::AppError;
use super::state::AppState;
use crate::models::{catalog, LANDSAT_INDICES, SENTINEL2_INDICES};
use crate::services::chart::ALL_FILTER;

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

/// Poll interval of the status stream.
const STATUS_POLL_INTERVAL: Duration = Duration::from_millis(200);

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        backend: state.session.backend_name().to_string(),
    }))
}

// =============================================================================
// Session and AOI
// =============================================================================

/// GET /v1/session
pub async fn get_session(State(state): State<AppState>) -> HandlerResult<SessionSnapshot> {
    Ok(Json(state.session.snapshot()))
}

/// PUT /v1/session/field-name
pub async fn set_field_name(
    State(state): State<AppState>,
    Json(request): Json<FieldNameRequest>,
) -> HandlerResult<FieldNameResponse> {
    state.session.set_field_name(&request.name);
    Ok(Json(FieldNameResponse {
        field_name: state.session.field_name(),
    }))
}

/// POST /v1/aoi/geojson
///
/// Set the AOI from pasted polygon coordinates.
pub async fn apply_geojson(
    State(state): State<AppState>,
    Json(request): Json<GeoJsonRequest>,
) -> HandlerResult<ActiveAoi> {
    Ok(Json(state.session.apply_pasted_coordinates(&request.coordinates)?))
}

/// POST /v1/aoi/parcel-search
pub async fn search_parcel(
    State(state): State<AppState>,
    Json(request): Json<ParcelSearchRequest>,
) -> HandlerResult<ParcelMatch> {
    Ok(Json(state.session.search_parcel(&request.query).await?))
}

/// POST /v1/aoi/locate
///
/// Resolve a map click to the parcel under it.
pub async fn locate_parcel(
    State(state): State<AppState>,
    Json(request): Json<LocateRequest>,
) -> HandlerResult<ParcelMatch> {
    Ok(Json(state.session.locate_parcel(request.lat, request.lng).await?))
}

// =============================================================================
// Analysis
// =============================================================================

/// POST /v1/analysis
pub async fn run_analysis(
    State(state): State<AppState>,
    Json(request): Json<AnalysisRequest>,
) -> HandlerResult<AnalysisReport> {
    Ok(Json(state.session.run_analysis(request.into()).await?))
}

/// GET /v1/analysis/chart?filter=
pub async fn get_chart(
    State(state): State<AppState>,
    Query(query): Query<ChartQuery>,
) -> HandlerResult<ChartResponse> {
    let filter = query.filter.as_deref().unwrap_or(ALL_FILTER);
    Ok(Json(ChartResponse {
        tabs: state.session.chart_tabs()?,
        chart: state.session.chart(filter)?,
    }))
}

// =============================================================================
// Overlays
// =============================================================================

/// POST /v1/overlays
///
/// Replace the overlay layers with one batch per checked date.
pub async fn load_overlays(
    State(state): State<AppState>,
    Json(request): Json<OverlayLoadRequest>,
) -> HandlerResult<OverlayLoadResponse> {
    let summary = state
        .session
        .load_overlays(request.items, request.indices)
        .await?;
    Ok(Json(OverlayLoadResponse {
        summary,
        overlays: state.session.overlays(),
    }))
}

/// DELETE /v1/overlays
pub async fn clear_overlays(State(state): State<AppState>) -> StatusCode {
    state.session.clear_overlays();
    StatusCode::NO_CONTENT
}

/// PATCH /v1/overlays/{layer_id}
pub async fn set_layer_visibility(
    State(state): State<AppState>,
    Path(layer_id): Path<String>,
    Json(request): Json<LayerVisibilityRequest>,
) -> HandlerResult<OverlayLayer> {
    Ok(Json(state.session.set_layer_visible(&layer_id, request.visible)?))
}

/// PUT /v1/overlays/opacity
pub async fn set_opacity(
    State(state): State<AppState>,
    Json(request): Json<OpacityRequest>,
) -> HandlerResult<OpacityResponse> {
    if request.opacity > 100 {
        return Err(AppError::BadRequest(format!(
            "Opacity must be between 0 and 100, got {}",
            request.opacity
        )));
    }
    Ok(Json(OpacityResponse {
        opacity: state.session.set_opacity(request.opacity),
    }))
}

/// PUT /v1/legend/{index}
pub async fn set_active_legend(
    State(state): State<AppState>,
    Path(index): Path<String>,
) -> HandlerResult<OverlayMap> {
    state.session.set_active_legend(&index)?;
    Ok(Json(state.session.overlays()))
}

/// POST /v1/pixel
pub async fn inspect_pixel(
    State(state): State<AppState>,
    Json(request): Json<PixelRequest>,
) -> HandlerResult<PixelReport> {
    Ok(Json(
        state
            .session
            .inspect_pixel(request.lat, request.lng, request.zoom)
            .await?,
    ))
}

// =============================================================================
// Status
// =============================================================================

/// GET /v1/status
pub async fn get_status(State(state): State<AppState>) -> HandlerResult<StatusSnapshot> {
    Ok(Json(state.session.status().snapshot()))
}

/// GET /v1/status/stream
///
/// Stream status changes via Server-Sent Events (SSE). Each new status line
/// is a `status` event; progress changes are `progress` events.
pub async fn stream_status(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let tracker = state.session.status().clone();
    let stream = async_stream::stream! {
        let mut last_seq = tracker.current().map(|e| e.seq).unwrap_or(0);
        let mut last_revision = 0;
        let mut last_progress = None;
        loop {
            let revision = tracker.revision();
            if revision != last_revision {
                for entry in tracker.entries_since(last_seq) {
                    last_seq = entry.seq;
                    let data = serde_json::to_string(&entry).unwrap_or_default();
                    yield Ok(Event::default().event("status").data(data));
                }

                let progress = tracker.progress_value();
                if progress != last_progress || last_revision == 0 {
                    let data = serde_json::json!({ "progress": progress });
                    yield Ok(Event::default()
                        .event("progress")
                        .data(serde_json::to_string(&data).unwrap_or_default()));
                    last_progress = progress;
                }
                last_revision = revision;
            }

            tokio::time::sleep(STATUS_POLL_INTERVAL).await;
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(1))
            .text("keep-alive"),
    )
}

// =============================================================================
// Saved fields and preferences
// =============================================================================

/// GET /v1/saved-fields
pub async fn list_saved_fields(State(state): State<AppState>) -> HandlerResult<SavedFieldListResponse> {
    let fields = state.session.saved_fields();
    let total = fields.len();
    Ok(Json(SavedFieldListResponse { fields, total }))
}

/// POST /v1/saved-fields/{index}/load
pub async fn load_saved_field(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> HandlerResult<SavedFieldLoadResponse> {
    let field = state.session.load_saved_field(index)?;
    Ok(Json(SavedFieldLoadResponse {
        field,
        aoi: state.session.aoi(),
    }))
}

/// DELETE /v1/saved-fields/{index}
pub async fn remove_saved_field(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> HandlerResult<SavedField> {
    Ok(Json(state.session.remove_saved_field(index)?))
}

/// GET /v1/preferences
pub async fn get_preferences(State(state): State<AppState>) -> HandlerResult<PreferencesSnapshot> {
    Ok(Json(state.session.preferences()))
}

/// PUT /v1/preferences
pub async fn update_preferences(
    State(state): State<AppState>,
    Json(update): Json<PreferencesUpdate>,
) -> HandlerResult<PreferencesSnapshot> {
    Ok(Json(state.session.update_preferences(&update)?))
}

// =============================================================================
// Index catalog
// =============================================================================

/// GET /v1/indices
pub async fn list_indices() -> HandlerResult<IndexCatalogResponse> {
    Ok(Json(IndexCatalogResponse {
        indices: catalog().to_vec(),
        sentinel2: SENTINEL2_INDICES.to_vec(),
        landsat: LANDSAT_INDICES.to_vec(),
    }))
}
