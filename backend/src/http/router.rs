//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (CORS, compression, tracing),
//! and creates the axum router ready for serving.

use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Session and AOI
        .route("/session", get(handlers::get_session))
        .route("/session/field-name", put(handlers::set_field_name))
        .route("/aoi/geojson", post(handlers::apply_geojson))
        .route("/aoi/parcel-search", post(handlers::search_parcel))
        .route("/aoi/locate", post(handlers::locate_parcel))
        // Analysis
        .route("/analysis", post(handlers::run_analysis))
        .route("/analysis/chart", get(handlers::get_chart))
        // Map overlays
        .route(
            "/overlays",
            post(handlers::load_overlays).delete(handlers::clear_overlays),
        )
        .route("/overlays/opacity", put(handlers::set_opacity))
        .route("/overlays/{layer_id}", patch(handlers::set_layer_visibility))
        .route("/legend/{index}", put(handlers::set_active_legend))
        .route("/pixel", post(handlers::inspect_pixel))
        // Status
        .route("/status", get(handlers::get_status))
        .route("/status/stream", get(handlers::stream_status))
        // Persistence
        .route("/saved-fields", get(handlers::list_saved_fields))
        .route("/saved-fields/{index}", delete(handlers::remove_saved_field))
        .route("/saved-fields/{index}/load", post(handlers::load_saved_field))
        .route(
            "/preferences",
            get(handlers::get_preferences).put(handlers::update_preferences),
        )
        .route("/indices", get(handlers::list_indices));

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/v1", api_v1)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
