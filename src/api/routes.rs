use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers;
use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let body_limit = state.config.max_body_size as usize;

    Router::new()
        // Albums
        .route("/album/data", get(handlers::album_data))
        .route(
            "/album/edit",
            get(handlers::edit_album).post(handlers::edit_album),
        )
        .route(
            "/album/edit/:id",
            get(handlers::edit_album).post(handlers::edit_album),
        )
        .route("/album/index", get(handlers::album_index))
        .route("/album/report", get(handlers::album_report))
        .route("/album/save", post(handlers::save_album))
        // Reports
        .route("/report/edit", get(handlers::edit_report))
        .route(
            "/report/run",
            get(handlers::run_report_get)
                .put(handlers::run_report_put)
                .options(handlers::run_report_options)
                .layer(middleware::map_response(handlers::cors_headers)),
        )
        .route("/report/save/:report_type", post(handlers::save_report))
        // Internal
        .route("/_internal/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
