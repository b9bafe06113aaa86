use axum::{
    extract::State,
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeFile;
use tower_http::trace::TraceLayer;

use stockwatch_core::cache::SnapshotCache;

#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<SnapshotCache>,
}

pub fn create_router(state: AppState, index_html: PathBuf) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/stocks", get(get_stocks))
        .route("/stock_data.json", get(get_stored_snapshot))
        .route_service("/", ServeFile::new(index_html))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> &'static str {
    "ok"
}

async fn get_stocks(State(state): State<AppState>) -> Result<Response, StatusCode> {
    let cached = state.cache.get_or_refresh().await.map_err(|e| {
        sentry_anyhow::capture_anyhow(&e);
        tracing::error!(error = %format!("{e:#}"), "snapshot refresh failed");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok((
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            ),
            (
                HeaderName::from_static("x-cache"),
                HeaderValue::from_static(cached.status.as_str()),
            ),
        ],
        cached.snapshot.body,
    )
        .into_response())
}

/// Raw stored snapshot, regardless of age.
async fn get_stored_snapshot(State(state): State<AppState>) -> Result<Response, StatusCode> {
    let stored = state
        .cache
        .store()
        .load()
        .await
        .map_err(|e| {
            sentry_anyhow::capture_anyhow(&e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(StatusCode::NOT_FOUND)?;

    Ok((
        [(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        )],
        stored.body,
    )
        .into_response())
}
