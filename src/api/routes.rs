//! REST endpoints for the pulse panel.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tracing::warn;

use super::query::PulseQuery;
use crate::config::PulseConfig;
use crate::error::{Error, Result};
use crate::filters::FilterSet;
use crate::pulse::{PulseReport, ReportMeta, build_report};
use crate::source::TaskSource;
use crate::tasks::Space;

/// Shared state for pulse routes.
#[derive(Clone)]
pub struct PulseState {
    pub source: Arc<dyn TaskSource>,
    pub config: Arc<PulseConfig>,
    generation: Arc<AtomicU64>,
}

impl PulseState {
    pub fn new(source: Arc<dyn TaskSource>, config: PulseConfig) -> Self {
        Self {
            source,
            config: Arc::new(config),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::Relaxed) + 1
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::Request(_) => StatusCode::BAD_REQUEST,
            Error::Source(_) => StatusCode::BAD_GATEWAY,
            Error::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(serde_json::json!({"error": self.to_string()}))).into_response()
    }
}

/// Filter controls a client can render.
#[derive(Debug, Serialize)]
pub struct FilterOptions {
    /// Discovery defaults.
    pub filters: FilterSet,
    pub statuses: Vec<String>,
    pub members: Vec<String>,
    pub spaces: Vec<Space>,
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "team-pulse"
    }))
}

/// GET /api/pulse
///
/// Loads the feed, applies the requested filters on top of the discovery
/// defaults and returns the full report.
async fn get_pulse(
    State(state): State<PulseState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<PulseReport>> {
    let query = PulseQuery::from_pairs(pairs)?;
    let feed = state.source.load().await.inspect_err(|e| {
        warn!(source = state.source.name(), error = %e, "Failed to load task feed");
    })?;

    let filters = query.apply(FilterSet::discover(
        &feed,
        state.config.primary_space.as_deref(),
    ));
    let now = Utc::now();
    let meta = ReportMeta {
        generation: state.next_generation(),
        generated_at: now,
        data_source: state.source.name().to_string(),
    };

    Ok(Json(build_report(
        &feed,
        &filters,
        &state.config,
        query.reference_time(now),
        meta,
    )))
}

/// GET /api/pulse/filters
async fn get_filters(State(state): State<PulseState>) -> Result<Json<FilterOptions>> {
    let feed = state.source.load().await?;
    let filters = FilterSet::discover(&feed, state.config.primary_space.as_deref());

    let spaces = feed
        .space_ids()
        .into_iter()
        .map(|id| {
            let name = feed
                .spaces
                .iter()
                .find(|s| s.id == id)
                .map(|s| s.name.clone())
                .unwrap_or_else(|| id.clone());
            Space { id, name }
        })
        .collect();

    Ok(Json(FilterOptions {
        filters,
        statuses: feed.statuses().into_iter().collect(),
        members: feed.member_names().into_iter().collect(),
        spaces,
    }))
}

/// Build the pulse REST routes.
pub fn pulse_routes(state: PulseState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/pulse", get(get_pulse))
        .route("/api/pulse/filters", get(get_filters))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
