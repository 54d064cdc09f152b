use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Extension;
use axum::Json;
use serde_json::json;
use std::sync::Arc;
use togo_estates::auth::{auth_router, SessionRegistry};
use togo_estates::listings::{listing_router, ListingCatalog};
use togo_estates::wizard::{wizard_router, DraftRepository, ListingSubmitter, ListingWizardService};

pub(crate) fn with_site_routes<R, S>(
    catalog: Arc<ListingCatalog>,
    sessions: Arc<SessionRegistry>,
    wizard: Arc<ListingWizardService<R, S>>,
) -> axum::Router
where
    R: DraftRepository + 'static,
    S: ListingSubmitter + 'static,
{
    listing_router(catalog)
        .merge(auth_router(sessions.clone()))
        .merge(wizard_router(wizard, sessions))
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
