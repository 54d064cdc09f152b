use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::draft::DraftUpdate;
use super::machine::WizardError;
use super::repository::{DraftId, DraftRepository, DraftRepositoryError, ListingSubmitter};
use super::service::{ListingWizardService, StepMove, WizardServiceError};
use super::steps::WizardStep;
use crate::auth::SessionRegistry;

/// Shared state for the wizard routes.
pub struct WizardState<R, S> {
    pub service: Arc<ListingWizardService<R, S>>,
    pub sessions: Arc<SessionRegistry>,
}

impl<R, S> Clone for WizardState<R, S> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            sessions: self.sessions.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepAction {
    Next,
    Back,
}

/// Either a relative move or a click on a numbered step.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct StepRequest {
    #[serde(default)]
    pub action: Option<StepAction>,
    #[serde(default)]
    pub step: Option<u8>,
}

impl StepRequest {
    fn movement(self) -> Option<StepMove> {
        match (self.action, self.step) {
            (Some(StepAction::Next), None) => Some(StepMove::Next),
            (Some(StepAction::Back), None) => Some(StepMove::Back),
            (None, Some(number)) => WizardStep::from_number(number).map(StepMove::To),
            _ => None,
        }
    }
}

/// Router exposing the listing wizard to signed-in users.
pub fn wizard_router<R, S>(
    service: Arc<ListingWizardService<R, S>>,
    sessions: Arc<SessionRegistry>,
) -> Router
where
    R: DraftRepository + 'static,
    S: ListingSubmitter + 'static,
{
    Router::new()
        .route("/api/v1/drafts", post(create_handler::<R, S>))
        .route(
            "/api/v1/drafts/:draft_id",
            get(show_handler::<R, S>).patch(update_handler::<R, S>),
        )
        .route("/api/v1/drafts/:draft_id/step", post(step_handler::<R, S>))
        .route(
            "/api/v1/drafts/:draft_id/submit",
            post(submit_handler::<R, S>),
        )
        .with_state(WizardState { service, sessions })
}

fn error_response(error: WizardServiceError) -> Response {
    let notice = error.notice();
    match &error {
        WizardServiceError::Wizard(WizardError::StepRejected { step, .. }) => {
            let payload = json!({
                "error": notice.message,
                "notice": notice,
                "step": step,
            });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
        }
        WizardServiceError::Wizard(wizard) => {
            let payload = json!({
                "error": notice.message,
                "notice": notice,
                "fields": wizard.fields(),
            });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
        }
        WizardServiceError::Repository(DraftRepositoryError::NotFound) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "draft not found" })),
        )
            .into_response(),
        WizardServiceError::Repository(other) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": other.to_string() })),
        )
            .into_response(),
        WizardServiceError::Submit(_) => {
            let payload = json!({
                "error": notice.message,
                "notice": notice,
            });
            (StatusCode::BAD_GATEWAY, Json(payload)).into_response()
        }
    }
}

pub(crate) async fn create_handler<R, S>(
    State(state): State<WizardState<R, S>>,
    headers: HeaderMap,
) -> Response
where
    R: DraftRepository + 'static,
    S: ListingSubmitter + 'static,
{
    let (_, user) = match state.sessions.authorize(&headers) {
        Ok(granted) => granted,
        Err(rejection) => return rejection.into_response(),
    };
    match state.service.create(&user.id) {
        Ok(record) => (StatusCode::CREATED, Json(record.view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn show_handler<R, S>(
    State(state): State<WizardState<R, S>>,
    headers: HeaderMap,
    Path(draft_id): Path<String>,
) -> Response
where
    R: DraftRepository + 'static,
    S: ListingSubmitter + 'static,
{
    let (_, user) = match state.sessions.authorize(&headers) {
        Ok(granted) => granted,
        Err(rejection) => return rejection.into_response(),
    };
    match state.service.get(&user.id, &DraftId(draft_id)) {
        Ok(record) => (StatusCode::OK, Json(record.view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn update_handler<R, S>(
    State(state): State<WizardState<R, S>>,
    headers: HeaderMap,
    Path(draft_id): Path<String>,
    Json(update): Json<DraftUpdate>,
) -> Response
where
    R: DraftRepository + 'static,
    S: ListingSubmitter + 'static,
{
    let (_, user) = match state.sessions.authorize(&headers) {
        Ok(granted) => granted,
        Err(rejection) => return rejection.into_response(),
    };
    match state.service.update(&user.id, &DraftId(draft_id), &update) {
        Ok(record) => (StatusCode::OK, Json(record.view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn step_handler<R, S>(
    State(state): State<WizardState<R, S>>,
    headers: HeaderMap,
    Path(draft_id): Path<String>,
    Json(request): Json<StepRequest>,
) -> Response
where
    R: DraftRepository + 'static,
    S: ListingSubmitter + 'static,
{
    let (_, user) = match state.sessions.authorize(&headers) {
        Ok(granted) => granted,
        Err(rejection) => return rejection.into_response(),
    };
    let Some(movement) = request.movement() else {
        let payload = json!({
            "error": "expected either an action (next/back) or a step number between 1 and 5",
        });
        return (StatusCode::BAD_REQUEST, Json(payload)).into_response();
    };
    match state
        .service
        .change_step(&user.id, &DraftId(draft_id), movement)
    {
        Ok(record) => (StatusCode::OK, Json(record.view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn submit_handler<R, S>(
    State(state): State<WizardState<R, S>>,
    headers: HeaderMap,
    Path(draft_id): Path<String>,
) -> Response
where
    R: DraftRepository + 'static,
    S: ListingSubmitter + 'static,
{
    let (_, user) = match state.sessions.authorize(&headers) {
        Ok(granted) => granted,
        Err(rejection) => return rejection.into_response(),
    };
    match state.service.submit(&user.id, &DraftId(draft_id)).await {
        Ok((receipt, notice)) => {
            let payload = json!({
                "receipt": receipt,
                "notice": notice,
            });
            (StatusCode::CREATED, Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}
