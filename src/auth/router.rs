use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use super::domain::ProfileUpdate;
use super::forms::{LoginForm, RegistrationForm};
use super::registry::{GateRejection, SessionRegistry};
use super::session::{AuthError, AuthOperation, ProfileState, SessionState};

/// Router exposing registration, sign-in and the profile page.
pub fn auth_router(registry: Arc<SessionRegistry>) -> Router {
    Router::new()
        .route("/api/v1/auth/register", post(register_handler))
        .route("/api/v1/auth/login", post(login_handler))
        .route("/api/v1/auth/logout", post(logout_handler))
        .route("/api/v1/auth/session", get(session_handler))
        .route(
            "/api/v1/profile",
            get(profile_handler).patch(update_profile_handler),
        )
        .with_state(registry)
}

pub(crate) fn auth_error_response(error: &AuthError, provider_status: StatusCode) -> Response {
    let notice = error.notice();
    match error {
        AuthError::Invalid(fields) => {
            let payload = json!({
                "error": notice.message,
                "notice": notice,
                "fields": fields,
            });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
        }
        AuthError::NotSignedIn => GateRejection::SignedOut.into_response(),
        AuthError::Provider { .. } => {
            let payload = json!({
                "error": notice.message,
                "notice": notice,
            });
            (provider_status, Json(payload)).into_response()
        }
    }
}

async fn register_handler(
    State(registry): State<Arc<SessionRegistry>>,
    Json(form): Json<RegistrationForm>,
) -> Response {
    let session = registry.open();
    match session.register(&form).await {
        Ok(notice) => (StatusCode::CREATED, Json(json!({ "notice": notice }))).into_response(),
        Err(error) => auth_error_response(&error, StatusCode::BAD_REQUEST),
    }
}

async fn login_handler(
    State(registry): State<Arc<SessionRegistry>>,
    Json(form): Json<LoginForm>,
) -> Response {
    let session = registry.open();
    let outcome = match session.sign_in(&form).await {
        Ok(outcome) => outcome,
        Err(error) => return auth_error_response(&error, StatusCode::UNAUTHORIZED),
    };
    let Some(token) = session.access_token() else {
        let error = AuthError::Provider {
            operation: AuthOperation::SignIn,
            message: String::new(),
        };
        return auth_error_response(&error, StatusCode::UNAUTHORIZED);
    };

    let state = session.state();
    registry.track(token.clone(), session);
    let payload = json!({
        "access_token": token,
        "notice": outcome.notice,
        "warning": outcome.warning,
        "session": state,
    });
    (StatusCode::OK, Json(payload)).into_response()
}

async fn logout_handler(
    State(registry): State<Arc<SessionRegistry>>,
    headers: HeaderMap,
) -> Response {
    let (token, session) = match registry.resolve(&headers) {
        Ok(found) => found,
        Err(rejection) => return rejection.into_response(),
    };
    match session.sign_out().await {
        Ok(notice) => {
            registry.remove(&token);
            (StatusCode::OK, Json(json!({ "notice": notice }))).into_response()
        }
        Err(error) => auth_error_response(&error, StatusCode::BAD_GATEWAY),
    }
}

/// Anonymous visitors get the signed-out state rather than an error.
async fn session_handler(
    State(registry): State<Arc<SessionRegistry>>,
    headers: HeaderMap,
) -> Response {
    let state = match registry.resolve(&headers) {
        Ok((_, session)) => session.state(),
        Err(_) => SessionState::signed_out(),
    };
    (StatusCode::OK, Json(state)).into_response()
}

async fn profile_handler(
    State(registry): State<Arc<SessionRegistry>>,
    headers: HeaderMap,
) -> Response {
    let (session, user) = match registry.authorize(&headers) {
        Ok(granted) => granted,
        Err(rejection) => return rejection.into_response(),
    };
    match session.state().profile {
        ProfileState::Loaded(profile) => {
            let payload = json!({
                "user": user,
                "initials": profile.initials(),
                "profile": profile,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        ProfileState::Loading => {
            (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "status": "loading" }))).into_response()
        }
        ProfileState::Absent => {
            let payload = json!({
                "error": AuthOperation::LoadProfile.fallback_message(),
                "user": user,
            });
            (StatusCode::NOT_FOUND, Json(payload)).into_response()
        }
    }
}

async fn update_profile_handler(
    State(registry): State<Arc<SessionRegistry>>,
    headers: HeaderMap,
    Json(update): Json<ProfileUpdate>,
) -> Response {
    let (session, _) = match registry.authorize(&headers) {
        Ok(granted) => granted,
        Err(rejection) => return rejection.into_response(),
    };
    match session.update_profile(&update).await {
        Ok(outcome) => {
            let payload = json!({
                "notice": outcome.notice,
                "warning": outcome.warning,
                "profile": session.state().profile.profile(),
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(error) => auth_error_response(&error, StatusCode::BAD_GATEWAY),
    }
}
