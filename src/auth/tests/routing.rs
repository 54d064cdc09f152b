use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::*;
use crate::auth::router::auth_router;

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(request)
        .await
        .expect("router responded");
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("body");
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).expect("json body")
    };
    (status, value)
}

fn post_json(uri: &str, payload: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .expect("request")
}

fn with_token(builder: axum::http::request::Builder, token: &str) -> axum::http::request::Builder {
    builder.header(header::AUTHORIZATION, format!("Bearer {token}"))
}

async fn signed_in(router: &Router) -> String {
    let (status, body) = send(
        router,
        post_json(
            "/api/v1/auth/login",
            json!({ "email": EMAIL, "password": PASSWORD }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["access_token"]
        .as_str()
        .expect("token issued")
        .to_string()
}

#[tokio::test]
async fn register_route_returns_created_notice() {
    let router = auth_router(registry());
    let (status, body) = send(
        &router,
        post_json(
            "/api/v1/auth/register",
            json!({
                "email": "kossi@example.tg",
                "password": "secret1",
                "username": "kossi",
                "fullName": "Kossi Agbeko",
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["notice"]["level"], "success");
    assert_eq!(body["notice"]["redirect"], "/auth/login");
}

#[tokio::test]
async fn register_route_lists_field_errors() {
    let router = auth_router(registry());
    let (status, body) = send(
        &router,
        post_json(
            "/api/v1/auth/register",
            json!({
                "email": "kossi@example.tg",
                "password": "secret1",
                "username": "k!",
                "fullName": "Kossi",
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["fields"][0]["field"], "username");
}

#[tokio::test]
async fn login_issues_token_and_session_state() {
    let registry = registry();
    let router = auth_router(registry.clone());

    let (status, body) = send(
        &router,
        post_json(
            "/api/v1/auth/login",
            json!({ "email": EMAIL, "password": PASSWORD }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["access_token"], "tok-u-1");
    assert_eq!(body["notice"]["message"], "Successfully logged in!");
    assert_eq!(body["session"]["user"]["email"], EMAIL);
    assert_eq!(body["session"]["profile"]["status"], "loaded");
    assert_eq!(registry.len(), 1);
}

#[tokio::test]
async fn bad_credentials_are_unauthorized() {
    let registry = registry();
    let router = auth_router(registry.clone());
    let (status, body) = send(
        &router,
        post_json(
            "/api/v1/auth/login",
            json!({ "email": EMAIL, "password": "wrong-password" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid login credentials");
    assert!(registry.is_empty());
}

#[tokio::test]
async fn anonymous_session_is_signed_out() {
    let router = auth_router(registry());
    let (status, body) = send(
        &router,
        Request::get("/api/v1/auth/session")
            .body(Body::empty())
            .expect("request"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"], Value::Null);
    assert_eq!(body["is_loading"], false);
}

#[tokio::test]
async fn profile_requires_sign_in() {
    let router = auth_router(registry());
    let (status, body) = send(
        &router,
        Request::get("/api/v1/profile")
            .body(Body::empty())
            .expect("request"),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["redirect"], "/auth/login");
}

#[tokio::test]
async fn profile_round_trip_for_signed_in_user() {
    let router = auth_router(registry());
    let token = signed_in(&router).await;

    let (status, body) = send(
        &router,
        with_token(Request::get("/api/v1/profile"), &token)
            .body(Body::empty())
            .expect("request"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["initials"], "AM");

    let (status, body) = send(
        &router,
        with_token(Request::patch("/api/v1/profile"), &token)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({ "phone": "+228 90 00 00 00" }).to_string()))
            .expect("request"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["notice"]["message"], "Profile updated successfully");
    assert_eq!(body["profile"]["phone"], "+228 90 00 00 00");
}

#[tokio::test]
async fn invalid_profile_patch_is_rejected() {
    let router = auth_router(registry());
    let token = signed_in(&router).await;

    let (status, body) = send(
        &router,
        with_token(Request::patch("/api/v1/profile"), &token)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({ "avatar_url": "nope" }).to_string()))
            .expect("request"),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["fields"][0]["message"], "Please enter a valid URL");
}

#[tokio::test]
async fn logout_forgets_the_token() {
    let registry = registry();
    let router = auth_router(registry.clone());
    let token = signed_in(&router).await;

    let (status, body) = send(
        &router,
        with_token(Request::post("/api/v1/auth/logout"), &token)
            .body(Body::empty())
            .expect("request"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["notice"]["message"], "Successfully logged out");
    assert!(registry.is_empty());

    let (status, _) = send(
        &router,
        with_token(Request::get("/api/v1/profile"), &token)
            .body(Body::empty())
            .expect("request"),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn shared_provider_drives_registry_sessions() {
    let provider = Arc::new(MockProvider::default());
    let registry = Arc::new(crate::auth::registry::SessionRegistry::new(
        Arc::new(SharedConnector(provider.clone())),
        Arc::new(MemoryProfiles::seeded()),
    ));
    let router = auth_router(registry.clone());
    let token = signed_in(&router).await;

    let session = registry.get(&token).expect("tracked");
    assert_eq!(session.current_user(), Some(user()));
    assert!(provider
        .stored
        .lock()
        .expect("mock mutex poisoned")
        .is_some());
}

#[tokio::test]
async fn login_reports_missing_profile_as_warning() {
    let registry = registry_with(MemoryProfiles::default(), chrono::Duration::hours(1));
    let router = auth_router(registry.clone());

    let (status, body) = send(
        &router,
        post_json(
            "/api/v1/auth/login",
            json!({ "email": EMAIL, "password": PASSWORD }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["notice"]["message"], "Successfully logged in!");
    assert_eq!(body["warning"]["message"], "Failed to load user profile");
    assert_eq!(body["session"]["profile"]["status"], "absent");
    assert_eq!(registry.len(), 1);
}

#[tokio::test]
async fn unresolved_session_answers_loading() {
    let registry = registry();
    registry.track("tok-pending".to_string(), registry.open());
    let router = auth_router(registry);

    let (status, body) = send(
        &router,
        with_token(Request::get("/api/v1/profile"), "tok-pending")
            .body(Body::empty())
            .expect("request"),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body, json!({ "status": "loading" }));
}

#[tokio::test]
async fn expired_token_is_rejected_and_evicted() {
    let registry = registry_with(MemoryProfiles::seeded(), chrono::Duration::zero());
    let router = auth_router(registry.clone());
    let token = signed_in(&router).await;
    assert_eq!(registry.len(), 1);
    assert!(registry.get(&token).is_none(), "expired entries are not served");

    let (status, body) = send(
        &router,
        with_token(Request::get("/api/v1/profile"), &token)
            .body(Body::empty())
            .expect("request"),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "session expired");
    assert_eq!(body["redirect"], "/auth/login");
    assert!(registry.is_empty());
}

#[tokio::test]
async fn tracking_a_session_sweeps_expired_ones() {
    let expired = registry_with(MemoryProfiles::seeded(), chrono::Duration::zero());
    let router = auth_router(expired.clone());
    signed_in(&router).await;
    signed_in(&router).await;
    assert_eq!(expired.len(), 1, "same token replaces its entry");

    expired.track("tok-other".to_string(), expired.open());
    assert_eq!(expired.len(), 1, "only the newest entry survives the sweep");
    assert!(expired.get("tok-u-1").is_none());
}
