use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use tokio::task::JoinHandle;
use tracing::debug;

use super::domain::User;
use super::gate::{require_user, RouteAccess};
use super::provider::{IdentityConnector, ProfileStore};
use super::session::{AuthSession, LOGIN_PATH};

/// Lifetime given to sessions whose provider did not report one.
pub const DEFAULT_SESSION_TTL_SECS: i64 = 3600;

struct SessionEntry {
    session: Arc<AuthSession>,
    listener: JoinHandle<()>,
    expires_at: DateTime<Utc>,
}

impl SessionEntry {
    fn expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Signed-in visitor sessions keyed by access token.
pub struct SessionRegistry {
    connector: Arc<dyn IdentityConnector>,
    profiles: Arc<dyn ProfileStore>,
    sessions: RwLock<HashMap<String, SessionEntry>>,
    ttl: Duration,
}

/// Why a request was refused by the session gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateRejection {
    MissingToken,
    UnknownSession,
    SignedOut,
    Expired,
    Pending,
}

impl IntoResponse for GateRejection {
    fn into_response(self) -> Response {
        match self {
            GateRejection::Pending => (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "loading" })),
            )
                .into_response(),
            GateRejection::Expired => (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "error": "session expired",
                    "redirect": LOGIN_PATH,
                })),
            )
                .into_response(),
            GateRejection::MissingToken
            | GateRejection::UnknownSession
            | GateRejection::SignedOut => (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "error": "sign in required",
                    "redirect": LOGIN_PATH,
                })),
            )
                .into_response(),
        }
    }
}

impl SessionRegistry {
    pub fn new(connector: Arc<dyn IdentityConnector>, profiles: Arc<dyn ProfileStore>) -> Self {
        Self {
            connector,
            profiles,
            sessions: RwLock::new(HashMap::new()),
            ttl: Duration::seconds(DEFAULT_SESSION_TTL_SECS),
        }
    }

    /// Caps how long a tracked session stays usable.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Opens an untracked session for a visitor about to register or sign in.
    pub fn open(&self) -> Arc<AuthSession> {
        Arc::new(AuthSession::new(
            self.connector.connect(),
            self.profiles.clone(),
        ))
    }

    /// Starts tracking a signed-in session until the earlier of the
    /// provider's token expiry and the registry TTL. Expired entries are
    /// dropped on the way. Must run inside a tokio runtime.
    pub fn track(&self, token: String, session: Arc<AuthSession>) {
        let now = Utc::now();
        let cap = now.checked_add_signed(self.ttl).unwrap_or(now);
        let expires_at = session.expires_at().map_or(cap, |expiry| expiry.min(cap));
        let listener = session.spawn_listener();

        let mut sessions = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        sessions.retain(|_, entry| {
            let keep = !entry.expired(now);
            if !keep {
                entry.listener.abort();
            }
            keep
        });
        let previous = sessions.insert(
            token,
            SessionEntry {
                session,
                listener,
                expires_at,
            },
        );
        if let Some(previous) = previous {
            previous.listener.abort();
        }
    }

    /// Live session for `token`; expired ones are not returned.
    pub fn get(&self, token: &str) -> Option<Arc<AuthSession>> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(token)
            .filter(|entry| !entry.expired(Utc::now()))
            .map(|entry| entry.session.clone())
    }

    pub fn remove(&self, token: &str) -> Option<Arc<AuthSession>> {
        let entry = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(token)?;
        entry.listener.abort();
        Some(entry.session)
    }

    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Looks up the session named by the request's bearer token, evicting
    /// it if it has expired.
    pub fn resolve(&self, headers: &HeaderMap) -> Result<(String, Arc<AuthSession>), GateRejection> {
        let token = bearer_token(headers).ok_or(GateRejection::MissingToken)?;
        let found = self
            .sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(token)
            .map(|entry| (entry.session.clone(), entry.expired(Utc::now())));
        match found {
            None => Err(GateRejection::UnknownSession),
            Some((_, true)) => {
                self.remove(token);
                debug!("expired session evicted");
                Err(GateRejection::Expired)
            }
            Some((session, false)) => Ok((token.to_string(), session)),
        }
    }

    /// Resolves the session and requires a signed-in user.
    pub fn authorize(&self, headers: &HeaderMap) -> Result<(Arc<AuthSession>, User), GateRejection> {
        let (_, session) = self.resolve(headers)?;
        match require_user(&session.state()) {
            RouteAccess::Granted(user) => Ok((session, user)),
            RouteAccess::Pending => Err(GateRejection::Pending),
            RouteAccess::RedirectToLogin => Err(GateRejection::SignedOut),
        }
    }
}

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
