//! Hosted identity backend speaking the GoTrue auth and PostgREST APIs.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::broadcast;
use tracing::{debug, warn};
use url::Url;

use super::domain::{
    ProfileUpdate, ProviderSession, SessionEvent, SignUpAttributes, UserId, UserProfile,
};
use super::provider::{IdentityConnector, IdentityProvider, ProfileStore, ProviderError};
use crate::config::IdentityConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const EVENT_CAPACITY: usize = 16;

/// Shared HTTP plumbing for both auth and profile calls.
#[derive(Clone)]
struct Endpoint {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl Endpoint {
    fn new(config: &IdentityConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| ProviderError::new(format!("failed to build HTTP client: {err}")))?;
        Ok(Self {
            client,
            base_url: with_trailing_slash(config.base_url.clone()),
            api_key: config.api_key.clone(),
        })
    }

    fn url(&self, path: &str) -> Result<Url, ProviderError> {
        endpoint_url(&self.base_url, path)
    }

    fn request(
        &self,
        method: reqwest::Method,
        path: &str,
        bearer: Option<&str>,
    ) -> Result<RequestBuilder, ProviderError> {
        Ok(self.request_url(method, self.url(path)?, bearer))
    }

    /// Without a user token the call is made with the project key alone.
    fn request_url(&self, method: reqwest::Method, url: Url, bearer: Option<&str>) -> RequestBuilder {
        let bearer = bearer.unwrap_or(&self.api_key);
        self.client
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(bearer)
    }
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

/// Joins a relative API path (which may carry a query string) onto the base URL.
pub fn endpoint_url(base_url: &Url, path: &str) -> Result<Url, ProviderError> {
    with_trailing_slash(base_url.clone())
        .join(path.trim_start_matches('/'))
        .map_err(|err| ProviderError::new(format!("invalid endpoint {path}: {err}")))
}

/// Pulls the human-readable message out of a GoTrue or PostgREST error body.
pub fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["msg", "error_description", "message", "error"]
        .iter()
        .filter_map(|key| value.get(key).and_then(Value::as_str))
        .map(str::trim)
        .find(|message| !message.is_empty())
        .map(str::to_string)
}

async fn check(response: Response) -> Result<Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body).unwrap_or_else(|| format!("request failed with {status}"));
    warn!(%status, %message, "identity backend rejected request");
    Err(ProviderError::new(message))
}

fn transport(err: reqwest::Error) -> ProviderError {
    ProviderError::new(err.to_string())
}

/// Connector that hands each visitor its own provider handle against one backend.
pub struct RemoteIdentityConnector {
    endpoint: Endpoint,
}

impl RemoteIdentityConnector {
    pub fn new(config: &IdentityConfig) -> Result<Self, ProviderError> {
        Ok(Self {
            endpoint: Endpoint::new(config)?,
        })
    }

    pub fn profile_store(&self) -> RemoteProfileStore {
        RemoteProfileStore {
            endpoint: self.endpoint.clone(),
        }
    }
}

impl IdentityConnector for RemoteIdentityConnector {
    fn connect(&self) -> Arc<dyn IdentityProvider> {
        Arc::new(RemoteIdentityProvider::new(self.endpoint.clone()))
    }
}

pub struct RemoteIdentityProvider {
    endpoint: Endpoint,
    current: RwLock<Option<ProviderSession>>,
    events: broadcast::Sender<SessionEvent>,
}

#[derive(Debug, Deserialize)]
struct SignUpResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    user: Option<super::domain::User>,
}

impl RemoteIdentityProvider {
    fn new(endpoint: Endpoint) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            endpoint,
            current: RwLock::new(None),
            events,
        }
    }

    fn store(&self, session: Option<ProviderSession>) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = session.clone();
        let event = match session {
            Some(session) => SessionEvent::SignedIn(session),
            None => SessionEvent::SignedOut,
        };
        // No subscribers is fine; the caller already holds the result.
        let _ = self.events.send(event);
    }

    fn current_token(&self) -> Option<String> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|session| session.access_token.clone())
    }
}

#[async_trait]
impl IdentityProvider for RemoteIdentityProvider {
    async fn get_session(&self) -> Result<Option<ProviderSession>, ProviderError> {
        Ok(self
            .current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn on_session_change(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        attributes: &SignUpAttributes,
    ) -> Result<Option<ProviderSession>, ProviderError> {
        let response = self
            .endpoint
            .request(reqwest::Method::POST, "auth/v1/signup", None)?
            .json(&json!({
                "email": email,
                "password": password,
                "data": attributes,
            }))
            .send()
            .await
            .map_err(transport)?;
        let body: SignUpResponse = check(response).await?.json().await.map_err(transport)?;

        let session = match (body.access_token, body.user) {
            (Some(access_token), Some(user)) => Some(ProviderSession {
                access_token,
                refresh_token: body.refresh_token,
                expires_in: body.expires_in,
                user,
            }),
            _ => None,
        };
        debug!(confirmed = session.is_some(), "sign up accepted");
        if session.is_some() {
            self.store(session.clone());
        }
        Ok(session)
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ProviderSession, ProviderError> {
        let response = self
            .endpoint
            .request(
                reqwest::Method::POST,
                "auth/v1/token?grant_type=password",
                None,
            )?
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(transport)?;
        let session: ProviderSession = check(response).await?.json().await.map_err(transport)?;
        self.store(Some(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        if let Some(token) = self.current_token() {
            let response = self
                .endpoint
                .request(reqwest::Method::POST, "auth/v1/logout", Some(&token))?
                .send()
                .await
                .map_err(transport)?;
            check(response).await?;
        }
        self.store(None);
        Ok(())
    }
}

/// `profiles` table over PostgREST.
pub struct RemoteProfileStore {
    endpoint: Endpoint,
}

impl RemoteProfileStore {
    /// `rest/v1/profiles?id=eq.<id>` with the id query-encoded.
    pub fn profile_url(&self, user_id: &UserId) -> Result<Url, ProviderError> {
        let mut url = self.endpoint.url("rest/v1/profiles")?;
        url.query_pairs_mut()
            .append_pair("id", &format!("eq.{user_id}"));
        Ok(url)
    }
}

#[async_trait]
impl ProfileStore for RemoteProfileStore {
    async fn fetch_profile(
        &self,
        access_token: &str,
        user_id: &UserId,
    ) -> Result<UserProfile, ProviderError> {
        let response = self
            .endpoint
            .request_url(
                reqwest::Method::GET,
                self.profile_url(user_id)?,
                Some(access_token),
            )
            .header("Accept", "application/vnd.pgrst.object+json")
            .send()
            .await
            .map_err(transport)?;
        check(response).await?.json().await.map_err(transport)
    }

    async fn update_profile(
        &self,
        access_token: &str,
        user_id: &UserId,
        update: &ProfileUpdate,
    ) -> Result<(), ProviderError> {
        let mut body = serde_json::to_value(update)
            .map_err(|err| ProviderError::new(format!("failed to encode profile: {err}")))?;
        if let Value::Object(fields) = &mut body {
            fields.insert(
                "updated_at".to_string(),
                Value::String(chrono::Utc::now().to_rfc3339()),
            );
        }
        let response = self
            .endpoint
            .request_url(
                reqwest::Method::PATCH,
                self.profile_url(user_id)?,
                Some(access_token),
            )
            .header("Prefer", "return=minimal")
            .json(&body)
            .send()
            .await
            .map_err(transport)?;
        check(response).await?;
        Ok(())
    }
}
