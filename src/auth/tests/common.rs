use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::broadcast;

use crate::auth::domain::{
    ProfileUpdate, ProviderSession, SessionEvent, SignUpAttributes, User, UserId, UserProfile,
};
use crate::auth::provider::{IdentityConnector, IdentityProvider, ProfileStore, ProviderError};
use crate::auth::registry::SessionRegistry;
use crate::auth::session::AuthSession;

pub(super) const EMAIL: &str = "afi@example.tg";
pub(super) const PASSWORD: &str = "secret1";

pub(super) fn user() -> User {
    User {
        id: UserId("u-1".to_string()),
        email: EMAIL.to_string(),
    }
}

pub(super) fn provider_session() -> ProviderSession {
    ProviderSession {
        access_token: "tok-u-1".to_string(),
        refresh_token: None,
        expires_in: None,
        user: user(),
    }
}

pub(super) fn timestamp() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2025-03-01T09:30:00Z")
        .expect("valid timestamp")
        .with_timezone(&Utc)
}

pub(super) fn profile() -> UserProfile {
    UserProfile {
        id: user().id,
        email: Some(EMAIL.to_string()),
        username: Some("afi_m".to_string()),
        full_name: Some("Afi Mensah".to_string()),
        avatar_url: None,
        bio: None,
        phone: None,
        account_type: "individual".to_string(),
        created_at: timestamp(),
        updated_at: timestamp(),
    }
}

/// Scriptable identity provider double.
pub(super) struct MockProvider {
    pub(super) stored: Mutex<Option<ProviderSession>>,
    pub(super) sign_in_error: Mutex<Option<ProviderError>>,
    pub(super) sign_up_error: Mutex<Option<ProviderError>>,
    pub(super) sign_up_calls: Mutex<Vec<(String, SignUpAttributes)>>,
    pub(super) sign_out_calls: Mutex<u32>,
    events: broadcast::Sender<SessionEvent>,
}

impl Default for MockProvider {
    fn default() -> Self {
        let (events, _) = broadcast::channel(8);
        Self {
            stored: Mutex::new(None),
            sign_in_error: Mutex::new(None),
            sign_up_error: Mutex::new(None),
            sign_up_calls: Mutex::new(Vec::new()),
            sign_out_calls: Mutex::new(0),
            events,
        }
    }
}

impl MockProvider {
    pub(super) fn with_session(session: ProviderSession) -> Self {
        let provider = Self::default();
        *provider.stored.lock().expect("mock mutex poisoned") = Some(session);
        provider
    }

    pub(super) fn failing_sign_in(message: &str) -> Self {
        let provider = Self::default();
        *provider.sign_in_error.lock().expect("mock mutex poisoned") =
            Some(ProviderError::new(message));
        provider
    }

    pub(super) fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }
}

#[async_trait]
impl IdentityProvider for MockProvider {
    async fn get_session(&self) -> Result<Option<ProviderSession>, ProviderError> {
        Ok(self.stored.lock().expect("mock mutex poisoned").clone())
    }

    fn on_session_change(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    async fn sign_up(
        &self,
        email: &str,
        _password: &str,
        attributes: &SignUpAttributes,
    ) -> Result<Option<ProviderSession>, ProviderError> {
        if let Some(error) = self.sign_up_error.lock().expect("mock mutex poisoned").clone() {
            return Err(error);
        }
        self.sign_up_calls
            .lock()
            .expect("mock mutex poisoned")
            .push((email.to_string(), attributes.clone()));
        Ok(None)
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ProviderSession, ProviderError> {
        if let Some(error) = self.sign_in_error.lock().expect("mock mutex poisoned").clone() {
            return Err(error);
        }
        if email != EMAIL || password != PASSWORD {
            return Err(ProviderError::new("Invalid login credentials"));
        }
        let session = provider_session();
        *self.stored.lock().expect("mock mutex poisoned") = Some(session.clone());
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        *self.sign_out_calls.lock().expect("mock mutex poisoned") += 1;
        *self.stored.lock().expect("mock mutex poisoned") = None;
        Ok(())
    }
}

#[derive(Default)]
pub(super) struct MemoryProfiles {
    pub(super) profiles: Mutex<HashMap<UserId, UserProfile>>,
    pub(super) fail_fetch: Mutex<bool>,
    /// Access tokens presented with each call, in order.
    pub(super) tokens: Mutex<Vec<String>>,
}

impl MemoryProfiles {
    pub(super) fn seeded() -> Self {
        let store = Self::default();
        store
            .profiles
            .lock()
            .expect("profile mutex poisoned")
            .insert(user().id, profile());
        store
    }
}

#[async_trait]
impl ProfileStore for MemoryProfiles {
    async fn fetch_profile(
        &self,
        access_token: &str,
        user_id: &UserId,
    ) -> Result<UserProfile, ProviderError> {
        self.tokens
            .lock()
            .expect("profile mutex poisoned")
            .push(access_token.to_string());
        if *self.fail_fetch.lock().expect("profile mutex poisoned") {
            return Err(ProviderError::new("connection reset"));
        }
        self.profiles
            .lock()
            .expect("profile mutex poisoned")
            .get(user_id)
            .cloned()
            .ok_or_else(|| ProviderError::new("JSON object requested, multiple (or no) rows returned"))
    }

    async fn update_profile(
        &self,
        access_token: &str,
        user_id: &UserId,
        update: &ProfileUpdate,
    ) -> Result<(), ProviderError> {
        self.tokens
            .lock()
            .expect("profile mutex poisoned")
            .push(access_token.to_string());
        let mut guard = self.profiles.lock().expect("profile mutex poisoned");
        let profile = guard
            .get_mut(user_id)
            .ok_or_else(|| ProviderError::new(""))?;
        profile.apply(update, timestamp() + chrono::Duration::hours(1));
        Ok(())
    }
}

/// Hands out the same shared mock to every visitor.
pub(super) struct SharedConnector(pub(super) Arc<MockProvider>);

impl IdentityConnector for SharedConnector {
    fn connect(&self) -> Arc<dyn IdentityProvider> {
        self.0.clone()
    }
}

pub(super) fn session_with(
    provider: Arc<MockProvider>,
    profiles: Arc<MemoryProfiles>,
) -> AuthSession {
    AuthSession::new(provider, profiles)
}

/// Connector that builds a fresh mock per visitor, like the remote backend.
pub(super) struct FreshConnector;

impl IdentityConnector for FreshConnector {
    fn connect(&self) -> Arc<dyn IdentityProvider> {
        Arc::new(MockProvider::default())
    }
}

pub(super) fn registry() -> Arc<SessionRegistry> {
    registry_with(MemoryProfiles::seeded(), chrono::Duration::hours(1))
}

pub(super) fn registry_with(profiles: MemoryProfiles, ttl: chrono::Duration) -> Arc<SessionRegistry> {
    Arc::new(SessionRegistry::new(Arc::new(FreshConnector), Arc::new(profiles)).with_ttl(ttl))
}
