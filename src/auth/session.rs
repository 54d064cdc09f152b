use std::sync::{Arc, PoisonError, RwLock, Weak};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::domain::{ProfileUpdate, ProviderSession, SessionEvent, User, UserId, UserProfile};
use super::forms::{validate_profile_update, LoginForm, RegistrationForm};
use super::provider::{IdentityProvider, ProfileStore, ProviderError};
use crate::feedback::{FieldError, Notice};

pub const LOGIN_PATH: &str = "/auth/login";
pub const HOME_PATH: &str = "/";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum ProfileState {
    Absent,
    Loading,
    Loaded(UserProfile),
}

impl ProfileState {
    pub fn profile(&self) -> Option<&UserProfile> {
        match self {
            Self::Loaded(profile) => Some(profile),
            Self::Absent | Self::Loading => None,
        }
    }
}

/// Snapshot of the visitor's authentication state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionState {
    pub user: Option<User>,
    pub profile: ProfileState,
    pub is_loading: bool,
}

impl SessionState {
    /// State before the provider's initial session check resolves.
    pub fn initial() -> Self {
        Self {
            user: None,
            profile: ProfileState::Absent,
            is_loading: true,
        }
    }

    pub fn signed_out() -> Self {
        Self {
            user: None,
            profile: ProfileState::Absent,
            is_loading: false,
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::initial()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOperation {
    LoadSession,
    LoadProfile,
    SignUp,
    SignIn,
    SignOut,
    UpdateProfile,
}

impl AuthOperation {
    pub const fn fallback_message(self) -> &'static str {
        match self {
            Self::LoadSession => "Failed to restore session",
            Self::LoadProfile => "Failed to load user profile",
            Self::SignUp => "Failed to sign up",
            Self::SignIn => "Failed to sign in",
            Self::SignOut => "Failed to sign out",
            Self::UpdateProfile => "Failed to update profile",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("please fill in all required fields correctly")]
    Invalid(Vec<FieldError>),
    #[error("sign in required")]
    NotSignedIn,
    #[error("{}", provider_message(*operation, message))]
    Provider {
        operation: AuthOperation,
        message: String,
    },
}

fn provider_message(operation: AuthOperation, message: &str) -> String {
    if operation == AuthOperation::LoadProfile || message.trim().is_empty() {
        operation.fallback_message().to_string()
    } else {
        message.to_string()
    }
}

/// Success notice plus an optional follow-up warning, e.g. when the user
/// signed in but their profile could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthOutcome {
    pub notice: Notice,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<Notice>,
}

impl AuthOutcome {
    fn with_profile_result(notice: Notice, profile: Result<(), AuthError>) -> Self {
        Self {
            notice,
            warning: profile.err().map(|error| error.notice()),
        }
    }
}

impl AuthError {
    fn provider(operation: AuthOperation, error: ProviderError) -> Self {
        Self::Provider {
            operation,
            message: error.message,
        }
    }

    pub fn notice(&self) -> Notice {
        match self {
            AuthError::NotSignedIn => Notice::error(self.to_string()).redirect_to(LOGIN_PATH),
            AuthError::Invalid(_) | AuthError::Provider { .. } => Notice::error(self.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
struct Credentials {
    access_token: String,
    expires_at: Option<DateTime<Utc>>,
}

/// Observable wrapper around a remote identity provider and profile store.
pub struct AuthSession {
    provider: Arc<dyn IdentityProvider>,
    profiles: Arc<dyn ProfileStore>,
    state: watch::Sender<SessionState>,
    credentials: RwLock<Option<Credentials>>,
}

impl AuthSession {
    pub fn new(provider: Arc<dyn IdentityProvider>, profiles: Arc<dyn ProfileStore>) -> Self {
        let (state, _) = watch::channel(SessionState::initial());
        Self {
            provider,
            profiles,
            state,
            credentials: RwLock::new(None),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn current_user(&self) -> Option<User> {
        self.state.borrow().user.clone()
    }

    pub fn access_token(&self) -> Option<String> {
        self.credentials
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|credentials| credentials.access_token.clone())
    }

    /// When the provider's access token stops being valid, if it said.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.credentials
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .and_then(|credentials| credentials.expires_at)
    }

    /// Resolves the provider's stored session and loads the matching profile.
    /// A profile failure still leaves the user signed in.
    pub async fn initialize(&self) -> Result<(), AuthError> {
        match self.provider.get_session().await {
            Ok(Some(session)) => {
                let user_id = session.user.id.clone();
                self.adopt(session);
                self.load_profile(&user_id).await
            }
            Ok(None) => {
                self.state.send_modify(|state| state.is_loading = false);
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "initial session check failed");
                self.state.send_modify(|state| state.is_loading = false);
                Err(AuthError::provider(AuthOperation::LoadSession, err))
            }
        }
    }

    pub async fn register(&self, form: &RegistrationForm) -> Result<Notice, AuthError> {
        form.validate().map_err(AuthError::Invalid)?;

        self.provider
            .sign_up(form.email.trim(), &form.password, &form.attributes())
            .await
            .map_err(|err| {
                warn!(error = %err, "sign up rejected");
                AuthError::provider(AuthOperation::SignUp, err)
            })?;

        info!(email = %form.email.trim(), "account registered");
        Ok(Notice::success(
            "Registration successful! Please check your email for verification.",
        )
        .redirect_to(LOGIN_PATH))
    }

    /// A profile that fails to load does not undo the sign-in; it comes back
    /// as the outcome's warning.
    pub async fn sign_in(&self, form: &LoginForm) -> Result<AuthOutcome, AuthError> {
        form.validate().map_err(AuthError::Invalid)?;

        let session = self
            .provider
            .sign_in_with_password(form.email.trim(), &form.password)
            .await
            .map_err(|err| {
                warn!(error = %err, "sign in rejected");
                AuthError::provider(AuthOperation::SignIn, err)
            })?;

        let user_id = session.user.id.clone();
        self.adopt(session);
        let profile = self.load_profile(&user_id).await;

        info!(user = %user_id, "signed in");
        Ok(AuthOutcome::with_profile_result(
            Notice::success("Successfully logged in!").redirect_to(HOME_PATH),
            profile,
        ))
    }

    pub async fn sign_out(&self) -> Result<Notice, AuthError> {
        self.provider
            .sign_out()
            .await
            .map_err(|err| AuthError::provider(AuthOperation::SignOut, err))?;

        self.reset();
        Ok(Notice::success("Successfully logged out").redirect_to(HOME_PATH))
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<AuthOutcome, AuthError> {
        let user = self.current_user().ok_or(AuthError::NotSignedIn)?;
        let token = self.access_token().ok_or(AuthError::NotSignedIn)?;
        validate_profile_update(update).map_err(AuthError::Invalid)?;

        self.profiles
            .update_profile(&token, &user.id, update)
            .await
            .map_err(|err| AuthError::provider(AuthOperation::UpdateProfile, err))?;

        let profile = self.load_profile(&user.id).await;
        Ok(AuthOutcome::with_profile_result(
            Notice::success("Profile updated successfully"),
            profile,
        ))
    }

    /// Applies a provider notification to the observable state. A signed-in
    /// event whose profile cannot be loaded reports the load failure.
    pub async fn apply_event(&self, event: SessionEvent) -> Result<(), AuthError> {
        match event {
            SessionEvent::SignedIn(session) => {
                let user_id = session.user.id.clone();
                self.adopt(session);
                self.load_profile(&user_id).await
            }
            SessionEvent::SignedOut => {
                self.reset();
                Ok(())
            }
        }
    }

    /// Spawns a task forwarding provider notifications into this session.
    /// The task ends once the session is dropped or the provider closes.
    pub fn spawn_listener(self: &Arc<Self>) -> JoinHandle<()> {
        let mut events = self.provider.on_session_change();
        let handle: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        let Some(session) = handle.upgrade() else {
                            break;
                        };
                        if let Err(error) = session.apply_event(event).await {
                            debug!(%error, "session event applied without profile");
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!(skipped, "session listener lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    async fn load_profile(&self, user_id: &UserId) -> Result<(), AuthError> {
        let Some(token) = self.access_token() else {
            self.state
                .send_modify(|state| state.profile = ProfileState::Absent);
            return Err(AuthError::NotSignedIn);
        };
        self.state
            .send_modify(|state| state.profile = ProfileState::Loading);

        match self.profiles.fetch_profile(&token, user_id).await {
            Ok(profile) => {
                self.state
                    .send_modify(|state| state.profile = ProfileState::Loaded(profile));
                Ok(())
            }
            Err(err) => {
                warn!(user = %user_id, error = %err, "profile fetch failed");
                self.state
                    .send_modify(|state| state.profile = ProfileState::Absent);
                Err(AuthError::provider(AuthOperation::LoadProfile, err))
            }
        }
    }

    fn adopt(&self, session: ProviderSession) {
        let expires_at = session
            .expires_in
            .and_then(|seconds| Duration::try_seconds(i64::try_from(seconds).ok()?))
            .and_then(|lifetime| Utc::now().checked_add_signed(lifetime));
        *self
            .credentials
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Credentials {
            access_token: session.access_token,
            expires_at,
        });
        self.state.send_modify(|state| {
            state.user = Some(session.user);
            state.is_loading = false;
        });
    }

    fn reset(&self) {
        *self
            .credentials
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
        self.state.send_replace(SessionState::signed_out());
    }
}
