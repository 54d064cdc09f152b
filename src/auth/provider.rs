use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;

use super::domain::{
    ProfileUpdate, ProviderSession, SessionEvent, SignUpAttributes, UserId, UserProfile,
};

/// Failure reported by the hosted identity or profile backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ProviderError {
    pub message: String,
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Client-side handle on the identity service, scoped to one visitor.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn get_session(&self) -> Result<Option<ProviderSession>, ProviderError>;

    /// Subscribe to sign-in/sign-out notifications.
    fn on_session_change(&self) -> broadcast::Receiver<SessionEvent>;

    /// Returns a session only when the backend signs the user in immediately
    /// (no email confirmation step).
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        attributes: &SignUpAttributes,
    ) -> Result<Option<ProviderSession>, ProviderError>;

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ProviderSession, ProviderError>;

    async fn sign_out(&self) -> Result<(), ProviderError>;
}

/// Storage for the `profiles` table. Calls are made on behalf of the
/// signed-in user and carry that user's access token.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn fetch_profile(
        &self,
        access_token: &str,
        user_id: &UserId,
    ) -> Result<UserProfile, ProviderError>;

    async fn update_profile(
        &self,
        access_token: &str,
        user_id: &UserId,
        update: &ProfileUpdate,
    ) -> Result<(), ProviderError>;
}

/// Opens a fresh provider handle for each visitor session.
pub trait IdentityConnector: Send + Sync {
    fn connect(&self) -> Arc<dyn IdentityProvider>;
}
