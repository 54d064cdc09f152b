use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::broadcast;

use crate::auth::{
    AuthSession, IdentityConnector, IdentityProvider, LoginForm, ProfileStore, ProfileUpdate,
    ProviderError, ProviderSession, SessionEvent, SessionRegistry, SignUpAttributes, User, UserId,
    UserProfile,
};
use crate::wizard::draft::{DraftUpdate, ListingDraft};
use crate::wizard::repository::{
    DraftId, DraftRecord, DraftRepository, DraftRepositoryError, ListingSubmitter,
    SubmissionReceipt, SubmitError,
};
use crate::wizard::service::ListingWizardService;

pub(super) fn owner() -> UserId {
    UserId("u-1".to_string())
}

pub(super) fn stranger() -> UserId {
    UserId("u-2".to_string())
}

pub(super) fn complete_update() -> DraftUpdate {
    DraftUpdate {
        title: Some("Villa avec piscine à Baguida".to_string()),
        description: Some("Cinq chambres, piscine, vue sur la lagune et gardiennage.".to_string()),
        price: Some(420_000_000),
        category: Some("villa".to_string()),
        bedrooms: Some(5),
        bathrooms: Some(4),
        area: Some(450),
        location: Some("Baguida, Lomé".to_string()),
        ..DraftUpdate::default()
    }
}

#[derive(Default)]
pub(super) struct MemoryDrafts {
    pub(super) records: Mutex<HashMap<DraftId, DraftRecord>>,
}

impl DraftRepository for MemoryDrafts {
    fn insert(&self, record: DraftRecord) -> Result<DraftRecord, DraftRepositoryError> {
        let mut guard = self.records.lock().expect("draft mutex poisoned");
        if guard.contains_key(&record.id) {
            return Err(DraftRepositoryError::Conflict);
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, record: DraftRecord) -> Result<(), DraftRepositoryError> {
        let mut guard = self.records.lock().expect("draft mutex poisoned");
        if !guard.contains_key(&record.id) {
            return Err(DraftRepositoryError::NotFound);
        }
        guard.insert(record.id.clone(), record);
        Ok(())
    }

    fn fetch(&self, id: &DraftId) -> Result<Option<DraftRecord>, DraftRepositoryError> {
        Ok(self
            .records
            .lock()
            .expect("draft mutex poisoned")
            .get(id)
            .cloned())
    }

    fn take(&self, id: &DraftId) -> Result<Option<DraftRecord>, DraftRepositoryError> {
        Ok(self
            .records
            .lock()
            .expect("draft mutex poisoned")
            .remove(id))
    }
}

#[derive(Default)]
pub(super) struct RecordingSubmitter {
    pub(super) submitted: Mutex<Vec<(UserId, ListingDraft)>>,
    pub(super) fail: Mutex<bool>,
    /// Simulated backend latency before a listing is accepted.
    pub(super) delay: Mutex<Option<Duration>>,
}

impl RecordingSubmitter {
    pub(super) fn submitted(&self) -> Vec<(UserId, ListingDraft)> {
        self.submitted.lock().expect("submitter mutex poisoned").clone()
    }
}

#[async_trait]
impl ListingSubmitter for RecordingSubmitter {
    async fn submit(
        &self,
        owner: &UserId,
        draft: &ListingDraft,
    ) -> Result<SubmissionReceipt, SubmitError> {
        let delay = *self.delay.lock().expect("submitter mutex poisoned");
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if *self.fail.lock().expect("submitter mutex poisoned") {
            return Err(SubmitError::Unavailable("moderation queue offline".to_string()));
        }
        let mut submitted = self.submitted.lock().expect("submitter mutex poisoned");
        submitted.push((owner.clone(), draft.clone()));
        Ok(SubmissionReceipt {
            listing_id: format!("listing-{:03}", submitted.len()),
            submitted_at: Utc::now(),
        })
    }
}

pub(super) fn build_service() -> (
    Arc<ListingWizardService<MemoryDrafts, RecordingSubmitter>>,
    Arc<MemoryDrafts>,
    Arc<RecordingSubmitter>,
) {
    let drafts = Arc::new(MemoryDrafts::default());
    let submitter = Arc::new(RecordingSubmitter::default());
    let service = Arc::new(ListingWizardService::new(drafts.clone(), submitter.clone()));
    (service, drafts, submitter)
}

/// Identity double that signs in a fixed account for routing tests.
pub(super) struct StaticProvider {
    user: User,
    events: broadcast::Sender<SessionEvent>,
}

impl StaticProvider {
    pub(super) fn new(user: &UserId) -> Self {
        let (events, _) = broadcast::channel(4);
        Self {
            user: User {
                id: user.clone(),
                email: format!("{user}@example.tg"),
            },
            events,
        }
    }
}

#[async_trait]
impl IdentityProvider for StaticProvider {
    async fn get_session(&self) -> Result<Option<ProviderSession>, ProviderError> {
        Ok(None)
    }

    fn on_session_change(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    async fn sign_up(
        &self,
        _email: &str,
        _password: &str,
        _attributes: &SignUpAttributes,
    ) -> Result<Option<ProviderSession>, ProviderError> {
        Ok(None)
    }

    async fn sign_in_with_password(
        &self,
        _email: &str,
        _password: &str,
    ) -> Result<ProviderSession, ProviderError> {
        Ok(ProviderSession {
            access_token: format!("tok-{}", self.user.id),
            refresh_token: None,
            expires_in: None,
            user: self.user.clone(),
        })
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        Ok(())
    }
}

pub(super) struct NoProfiles;

#[async_trait]
impl ProfileStore for NoProfiles {
    async fn fetch_profile(
        &self,
        _access_token: &str,
        _user_id: &UserId,
    ) -> Result<UserProfile, ProviderError> {
        Err(ProviderError::new("no profile"))
    }

    async fn update_profile(
        &self,
        _access_token: &str,
        _user_id: &UserId,
        _update: &ProfileUpdate,
    ) -> Result<(), ProviderError> {
        Ok(())
    }
}

struct StaticConnector;

impl IdentityConnector for StaticConnector {
    fn connect(&self) -> Arc<dyn IdentityProvider> {
        Arc::new(StaticProvider::new(&owner()))
    }
}

/// Registry holding one signed-in session per user; returns their tokens in order.
pub(super) async fn signed_in_registry(users: &[UserId]) -> (Arc<SessionRegistry>, Vec<String>) {
    let registry = Arc::new(SessionRegistry::new(
        Arc::new(StaticConnector),
        Arc::new(NoProfiles),
    ));
    let mut tokens = Vec::new();
    for user in users {
        let session = Arc::new(AuthSession::new(
            Arc::new(StaticProvider::new(user)),
            Arc::new(NoProfiles),
        ));
        session
            .sign_in(&LoginForm {
                email: format!("{user}@example.tg"),
                password: "secret1".to_string(),
            })
            .await
            .expect("signed in");
        let token = session.access_token().expect("token issued");
        registry.track(token.clone(), session);
        tokens.push(token);
    }
    (registry, tokens)
}
