use async_trait::async_trait;
use chrono::Utc;
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use togo_estates::auth::{
    IdentityConnector, IdentityProvider, ProfileStore, ProfileUpdate, ProviderError,
    ProviderSession, SessionEvent, SignUpAttributes, User, UserId, UserProfile,
};
use togo_estates::wizard::{
    DraftId, DraftRecord, DraftRepository, DraftRepositoryError, ListingDraft, ListingSubmitter,
    SubmissionReceipt, SubmitError,
};
use tokio::sync::broadcast;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

struct Account {
    password: String,
    user: User,
}

/// Accounts and profiles for running without a hosted identity backend.
#[derive(Default, Clone)]
pub(crate) struct InMemoryIdentity {
    accounts: Arc<Mutex<HashMap<String, Account>>>,
    profiles: Arc<Mutex<HashMap<UserId, UserProfile>>>,
    tokens: Arc<Mutex<HashMap<String, UserId>>>,
    sequence: Arc<AtomicU64>,
}

impl InMemoryIdentity {
    pub(crate) fn profile_store(&self) -> InMemoryProfileStore {
        InMemoryProfileStore {
            identity: self.clone(),
        }
    }

    fn register(
        &self,
        email: &str,
        password: &str,
        attributes: &SignUpAttributes,
    ) -> Result<User, ProviderError> {
        let key = email.to_ascii_lowercase();
        let mut accounts = self.accounts.lock().unwrap_or_else(PoisonError::into_inner);
        if accounts.contains_key(&key) {
            return Err(ProviderError::new("User already registered"));
        }

        let id = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        let user = User {
            id: UserId(format!("user-{id:06}")),
            email: email.to_string(),
        };
        accounts.insert(
            key,
            Account {
                password: password.to_string(),
                user: user.clone(),
            },
        );

        let now = Utc::now();
        self.profiles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                user.id.clone(),
                UserProfile {
                    id: user.id.clone(),
                    email: Some(user.email.clone()),
                    username: Some(attributes.username.clone()),
                    full_name: Some(attributes.full_name.clone()),
                    avatar_url: None,
                    bio: None,
                    phone: None,
                    account_type: "individual".to_string(),
                    created_at: now,
                    updated_at: now,
                },
            );
        Ok(user)
    }

    fn issue_token(&self, user: &User) -> String {
        let sequence = TOKEN_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        let token = format!("local-{sequence:06}-{}", user.id);
        self.tokens
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(token.clone(), user.id.clone());
        token
    }

    fn revoke_token(&self, token: &str) {
        self.tokens
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(token);
    }

    /// Profile rows are only visible to the user the token was issued to.
    fn check_owner(&self, access_token: &str, user_id: &UserId) -> Result<(), ProviderError> {
        let tokens = self.tokens.lock().unwrap_or_else(PoisonError::into_inner);
        match tokens.get(access_token) {
            Some(owner) if owner == user_id => Ok(()),
            _ => Err(ProviderError::new("permission denied for profile")),
        }
    }

    fn authenticate(&self, email: &str, password: &str) -> Result<User, ProviderError> {
        let accounts = self.accounts.lock().unwrap_or_else(PoisonError::into_inner);
        match accounts.get(&email.to_ascii_lowercase()) {
            Some(account) if account.password == password => Ok(account.user.clone()),
            _ => Err(ProviderError::new("Invalid login credentials")),
        }
    }
}

impl IdentityConnector for InMemoryIdentity {
    fn connect(&self) -> Arc<dyn IdentityProvider> {
        let (events, _) = broadcast::channel(16);
        Arc::new(InMemoryIdentityProvider {
            identity: self.clone(),
            current: Mutex::new(None),
            events,
        })
    }
}

pub(crate) struct InMemoryIdentityProvider {
    identity: InMemoryIdentity,
    current: Mutex<Option<ProviderSession>>,
    events: broadcast::Sender<SessionEvent>,
}

impl InMemoryIdentityProvider {
    fn store(&self, session: Option<ProviderSession>) {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = session.clone();
        let event = match session {
            Some(session) => SessionEvent::SignedIn(session),
            None => SessionEvent::SignedOut,
        };
        let _ = self.events.send(event);
    }
}

static TOKEN_SEQUENCE: AtomicU64 = AtomicU64::new(1);

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn get_session(&self) -> Result<Option<ProviderSession>, ProviderError> {
        Ok(self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn on_session_change(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Accounts are usable immediately; no session is returned so callers
    /// follow the same confirm-then-sign-in path as the hosted backend.
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        attributes: &SignUpAttributes,
    ) -> Result<Option<ProviderSession>, ProviderError> {
        self.identity.register(email, password, attributes)?;
        Ok(None)
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ProviderSession, ProviderError> {
        let user = self.identity.authenticate(email, password)?;
        let session = ProviderSession {
            access_token: self.identity.issue_token(&user),
            refresh_token: None,
            expires_in: None,
            user,
        };
        self.store(Some(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        let current = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(session) = current {
            self.identity.revoke_token(&session.access_token);
        }
        self.store(None);
        Ok(())
    }
}

#[derive(Clone)]
pub(crate) struct InMemoryProfileStore {
    identity: InMemoryIdentity,
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn fetch_profile(
        &self,
        access_token: &str,
        user_id: &UserId,
    ) -> Result<UserProfile, ProviderError> {
        self.identity.check_owner(access_token, user_id)?;
        self.identity
            .profiles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(user_id)
            .cloned()
            .ok_or_else(|| ProviderError::new("profile not found"))
    }

    async fn update_profile(
        &self,
        access_token: &str,
        user_id: &UserId,
        update: &ProfileUpdate,
    ) -> Result<(), ProviderError> {
        self.identity.check_owner(access_token, user_id)?;
        let mut profiles = self
            .identity
            .profiles
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let profile = profiles
            .get_mut(user_id)
            .ok_or_else(|| ProviderError::new("profile not found"))?;
        profile.apply(update, Utc::now());
        Ok(())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryDraftRepository {
    records: Arc<Mutex<HashMap<DraftId, DraftRecord>>>,
}

impl DraftRepository for InMemoryDraftRepository {
    fn insert(&self, record: DraftRecord) -> Result<DraftRecord, DraftRepositoryError> {
        let mut guard = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        if guard.contains_key(&record.id) {
            return Err(DraftRepositoryError::Conflict);
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, record: DraftRecord) -> Result<(), DraftRepositoryError> {
        let mut guard = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        if guard.contains_key(&record.id) {
            guard.insert(record.id.clone(), record);
            Ok(())
        } else {
            Err(DraftRepositoryError::NotFound)
        }
    }

    fn fetch(&self, id: &DraftId) -> Result<Option<DraftRecord>, DraftRepositoryError> {
        let guard = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(guard.get(id).cloned())
    }

    fn take(&self, id: &DraftId) -> Result<Option<DraftRecord>, DraftRepositoryError> {
        let mut guard = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(guard.remove(id))
    }
}

/// Keeps accepted listings in memory until a publishing backend exists.
#[derive(Default, Clone)]
pub(crate) struct InMemoryListingSubmitter {
    submitted: Arc<Mutex<Vec<(UserId, ListingDraft)>>>,
}

impl InMemoryListingSubmitter {
    pub(crate) fn submitted(&self) -> Vec<(UserId, ListingDraft)> {
        self.submitted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl ListingSubmitter for InMemoryListingSubmitter {
    async fn submit(
        &self,
        owner: &UserId,
        draft: &ListingDraft,
    ) -> Result<SubmissionReceipt, SubmitError> {
        let mut guard = self.submitted.lock().unwrap_or_else(PoisonError::into_inner);
        guard.push((owner.clone(), draft.clone()));
        Ok(SubmissionReceipt {
            listing_id: format!("listing-{:06}", guard.len()),
            submitted_at: Utc::now(),
        })
    }
}
