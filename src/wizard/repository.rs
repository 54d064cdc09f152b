use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::draft::ListingDraft;
use super::machine::ListingWizard;
use super::steps::WizardStep;
use crate::auth::UserId;
use crate::listings::ListingCardView;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DraftId(pub String);

impl fmt::Display for DraftId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stored wizard, owned by the account that started it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftRecord {
    pub id: DraftId,
    pub owner: UserId,
    pub wizard: ListingWizard,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StepStatus {
    pub number: u8,
    pub name: &'static str,
    pub current: bool,
    pub cleared: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DraftView {
    pub draft_id: DraftId,
    pub current_step: WizardStep,
    pub steps: Vec<StepStatus>,
    pub values: ListingDraft,
    pub preview: ListingCardView,
    pub updated_at: DateTime<Utc>,
}

impl DraftRecord {
    pub fn view(&self) -> DraftView {
        let current = self.wizard.current_step();
        DraftView {
            draft_id: self.id.clone(),
            current_step: current,
            steps: WizardStep::ordered()
                .into_iter()
                .map(|step| StepStatus {
                    number: step.number(),
                    name: step.name(),
                    current: step == current,
                    cleared: self.wizard.is_cleared(step),
                })
                .collect(),
            values: self.wizard.draft().clone(),
            preview: self.wizard.draft().preview(),
            updated_at: self.updated_at,
        }
    }
}

/// Storage abstraction so the wizard service can be exercised in isolation.
pub trait DraftRepository: Send + Sync {
    fn insert(&self, record: DraftRecord) -> Result<DraftRecord, DraftRepositoryError>;
    fn update(&self, record: DraftRecord) -> Result<(), DraftRepositoryError>;
    fn fetch(&self, id: &DraftId) -> Result<Option<DraftRecord>, DraftRepositoryError>;
    /// Removes and returns the draft in one step; `None` once another caller has taken it.
    fn take(&self, id: &DraftId) -> Result<Option<DraftRecord>, DraftRepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum DraftRepositoryError {
    #[error("draft already exists")]
    Conflict,
    #[error("draft not found")]
    NotFound,
    #[error("draft repository unavailable: {0}")]
    Unavailable(String),
}

/// Reference handed back once a listing has been accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub listing_id: String,
    pub submitted_at: DateTime<Utc>,
}

/// Outbound hook receiving validated listings (publishing backend, moderation queue).
#[async_trait]
pub trait ListingSubmitter: Send + Sync {
    async fn submit(
        &self,
        owner: &UserId,
        draft: &ListingDraft,
    ) -> Result<SubmissionReceipt, SubmitError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("listing backend unavailable: {0}")]
    Unavailable(String),
    #[error("listing rejected: {0}")]
    Rejected(String),
}
