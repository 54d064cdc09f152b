use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use super::draft::DraftUpdate;
use super::machine::{ListingWizard, WizardError};
use super::repository::{
    DraftId, DraftRecord, DraftRepository, DraftRepositoryError, ListingSubmitter,
    SubmissionReceipt, SubmitError,
};
use super::steps::WizardStep;
use crate::auth::UserId;
use crate::feedback::Notice;

pub const SUBMITTED_MESSAGE: &str = "Property listing submitted successfully!";
pub const SUBMIT_FAILED_MESSAGE: &str = "Failed to submit property listing. Please try again.";
pub const PROPERTIES_PATH: &str = "/properties";

/// Service composing draft storage, the step rules and the listing submitter.
pub struct ListingWizardService<R, S> {
    repository: Arc<R>,
    submitter: Arc<S>,
}

static DRAFT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_draft_id() -> DraftId {
    let id = DRAFT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    DraftId(format!("draft-{id:06}"))
}

/// Navigation request for a draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepMove {
    Next,
    Back,
    To(WizardStep),
}

#[derive(Debug, thiserror::Error)]
pub enum WizardServiceError {
    #[error(transparent)]
    Wizard(#[from] WizardError),
    #[error(transparent)]
    Repository(#[from] DraftRepositoryError),
    #[error("Failed to submit property listing. Please try again.")]
    Submit(#[from] SubmitError),
}

impl WizardServiceError {
    pub fn notice(&self) -> Notice {
        match self {
            WizardServiceError::Wizard(error) => error.notice(),
            other => Notice::error(other.to_string()),
        }
    }
}

impl<R, S> ListingWizardService<R, S>
where
    R: DraftRepository + 'static,
    S: ListingSubmitter + 'static,
{
    pub fn new(repository: Arc<R>, submitter: Arc<S>) -> Self {
        Self {
            repository,
            submitter,
        }
    }

    /// Start a blank wizard for `owner`.
    pub fn create(&self, owner: &UserId) -> Result<DraftRecord, WizardServiceError> {
        let now = Utc::now();
        let record = DraftRecord {
            id: next_draft_id(),
            owner: owner.clone(),
            wizard: ListingWizard::default(),
            created_at: now,
            updated_at: now,
        };
        let stored = self.repository.insert(record)?;
        info!(draft = %stored.id, owner = %owner, "listing draft started");
        Ok(stored)
    }

    /// Drafts belonging to someone else are reported as missing.
    pub fn get(&self, owner: &UserId, id: &DraftId) -> Result<DraftRecord, WizardServiceError> {
        let record = self
            .repository
            .fetch(id)?
            .filter(|record| &record.owner == owner)
            .ok_or(DraftRepositoryError::NotFound)?;
        Ok(record)
    }

    pub fn update(
        &self,
        owner: &UserId,
        id: &DraftId,
        update: &DraftUpdate,
    ) -> Result<DraftRecord, WizardServiceError> {
        let mut record = self.get(owner, id)?;
        record.wizard.update(update)?;
        self.save(record)
    }

    pub fn change_step(
        &self,
        owner: &UserId,
        id: &DraftId,
        movement: StepMove,
    ) -> Result<DraftRecord, WizardServiceError> {
        let mut record = self.get(owner, id)?;
        let outcome = match movement {
            StepMove::Next => record.wizard.advance().map(|_| ()),
            StepMove::Back => {
                record.wizard.back();
                Ok(())
            }
            StepMove::To(step) => record.wizard.go_to(step).map(|_| ()),
        };
        if let Err(error) = outcome {
            warn!(draft = %id, error = %error, "step change rejected");
            return Err(error.into());
        }
        self.save(record)
    }

    /// Validate and hand the draft to the submitter.
    ///
    /// The draft is taken out of the repository before the submitter runs, so
    /// a second submit of the same draft finds nothing and reports it missing.
    /// A rejected submission puts the draft back for another attempt.
    pub async fn submit(
        &self,
        owner: &UserId,
        id: &DraftId,
    ) -> Result<(SubmissionReceipt, Notice), WizardServiceError> {
        self.get(owner, id)?.wizard.ready_for_submission()?;

        let claimed = self
            .repository
            .take(id)?
            .ok_or(DraftRepositoryError::NotFound)?;
        let submitted = match claimed.wizard.ready_for_submission() {
            Ok(draft) => self
                .submitter
                .submit(owner, draft)
                .await
                .map_err(WizardServiceError::from),
            Err(error) => Err(error.into()),
        };

        match submitted {
            Ok(receipt) => {
                info!(draft = %id, listing = %receipt.listing_id, "listing submitted");
                let notice = Notice::success(SUBMITTED_MESSAGE).redirect_to(PROPERTIES_PATH);
                Ok((receipt, notice))
            }
            Err(error) => {
                warn!(draft = %id, error = %error, "listing submission failed");
                self.repository.insert(claimed)?;
                Err(error)
            }
        }
    }

    fn save(&self, mut record: DraftRecord) -> Result<DraftRecord, WizardServiceError> {
        record.updated_at = Utc::now();
        self.repository.update(record.clone())?;
        Ok(record)
    }
}
