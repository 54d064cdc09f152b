//! Five-step listing wizard: draft values, per-step rules, storage and submission.

pub mod draft;
pub mod machine;
pub mod repository;
pub mod router;
pub mod service;
pub mod steps;

#[cfg(test)]
mod tests;

pub use draft::{DraftUpdate, ListingDraft, DEFAULT_LOCATION, MAX_IMAGES, PREVIEW_TITLE};
pub use machine::{ListingWizard, WizardError};
pub use repository::{
    DraftId, DraftRecord, DraftRepository, DraftRepositoryError, DraftView, ListingSubmitter,
    StepStatus, SubmissionReceipt, SubmitError,
};
pub use router::{wizard_router, StepAction, StepRequest, WizardState};
pub use service::{
    ListingWizardService, StepMove, WizardServiceError, PROPERTIES_PATH, SUBMITTED_MESSAGE,
    SUBMIT_FAILED_MESSAGE,
};
pub use steps::{check_step, rule_for, StepRejection, StepRule, WizardStep};
