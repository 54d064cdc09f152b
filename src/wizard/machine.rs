use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::draft::{DraftUpdate, ListingDraft};
use super::steps::{check_step, WizardStep};
use crate::feedback::{FieldError, Notice};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WizardError {
    #[error("{message}")]
    StepRejected {
        step: WizardStep,
        message: &'static str,
    },
    #[error("listings can only be submitted from the preview step (currently on {current})")]
    NotOnPreview { current: WizardStep },
    #[error("complete the {step} step before submitting")]
    StepNotCleared { step: WizardStep },
    #[error("please correct the highlighted fields")]
    Invalid(Vec<FieldError>),
}

impl WizardError {
    pub fn notice(&self) -> Notice {
        Notice::error(self.to_string())
    }

    pub fn fields(&self) -> &[FieldError] {
        match self {
            WizardError::Invalid(fields) => fields,
            _ => &[],
        }
    }
}

/// Draft values plus navigation state for one listing wizard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingWizard {
    draft: ListingDraft,
    current: WizardStep,
    cleared: BTreeSet<WizardStep>,
}

impl Default for ListingWizard {
    fn default() -> Self {
        Self::new(ListingDraft::default())
    }
}

impl ListingWizard {
    pub fn new(draft: ListingDraft) -> Self {
        Self {
            draft,
            current: WizardStep::Basics,
            cleared: BTreeSet::new(),
        }
    }

    pub fn draft(&self) -> &ListingDraft {
        &self.draft
    }

    pub fn current_step(&self) -> WizardStep {
        self.current
    }

    /// Whether the step's rule has passed on the way forward at least once.
    pub fn is_cleared(&self, step: WizardStep) -> bool {
        self.cleared.contains(&step)
    }

    /// Field edits are accepted on any step.
    pub fn update(&mut self, update: &DraftUpdate) -> Result<(), WizardError> {
        update
            .apply_to(&mut self.draft)
            .map_err(WizardError::Invalid)
    }

    pub fn advance(&mut self) -> Result<WizardStep, WizardError> {
        match self.current.next() {
            Some(next) => self.go_to(next),
            None => Ok(self.current),
        }
    }

    pub fn back(&mut self) -> WizardStep {
        if let Some(previous) = self.current.previous() {
            self.current = previous;
        }
        self.current
    }

    /// Moves to `target`. Forward moves validate every step being left in
    /// order; on the first failure nothing changes.
    pub fn go_to(&mut self, target: WizardStep) -> Result<WizardStep, WizardError> {
        if target <= self.current {
            self.current = target;
            return Ok(self.current);
        }

        let leaving: Vec<WizardStep> = WizardStep::ordered()
            .into_iter()
            .filter(|step| *step >= self.current && *step < target)
            .collect();
        for step in &leaving {
            check_step(*step, &self.draft).map_err(|rejection| WizardError::StepRejected {
                step: rejection.step,
                message: rejection.message,
            })?;
        }

        self.cleared.extend(leaving);
        self.current = target;
        Ok(self.current)
    }

    /// Returns the draft if it may be handed to the submitter.
    pub fn ready_for_submission(&self) -> Result<&ListingDraft, WizardError> {
        if self.current != WizardStep::Preview {
            return Err(WizardError::NotOnPreview {
                current: self.current,
            });
        }
        for step in WizardStep::gated() {
            if !self.is_cleared(step) {
                return Err(WizardError::StepNotCleared { step });
            }
            check_step(step, &self.draft).map_err(|rejection| WizardError::StepRejected {
                step: rejection.step,
                message: rejection.message,
            })?;
        }
        self.draft
            .validate_submission()
            .map_err(WizardError::Invalid)?;
        Ok(&self.draft)
    }
}
