use std::fmt;

use serde::{Deserialize, Serialize};

use super::draft::ListingDraft;

pub const REQUIRED_FIELDS_TOAST: &str = "Please fill in all required fields";
pub const LOCATION_TOAST: &str = "Please provide a location";

/// The five pages of the listing wizard, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Basics,
    Details,
    Location,
    Images,
    Preview,
}

impl WizardStep {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::Basics,
            Self::Details,
            Self::Location,
            Self::Images,
            Self::Preview,
        ]
    }

    /// 1-based position shown in the step indicator.
    pub const fn number(self) -> u8 {
        match self {
            Self::Basics => 1,
            Self::Details => 2,
            Self::Location => 3,
            Self::Images => 4,
            Self::Preview => 5,
        }
    }

    pub fn from_number(number: u8) -> Option<Self> {
        Self::ordered()
            .into_iter()
            .find(|step| step.number() == number)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Basics => "Basics",
            Self::Details => "Details",
            Self::Location => "Location",
            Self::Images => "Images",
            Self::Preview => "Preview",
        }
    }

    pub fn next(self) -> Option<Self> {
        Self::from_number(self.number() + 1)
    }

    pub fn previous(self) -> Option<Self> {
        self.number().checked_sub(1).and_then(Self::from_number)
    }

    /// Steps that must be cleared before a draft can be submitted.
    pub const fn gated() -> [Self; 3] {
        [Self::Basics, Self::Details, Self::Location]
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Toast message produced when a step's rule fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepRejection {
    pub step: WizardStep,
    pub message: &'static str,
}

pub type StepRule = fn(&ListingDraft) -> Result<(), &'static str>;

const STEP_RULES: [(WizardStep, StepRule); 3] = [
    (WizardStep::Basics, basics_rule),
    (WizardStep::Details, details_rule),
    (WizardStep::Location, location_rule),
];

/// Rule guarding the exit from `step`, if any.
pub fn rule_for(step: WizardStep) -> Option<StepRule> {
    STEP_RULES
        .iter()
        .find(|(candidate, _)| *candidate == step)
        .map(|(_, rule)| *rule)
}

pub fn check_step(step: WizardStep, draft: &ListingDraft) -> Result<(), StepRejection> {
    match rule_for(step) {
        Some(rule) => rule(draft).map_err(|message| StepRejection { step, message }),
        None => Ok(()),
    }
}

fn basics_rule(draft: &ListingDraft) -> Result<(), &'static str> {
    if draft.title.trim().is_empty() || draft.price == 0 {
        Err(REQUIRED_FIELDS_TOAST)
    } else {
        Ok(())
    }
}

fn details_rule(draft: &ListingDraft) -> Result<(), &'static str> {
    if draft.category.is_none() || draft.area == 0 {
        Err(REQUIRED_FIELDS_TOAST)
    } else {
        Ok(())
    }
}

fn location_rule(draft: &ListingDraft) -> Result<(), &'static str> {
    if draft.location.trim().is_empty() {
        Err(LOCATION_TOAST)
    } else {
        Ok(())
    }
}
