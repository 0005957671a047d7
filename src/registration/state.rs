//! Registration state machine — tracks which step the user is on.

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use super::model::ProfileDraft;

/// The steps of the registration conversation.
///
/// Progresses linearly: Idle → AwaitingLanguage → AwaitingName → AwaitingAge →
/// AwaitingGender → AwaitingInterests → AwaitingBio → AwaitingPhoto → Idle.
/// There is no skipping and no going back; the only non-advancing input is an
/// invalid age, which re-prompts in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStep {
    Idle,
    AwaitingLanguage,
    AwaitingName,
    AwaitingAge,
    AwaitingGender,
    AwaitingInterests,
    AwaitingBio,
    AwaitingPhoto,
}

impl RegistrationStep {
    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: RegistrationStep) -> bool {
        use RegistrationStep::*;
        matches!(
            (self, target),
            (Idle, AwaitingLanguage)
                | (AwaitingLanguage, AwaitingName)
                | (AwaitingName, AwaitingAge)
                | (AwaitingAge, AwaitingGender)
                | (AwaitingGender, AwaitingInterests)
                | (AwaitingInterests, AwaitingBio)
                | (AwaitingBio, AwaitingPhoto)
                | (AwaitingPhoto, Idle)
        )
    }

    /// Whether a registration conversation is in progress.
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Idle)
    }

    /// The next step in the linear progression. `None` from `Idle` — a new
    /// conversation starts with an explicit reset, not an advance.
    pub fn next(&self) -> Option<RegistrationStep> {
        use RegistrationStep::*;
        match self {
            Idle => None,
            AwaitingLanguage => Some(AwaitingName),
            AwaitingName => Some(AwaitingAge),
            AwaitingAge => Some(AwaitingGender),
            AwaitingGender => Some(AwaitingInterests),
            AwaitingInterests => Some(AwaitingBio),
            AwaitingBio => Some(AwaitingPhoto),
            AwaitingPhoto => Some(Idle),
        }
    }
}

impl Default for RegistrationStep {
    fn default() -> Self {
        Self::Idle
    }
}

impl std::fmt::Display for RegistrationStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::AwaitingLanguage => "awaiting_language",
            Self::AwaitingName => "awaiting_name",
            Self::AwaitingAge => "awaiting_age",
            Self::AwaitingGender => "awaiting_gender",
            Self::AwaitingInterests => "awaiting_interests",
            Self::AwaitingBio => "awaiting_bio",
            Self::AwaitingPhoto => "awaiting_photo",
        };
        write!(f, "{s}")
    }
}

/// One user's in-flight registration conversation.
///
/// Memory-only; the durable `ProfileRecord` is written once, on completion.
#[derive(Debug)]
pub struct ConversationState {
    /// Current step.
    pub step: RegistrationStep,
    /// Fields collected so far.
    pub draft: ProfileDraft,
    /// Last time this conversation saw input (drives TTL eviction).
    pub last_activity: Instant,
}

impl ConversationState {
    pub fn new() -> Self {
        Self {
            step: RegistrationStep::Idle,
            draft: ProfileDraft::default(),
            last_activity: Instant::now(),
        }
    }

    /// Advance to the next step. Returns an error if there is no next step.
    pub fn advance(&mut self) -> std::result::Result<RegistrationStep, String> {
        let next = self
            .step
            .next()
            .ok_or_else(|| "No active conversation to advance".to_string())?;
        if !self.step.can_transition_to(next) {
            return Err(format!("Cannot transition from {} to {}", self.step, next));
        }
        self.step = next;
        Ok(next)
    }

    /// Drop all progress and restart at the language picker.
    pub fn restart(&mut self) {
        self.step = RegistrationStep::AwaitingLanguage;
        self.draft = ProfileDraft::default();
        self.touch();
    }

    /// Drop all progress and return to idle.
    pub fn clear(&mut self) {
        self.step = RegistrationStep::Idle;
        self.draft = ProfileDraft::default();
        self.touch();
    }

    /// Record activity, pushing back the eviction deadline.
    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::new()
    }
}
