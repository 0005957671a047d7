//! Registration flow — the conversational profile form.
//!
//! A strictly linear dialogue: language, name, age, gender, interests, bio,
//! photo. Each inbound event either advances the user one step, re-prompts in
//! place (invalid age), or is dropped as out-of-sequence. On completion the
//! assembled profile goes through the store gateway and the conversation
//! returns to idle.

pub mod controller;
pub mod model;
pub mod prompts;
pub mod state;

pub use controller::{FlowReply, Prompt, RegistrationFlow, spawn_eviction_task};
pub use model::{IncompleteDraft, Language, ProfileDraft, ProfileRecord};
pub use prompts::{PromptKey, ask_for, prompt};
pub use state::{ConversationState, RegistrationStep};
