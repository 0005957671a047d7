//! RegistrationFlow — drives the registration conversation per user.
//!
//! Sessions are partitioned by user id behind a lock-per-key map: events for
//! the same user serialize on that user's mutex, while distinct users proceed
//! independently. A session is created by `start` only; input from users with
//! no session is dropped without allocating anything.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};

use crate::error::FlowError;
use crate::store::ProfileStore;

use super::model::Language;
use super::prompts::{PromptKey, ask_for, prompt};
use super::state::{ConversationState, RegistrationStep};

/// A message for the user, already localized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub text: &'static str,
    /// Attach the inline language keyboard when sending.
    pub language_picker: bool,
}

impl Prompt {
    fn new(key: PromptKey, lang: Language) -> Self {
        Self {
            text: prompt(key, lang),
            language_picker: key == PromptKey::LanguagePicker,
        }
    }
}

/// Outcome of feeding one input to the flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowReply {
    /// Send this to the user.
    Prompt(Prompt),
    /// Input didn't match the current step; nothing to send.
    Ignored,
}

/// Conversation controller: owns per-user state and the store gateway.
pub struct RegistrationFlow {
    store: Arc<dyn ProfileStore>,
    sessions: RwLock<HashMap<i64, Arc<Mutex<ConversationState>>>>,
}

impl RegistrationFlow {
    pub fn new(store: Arc<dyn ProfileStore>) -> Self {
        Self {
            store,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// `/start` — unconditionally restart the user's conversation and return
    /// the language picker. Any in-progress draft is discarded.
    pub async fn start(&self, user_id: i64) -> Prompt {
        let session = self.session(user_id).await;
        let mut state = session.lock().await;
        state.restart();
        tracing::info!(user_id, "registration started");
        // The picker itself predates the language choice; shown in English,
        // with all three languages visible in the text and on the buttons.
        Prompt::new(PromptKey::LanguagePicker, Language::En)
    }

    /// A language button was pressed. Valid only in `AwaitingLanguage`.
    pub async fn choose_language(&self, user_id: i64, lang: Language) -> FlowReply {
        let Some(session) = self.existing(user_id).await else {
            return self.ignored(user_id, "no conversation");
        };
        let mut state = session.lock().await;
        if state.step != RegistrationStep::AwaitingLanguage {
            return self.ignored(user_id, "language choice out of sequence");
        }
        state.draft.language = Some(lang);
        state.touch();
        self.advance(user_id, &mut state)
    }

    /// A text message arrived. Dispatches on the current step; empty or
    /// whitespace-only text is dropped. Accepted text is stored verbatim.
    pub async fn submit_text(&self, user_id: i64, text: &str) -> FlowReply {
        if text.trim().is_empty() {
            return self.ignored(user_id, "empty text");
        }
        let Some(session) = self.existing(user_id).await else {
            return self.ignored(user_id, "no conversation");
        };
        let mut state = session.lock().await;
        match state.step {
            RegistrationStep::AwaitingName => state.draft.name = Some(text.to_string()),
            RegistrationStep::AwaitingAge => match text.trim().parse::<u32>() {
                Ok(age) => state.draft.age = Some(age),
                Err(_) => {
                    // Retry in place: the step and every collected field stay
                    // exactly as they were.
                    let lang = state.draft.lang();
                    state.touch();
                    tracing::debug!(user_id, input = text, "invalid age, re-prompting");
                    return FlowReply::Prompt(Prompt::new(PromptKey::InvalidAge, lang));
                }
            },
            RegistrationStep::AwaitingGender => state.draft.gender = Some(text.to_string()),
            RegistrationStep::AwaitingInterests => state.draft.interests = Some(text.to_string()),
            RegistrationStep::AwaitingBio => state.draft.bio = Some(text.to_string()),
            _ => return self.ignored(user_id, "text out of sequence"),
        }
        state.touch();
        self.advance(user_id, &mut state)
    }

    /// A photo arrived. Valid only in `AwaitingPhoto`: finalizes the draft,
    /// writes it through the store gateway, and clears the session — but only
    /// after the write is confirmed. On failure the session is preserved so
    /// the user can retry by sending another photo.
    pub async fn submit_photo(
        &self,
        user_id: i64,
        photo_ref: &str,
    ) -> Result<FlowReply, FlowError> {
        let Some(session) = self.existing(user_id).await else {
            return Ok(self.ignored(user_id, "no conversation"));
        };
        let mut state = session.lock().await;
        if state.step != RegistrationStep::AwaitingPhoto {
            return Ok(self.ignored(user_id, "photo out of sequence"));
        }
        let lang = state.draft.lang();
        let record = state.draft.finalize(user_id, photo_ref.to_string())?;
        match self.store.upsert(&record).await {
            Ok(()) => {
                state.clear();
                tracing::info!(user_id, "profile saved");
                Ok(FlowReply::Prompt(Prompt::new(PromptKey::ProfileSaved, lang)))
            }
            Err(source) => {
                state.touch();
                tracing::warn!(user_id, error = %source, "profile save failed, keeping session");
                Err(FlowError::Persistence {
                    user_id,
                    lang,
                    source,
                })
            }
        }
    }

    /// The user's current step; `Idle` when no session exists.
    pub async fn current_step(&self, user_id: i64) -> RegistrationStep {
        match self.existing(user_id).await {
            Some(session) => session.lock().await.step,
            None => RegistrationStep::Idle,
        }
    }

    /// Drop sessions idle longer than `ttl`. Sessions currently processing an
    /// event are skipped and reconsidered on the next sweep. Returns the
    /// number evicted.
    pub async fn evict_stale(&self, ttl: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|user_id, session| match session.try_lock() {
            Ok(state) => {
                let stale = state.last_activity.elapsed() >= ttl;
                if stale {
                    tracing::debug!(user_id, step = %state.step, "evicting stale conversation");
                }
                !stale
            }
            Err(_) => true,
        });
        before - sessions.len()
    }

    /// Advance the locked session and return the prompt for the new step.
    fn advance(&self, user_id: i64, state: &mut ConversationState) -> FlowReply {
        let next = match state.advance() {
            Ok(step) => step,
            Err(e) => {
                tracing::warn!(user_id, "failed to advance registration step: {e}");
                return FlowReply::Ignored;
            }
        };
        match ask_for(next) {
            Some(key) => FlowReply::Prompt(Prompt::new(key, state.draft.lang())),
            // Only photo completion reaches Idle, and that path doesn't come
            // through here.
            None => FlowReply::Ignored,
        }
    }

    fn ignored(&self, user_id: i64, reason: &'static str) -> FlowReply {
        tracing::debug!(user_id, reason, "input ignored");
        FlowReply::Ignored
    }

    /// Get or create the session entry for a user.
    async fn session(&self, user_id: i64) -> Arc<Mutex<ConversationState>> {
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(user_id)
            .or_insert_with(|| Arc::new(Mutex::new(ConversationState::new())))
            .clone()
    }

    /// Look up an existing session without creating one.
    async fn existing(&self, user_id: i64) -> Option<Arc<Mutex<ConversationState>>> {
        self.sessions.read().await.get(&user_id).cloned()
    }
}

/// Spawn the stale-session sweep — runs every 60s for the life of the bot.
pub fn spawn_eviction_task(
    flow: Arc<RegistrationFlow>,
    ttl: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(60));
        loop {
            interval.tick().await;
            let evicted = flow.evict_stale(ttl).await;
            if evicted > 0 {
                tracing::info!(evicted, "stale conversations evicted");
            }
        }
    })
}
