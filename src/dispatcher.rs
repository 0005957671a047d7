//! Dispatcher — routes channel events to the registration flow and replies
//! back out.
//!
//! Each event is handled on its own task; ordering per user comes from the
//! flow's per-user critical section, not from the loop.

use std::sync::Arc;

use futures::StreamExt;

use crate::channels::{Incoming, IncomingKind, TelegramChannel};
use crate::error::{ChannelError, FlowError};
use crate::registration::controller::{FlowReply, Prompt, RegistrationFlow};
use crate::registration::model::Language;
use crate::registration::prompts::{PromptKey, prompt};

/// A reply ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outgoing {
    pub chat_id: i64,
    pub text: &'static str,
    pub language_picker: bool,
}

impl Outgoing {
    fn from_prompt(chat_id: i64, prompt: Prompt) -> Self {
        Self {
            chat_id,
            text: prompt.text,
            language_picker: prompt.language_picker,
        }
    }
}

/// Connects the Telegram channel to the registration flow.
pub struct Dispatcher {
    flow: Arc<RegistrationFlow>,
    channel: Arc<TelegramChannel>,
}

impl Dispatcher {
    pub fn new(flow: Arc<RegistrationFlow>, channel: Arc<TelegramChannel>) -> Self {
        Self { flow, channel }
    }

    /// Consume the channel's event stream until it ends.
    pub async fn run(self: Arc<Self>) -> Result<(), ChannelError> {
        let mut events = self.channel.start().await?;
        while let Some(event) = events.next().await {
            let dispatcher = Arc::clone(&self);
            tokio::spawn(async move {
                dispatcher.process(event).await;
            });
        }
        Ok(())
    }

    /// Handle one event and send whatever the flow answered.
    async fn process(&self, event: Incoming) {
        if let IncomingKind::CallbackButton { id, .. } = &event.kind {
            self.channel.answer_callback_query(id).await;
        }

        let Some(outgoing) = self.handle(&event).await else {
            return;
        };

        let result = if outgoing.language_picker {
            self.channel
                .send_language_picker(outgoing.chat_id, outgoing.text)
                .await
        } else {
            self.channel
                .send_message(outgoing.chat_id, outgoing.text)
                .await
        };
        if let Err(e) = result {
            tracing::warn!(user_id = event.user_id, "failed to send reply: {e}");
        }
    }

    /// Route one event through the flow. Pure with respect to the transport:
    /// returns what to send instead of sending it.
    pub async fn handle(&self, event: &Incoming) -> Option<Outgoing> {
        let reply = match &event.kind {
            IncomingKind::Command(cmd) if cmd == "/start" => {
                let picker = self.flow.start(event.user_id).await;
                return Some(Outgoing::from_prompt(event.chat_id, picker));
            }
            IncomingKind::Command(cmd) => {
                tracing::debug!(user_id = event.user_id, command = %cmd, "unknown command");
                return None;
            }
            IncomingKind::Text(text) => self.flow.submit_text(event.user_id, text).await,
            IncomingKind::CallbackButton { data, .. } => {
                match Language::from_callback_token(data) {
                    Some(lang) => self.flow.choose_language(event.user_id, lang).await,
                    None => {
                        tracing::debug!(user_id = event.user_id, data = %data, "unknown callback");
                        FlowReply::Ignored
                    }
                }
            }
            IncomingKind::Photo { file_id } => {
                match self.flow.submit_photo(event.user_id, file_id).await {
                    Ok(reply) => reply,
                    Err(FlowError::Persistence { lang, .. }) => {
                        return Some(Outgoing {
                            chat_id: event.chat_id,
                            text: prompt(PromptKey::SaveFailed, lang),
                            language_picker: false,
                        });
                    }
                    Err(e @ FlowError::Incomplete(_)) => {
                        tracing::error!(user_id = event.user_id, "registration flow bug: {e}");
                        return None;
                    }
                }
            }
        };

        match reply {
            FlowReply::Prompt(p) => Some(Outgoing::from_prompt(event.chat_id, p)),
            FlowReply::Ignored => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use crate::error::StoreError;
    use crate::registration::model::ProfileRecord;
    use crate::registration::state::RegistrationStep;
    use crate::store::{ProfileStore, SqliteProfileStore};

    use super::*;

    fn dispatcher() -> (Arc<SqliteProfileStore>, Dispatcher) {
        let store = Arc::new(SqliteProfileStore::open_in_memory().unwrap());
        let flow = Arc::new(RegistrationFlow::new(store.clone()));
        let channel = Arc::new(TelegramChannel::new("test-token".into(), 1));
        (store, Dispatcher::new(flow, channel))
    }

    fn command(user_id: i64, cmd: &str) -> Incoming {
        Incoming {
            user_id,
            chat_id: user_id,
            kind: IncomingKind::Command(cmd.to_string()),
        }
    }

    fn text(user_id: i64, body: &str) -> Incoming {
        Incoming {
            user_id,
            chat_id: user_id,
            kind: IncomingKind::Text(body.to_string()),
        }
    }

    fn button(user_id: i64, data: &str) -> Incoming {
        Incoming {
            user_id,
            chat_id: user_id,
            kind: IncomingKind::CallbackButton {
                id: "cbq".to_string(),
                data: data.to_string(),
            },
        }
    }

    fn photo(user_id: i64, file_id: &str) -> Incoming {
        Incoming {
            user_id,
            chat_id: user_id,
            kind: IncomingKind::Photo {
                file_id: file_id.to_string(),
            },
        }
    }

    #[tokio::test]
    async fn start_command_returns_language_picker() {
        let (_store, dispatcher) = dispatcher();
        let out = dispatcher.handle(&command(1, "/start")).await.unwrap();
        assert!(out.language_picker);
        assert_eq!(out.chat_id, 1);
        assert_eq!(out.text, prompt(PromptKey::LanguagePicker, Language::En));
    }

    #[tokio::test]
    async fn unknown_command_is_dropped() {
        let (_store, dispatcher) = dispatcher();
        assert_eq!(dispatcher.handle(&command(1, "/help")).await, None);
    }

    #[tokio::test]
    async fn unknown_callback_data_is_dropped() {
        let (_store, dispatcher) = dispatcher();
        dispatcher.handle(&command(1, "/start")).await;
        assert_eq!(dispatcher.handle(&button(1, "premium_yes")).await, None);
    }

    #[tokio::test]
    async fn text_without_conversation_is_dropped() {
        let (_store, dispatcher) = dispatcher();
        assert_eq!(dispatcher.handle(&text(1, "hello")).await, None);
    }

    #[tokio::test]
    async fn full_event_sequence_persists_profile() {
        let (store, dispatcher) = dispatcher();

        dispatcher.handle(&command(8, "/start")).await.unwrap();

        let out = dispatcher.handle(&button(8, "lang_ru")).await.unwrap();
        assert_eq!(out.text, prompt(PromptKey::AskName, Language::Ru));
        assert!(!out.language_picker);

        dispatcher.handle(&text(8, "Boris")).await.unwrap();

        // Invalid age re-prompts, localized
        let out = dispatcher.handle(&text(8, "old")).await.unwrap();
        assert_eq!(out.text, prompt(PromptKey::InvalidAge, Language::Ru));

        dispatcher.handle(&text(8, "41")).await.unwrap();
        dispatcher.handle(&text(8, "Male")).await.unwrap();
        dispatcher.handle(&text(8, "chess, hiking")).await.unwrap();
        dispatcher.handle(&text(8, "privet")).await.unwrap();

        let out = dispatcher.handle(&photo(8, "file-42")).await.unwrap();
        assert_eq!(out.text, prompt(PromptKey::ProfileSaved, Language::Ru));

        let record = store.get(8).await.unwrap().unwrap();
        assert_eq!(record.name, "Boris");
        assert_eq!(record.age, 41);
        assert_eq!(record.photo_ref, "file-42");
        assert_eq!(record.language, Language::Ru);
    }

    /// Store that always fails, for the persistence-failure path.
    struct FailingStore;

    #[async_trait]
    impl ProfileStore for FailingStore {
        async fn upsert(&self, _record: &ProfileRecord) -> Result<(), StoreError> {
            Err(StoreError::Query("disk full".to_string()))
        }

        async fn get(&self, _user_id: i64) -> Result<Option<ProfileRecord>, StoreError> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn persistence_failure_sends_localized_retry_prompt() {
        let flow = Arc::new(RegistrationFlow::new(Arc::new(FailingStore)));
        let channel = Arc::new(TelegramChannel::new("test-token".into(), 1));
        let dispatcher = Dispatcher::new(flow.clone(), channel);

        dispatcher.handle(&command(9, "/start")).await;
        dispatcher.handle(&button(9, "lang_zh")).await;
        dispatcher.handle(&text(9, "Wei")).await;
        dispatcher.handle(&text(9, "33")).await;
        dispatcher.handle(&text(9, "Male")).await;
        dispatcher.handle(&text(9, "go")).await;
        dispatcher.handle(&text(9, "nihao")).await;

        let out = dispatcher.handle(&photo(9, "file-9")).await.unwrap();
        assert_eq!(out.text, prompt(PromptKey::SaveFailed, Language::Zh));

        // Session survives for a retry
        assert_eq!(
            flow.current_step(9).await,
            RegistrationStep::AwaitingPhoto
        );
    }
}
