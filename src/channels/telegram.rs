//! Telegram channel — long-polls the Bot API for updates.
//!
//! Classifies raw updates into `Incoming` events for the dispatcher and
//! sends prompts back, including the inline language keyboard.

use serde_json::Value;

use crate::channels::{EventStream, Incoming, IncomingKind};
use crate::error::ChannelError;
use crate::registration::model::Language;

/// Telegram channel — connects to the Bot API via long-polling.
pub struct TelegramChannel {
    bot_token: String,
    poll_timeout_secs: u64,
    client: reqwest::Client,
}

impl TelegramChannel {
    pub fn new(bot_token: String, poll_timeout_secs: u64) -> Self {
        Self {
            bot_token,
            poll_timeout_secs,
            client: reqwest::Client::new(),
        }
    }

    fn api_url(&self, method: &str) -> String {
        format!("https://api.telegram.org/bot{}/{method}", self.bot_token)
    }

    /// Verify the token against `getMe` before entering the poll loop.
    pub async fn health_check(&self) -> Result<(), ChannelError> {
        let resp = self
            .client
            .get(self.api_url("getMe"))
            .send()
            .await
            .map_err(|e| ChannelError::StartupFailed {
                name: "telegram".into(),
                reason: e.to_string(),
            })?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(ChannelError::StartupFailed {
                name: "telegram".into(),
                reason: format!("getMe returned {}", resp.status()),
            })
        }
    }

    /// Spawn the long-poll loop and return the stream of classified events.
    pub async fn start(&self) -> Result<EventStream, ChannelError> {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let url = self.api_url("getUpdates");
        let poll_timeout = self.poll_timeout_secs;
        let client = self.client.clone();

        tokio::spawn(async move {
            let mut offset: i64 = 0;

            tracing::info!("Telegram channel listening for updates...");

            loop {
                let body = serde_json::json!({
                    "offset": offset,
                    "timeout": poll_timeout,
                    "allowed_updates": ["message", "callback_query"]
                });

                let resp = match client.post(&url).json(&body).send().await {
                    Ok(r) => r,
                    Err(e) => {
                        tracing::warn!("Telegram poll error: {e}");
                        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                        continue;
                    }
                };

                let data: Value = match resp.json().await {
                    Ok(d) => d,
                    Err(e) => {
                        tracing::warn!("Telegram parse error: {e}");
                        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                        continue;
                    }
                };

                if let Some(results) = data.get("result").and_then(Value::as_array) {
                    for update in results {
                        // Advance offset past this update
                        if let Some(uid) = update.get("update_id").and_then(Value::as_i64) {
                            offset = uid + 1;
                        }

                        let Some(incoming) = parse_update(update) else {
                            continue;
                        };

                        if tx.send(incoming).is_err() {
                            tracing::info!("Telegram listener channel closed");
                            return;
                        }
                    }
                }
            }
        });

        let stream = futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|event| (event, rx))
        });

        Ok(Box::pin(stream))
    }

    /// Send a plain text message.
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), ChannelError> {
        let body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
        });
        self.post("sendMessage", body).await
    }

    /// Send the language picker: prompt text plus one button per language.
    pub async fn send_language_picker(
        &self,
        chat_id: i64,
        text: &str,
    ) -> Result<(), ChannelError> {
        let body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
            "reply_markup": language_keyboard(),
        });
        self.post("sendMessage", body).await
    }

    /// Acknowledge a callback query so the client stops its spinner.
    /// Best-effort: a failure here only costs the spinner.
    pub async fn answer_callback_query(&self, callback_id: &str) {
        let body = serde_json::json!({ "callback_query_id": callback_id });
        if let Err(e) = self.post("answerCallbackQuery", body).await {
            tracing::warn!("answerCallbackQuery failed: {e}");
        }
    }

    async fn post(&self, method: &str, body: Value) -> Result<(), ChannelError> {
        let resp = self
            .client
            .post(self.api_url(method))
            .json(&body)
            .send()
            .await
            .map_err(|e| ChannelError::SendFailed {
                name: "telegram".into(),
                reason: e.to_string(),
            })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let err = resp.text().await.unwrap_or_default();
            return Err(ChannelError::SendFailed {
                name: "telegram".into(),
                reason: format!("{method} failed ({status}): {err}"),
            });
        }
        Ok(())
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

/// Inline keyboard with one row per supported language.
fn language_keyboard() -> Value {
    let rows: Vec<Value> = Language::ALL
        .iter()
        .map(|lang| {
            serde_json::json!([{
                "text": lang.label(),
                "callback_data": lang.callback_token(),
            }])
        })
        .collect();
    serde_json::json!({ "inline_keyboard": rows })
}

/// Classify one raw update into an `Incoming` event.
///
/// Updates that carry nothing the flow handles (stickers, edits, joins, ...)
/// map to `None` and are skipped.
pub fn parse_update(update: &Value) -> Option<Incoming> {
    if let Some(message) = update.get("message") {
        let user_id = message.get("from")?.get("id")?.as_i64()?;
        let chat_id = message.get("chat")?.get("id")?.as_i64()?;

        if let Some(text) = message.get("text").and_then(Value::as_str) {
            let kind = if text.starts_with('/') {
                IncomingKind::Command(normalize_command(text))
            } else {
                IncomingKind::Text(text.to_string())
            };
            return Some(Incoming {
                user_id,
                chat_id,
                kind,
            });
        }

        if let Some(photos) = message.get("photo").and_then(Value::as_array) {
            // Telegram orders size variants ascending; the last is the largest
            let file_id = photos.last()?.get("file_id")?.as_str()?;
            return Some(Incoming {
                user_id,
                chat_id,
                kind: IncomingKind::Photo {
                    file_id: file_id.to_string(),
                },
            });
        }

        return None;
    }

    if let Some(callback) = update.get("callback_query") {
        let id = callback.get("id")?.as_str()?;
        let user_id = callback.get("from")?.get("id")?.as_i64()?;
        let data = callback.get("data")?.as_str()?;
        // The originating chat; falls back to the private chat with the user
        let chat_id = callback
            .get("message")
            .and_then(|m| m.get("chat"))
            .and_then(|c| c.get("id"))
            .and_then(Value::as_i64)
            .unwrap_or(user_id);
        return Some(Incoming {
            user_id,
            chat_id,
            kind: IncomingKind::CallbackButton {
                id: id.to_string(),
                data: data.to_string(),
            },
        });
    }

    None
}

/// `/start@some_bot arg` → `/start`.
fn normalize_command(text: &str) -> String {
    let first = text.split_whitespace().next().unwrap_or(text);
    let bare = first.split('@').next().unwrap_or(first);
    bare.to_string()
}

// ── Tests ───────────────────────────────────────────────────────────
