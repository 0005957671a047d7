//! Chat transport abstraction — typed events in, prompts out.

pub mod telegram;

pub use telegram::TelegramChannel;

use std::pin::Pin;

use futures::Stream;

/// One inbound user event, already classified by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Incoming {
    /// Stable numeric identity of the sender.
    pub user_id: i64,
    /// Chat to answer into (equals `user_id` in private chats).
    pub chat_id: i64,
    pub kind: IncomingKind,
}

/// What the user sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncomingKind {
    /// A `/command`, normalized: first token, bot-name suffix stripped.
    Command(String),
    /// Plain text.
    Text(String),
    /// An inline-keyboard button press.
    CallbackButton { id: String, data: String },
    /// A photo; `file_id` refers to the largest size variant.
    Photo { file_id: String },
}

/// Stream of inbound events produced by a channel.
pub type EventStream = Pin<Box<dyn Stream<Item = Incoming> + Send>>;
