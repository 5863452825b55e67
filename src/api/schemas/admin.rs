use crate::api::schemas::contact::SUCCESS;
use crate::domain::message::{Message, MessageFilter, MessageStats};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Default, Deserialize)]
pub struct AdminListQuery {
    pub public: Option<bool>,
    pub replied: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl AdminListQuery {
    #[must_use]
    pub const fn filter(&self) -> MessageFilter {
        MessageFilter { is_public: self.public, replied: self.replied }
    }
}

/// Full message view for the administrator, including the key.
#[derive(Debug, Serialize)]
pub struct AdminMessage {
    pub key: String,
    pub message: String,
    pub public: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub reply: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub reply_timestamp: Option<OffsetDateTime>,
    pub replied: bool,
}

impl From<Message> for AdminMessage {
    fn from(message: Message) -> Self {
        let replied = message.is_replied();
        let (reply, reply_timestamp) = message.reply.map(|r| (r.body, r.replied_at)).unzip();
        Self {
            key: message.key.into_inner(),
            message: message.body,
            public: message.is_public,
            timestamp: message.created_at,
            reply,
            reply_timestamp,
            replied,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AdminMessageResponse {
    pub status: &'static str,
    pub message: AdminMessage,
}

impl From<Message> for AdminMessageResponse {
    fn from(message: Message) -> Self {
        Self { status: SUCCESS, message: message.into() }
    }
}

#[derive(Debug, Deserialize)]
pub struct ReplyRequest {
    pub reply: String,
}

/// Query-string form of the reply; takes priority over a JSON body.
#[derive(Debug, Default, Deserialize)]
pub struct ReplyQuery {
    pub reply_text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReplyResponse {
    pub status: &'static str,
    pub message: &'static str,
    #[serde(with = "time::serde::rfc3339")]
    pub reply_timestamp: OffsetDateTime,
}

impl ReplyResponse {
    #[must_use]
    pub const fn stored(reply_timestamp: OffsetDateTime) -> Self {
        Self { status: SUCCESS, message: "Reply stored successfully", reply_timestamp }
    }
}

#[derive(Debug, Serialize)]
pub struct Stats {
    pub total_messages: i64,
    pub replied_messages: i64,
    pub pending_messages: i64,
    pub public_messages: i64,
    pub private_messages: i64,
}

impl From<MessageStats> for Stats {
    fn from(stats: MessageStats) -> Self {
        Self {
            total_messages: stats.total,
            replied_messages: stats.replied,
            pending_messages: stats.pending(),
            public_messages: stats.public,
            private_messages: stats.private(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub status: &'static str,
    pub stats: Stats,
}

impl From<MessageStats> for StatsResponse {
    fn from(stats: MessageStats) -> Self {
        Self { status: SUCCESS, stats: stats.into() }
    }
}
