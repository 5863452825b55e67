use crate::domain::message::{Message, Reply, ReplyLookup};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

pub const SUCCESS: &str = "success";
pub const ERROR: &str = "error";

#[derive(Debug, Deserialize)]
pub struct SendMessage {
    pub message: String,
    #[serde(default)]
    pub public: bool,
}

#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub key: String,
}

impl SendMessageResponse {
    #[must_use]
    pub const fn sent(key: String) -> Self {
        Self { status: SUCCESS, message: "Message sent successfully! Save your key to check for replies.", key }
    }
}

#[derive(Debug, Deserialize)]
pub struct CheckReply {
    pub key: String,
}

#[derive(Debug, Serialize)]
pub struct CheckReplyResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", with = "time::serde::rfc3339::option")]
    pub reply_timestamp: Option<OffsetDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

impl CheckReplyResponse {
    const fn soft_error(message: &'static str) -> Self {
        Self { status: ERROR, reply: None, reply_timestamp: None, message: Some(message) }
    }
}

impl From<ReplyLookup> for CheckReplyResponse {
    fn from(lookup: ReplyLookup) -> Self {
        match lookup {
            ReplyLookup::MalformedKey => Self::soft_error("Invalid key format."),
            ReplyLookup::UnknownKey => Self::soft_error("Invalid key. No message found with this key."),
            ReplyLookup::Pending => Self::soft_error("No reply yet. Please check back later."),
            ReplyLookup::Replied(Reply { body, replied_at }) => {
                Self { status: SUCCESS, reply: Some(body), reply_timestamp: Some(replied_at), message: None }
            }
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// A public message as shown to anonymous visitors. Never carries the key.
#[derive(Debug, Serialize)]
pub struct PublicMessage {
    pub message: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub reply: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub reply_timestamp: Option<OffsetDateTime>,
    pub replied: bool,
}

impl From<Message> for PublicMessage {
    fn from(message: Message) -> Self {
        let replied = message.is_replied();
        let (reply, reply_timestamp) = message.reply.map(|r| (r.body, r.replied_at)).unzip();
        Self { message: message.body, timestamp: message.created_at, reply, reply_timestamp, replied }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageList<T> {
    pub status: &'static str,
    pub messages: Vec<T>,
}

impl<T> MessageList<T> {
    #[must_use]
    pub fn new(messages: impl IntoIterator<Item = Message>) -> Self
    where
        T: From<Message>,
    {
        Self { status: SUCCESS, messages: messages.into_iter().map(T::from).collect() }
    }
}
