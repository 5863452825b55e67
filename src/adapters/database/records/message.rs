use crate::domain::key::MessageKey;
use crate::domain::message::{Message, MessageStats, Reply};
use time::OffsetDateTime;

#[derive(Debug, sqlx::FromRow)]
pub struct MessageRecord {
    pub(crate) key: String,
    pub(crate) body: String,
    pub(crate) is_public: bool,
    pub(crate) created_at: OffsetDateTime,
    pub(crate) reply_body: Option<String>,
    pub(crate) reply_timestamp: Option<OffsetDateTime>,
}

impl From<MessageRecord> for Message {
    fn from(record: MessageRecord) -> Self {
        let created_at = record.created_at;
        Self {
            key: MessageKey::from_stored(record.key),
            body: record.body,
            is_public: record.is_public,
            created_at,
            reply: record
                .reply_body
                .map(|body| Reply { body, replied_at: record.reply_timestamp.unwrap_or(created_at) }),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct StatsRecord {
    pub(crate) total: i64,
    pub(crate) replied: i64,
    pub(crate) public: i64,
}

impl From<StatsRecord> for MessageStats {
    fn from(record: StatsRecord) -> Self {
        Self { total: record.total, replied: record.replied, public: record.public }
    }
}
