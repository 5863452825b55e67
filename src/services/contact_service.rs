use crate::adapters::database::DbPool;
use crate::adapters::database::message_repo::MessageRepository;
use crate::domain::key::{KeyGenerator, MessageKey};
use crate::domain::message::{Message, MessageFilter, MessageStats, Page, Reply, ReplyLookup, TextLimits};
use crate::error::{AppError, Result};
use opentelemetry::{KeyValue, global, metrics::Counter};
use std::sync::Arc;
use time::OffsetDateTime;

const MAX_KEY_ATTEMPTS: usize = 5;
const KEY_NOT_FOUND: &str = "Message key not found";

#[derive(Clone, Debug)]
pub(crate) struct Metrics {
    pub(crate) submitted_total: Counter<u64>,
    pub(crate) reply_checks_total: Counter<u64>,
    pub(crate) replies_total: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("contact-server");
        Self {
            submitted_total: meter
                .u64_counter("contact_messages_submitted_total")
                .with_description("Total messages accepted from anonymous senders")
                .build(),
            reply_checks_total: meter
                .u64_counter("contact_reply_checks_total")
                .with_description("Reply checks by outcome")
                .build(),
            replies_total: meter
                .u64_counter("contact_replies_written_total")
                .with_description("Admin replies written, including overwrites")
                .build(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ContactService {
    pool: DbPool,
    repo: MessageRepository,
    keys: Arc<dyn KeyGenerator>,
    limits: TextLimits,
    max_page_size: i64,
    metrics: Metrics,
}

impl ContactService {
    #[must_use]
    pub fn new(
        pool: DbPool,
        repo: MessageRepository,
        keys: Arc<dyn KeyGenerator>,
        limits: TextLimits,
        max_page_size: i64,
    ) -> Self {
        Self { pool, repo, keys, limits, max_page_size, metrics: Metrics::new() }
    }

    /// Stores an anonymous message under a freshly generated key.
    ///
    /// # Errors
    /// Returns `AppError::Validation` if the body is empty or out of bounds.
    /// Returns `AppError::Internal` if no unused key could be generated.
    /// Returns `AppError::Database` if the insert fails.
    #[tracing::instrument(err(level = "warn"), skip(self, raw_body))]
    pub async fn submit(&self, raw_body: &str, is_public: bool) -> Result<Message> {
        let body = self.limits.message_body(raw_body).map_err(|errors| AppError::field("message", errors))?;

        let mut conn = self.pool.acquire().await?;
        let created_at = OffsetDateTime::now_utc();

        for attempt in 1..=MAX_KEY_ATTEMPTS {
            let key = self.keys.generate();
            if let Some(message) = self.repo.create(&mut conn, &key, &body, is_public, created_at).await? {
                tracing::debug!(is_public, "Message stored");
                self.metrics
                    .submitted_total
                    .add(1, &[KeyValue::new("visibility", if is_public { "public" } else { "private" })]);
                return Ok(message);
            }
            tracing::warn!(attempt, "Generated message key already in use, retrying");
        }

        tracing::error!(attempts = MAX_KEY_ATTEMPTS, "Could not generate an unused message key");
        Err(AppError::Internal)
    }

    /// Redeems a key. Unknown, malformed and unanswered keys are ordinary outcomes, not errors.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the lookup fails.
    #[tracing::instrument(err(level = "warn"), skip(self, raw_key))]
    pub async fn check_reply(&self, raw_key: &str) -> Result<ReplyLookup> {
        let lookup = match MessageKey::parse(raw_key.trim()) {
            None => ReplyLookup::MalformedKey,
            Some(key) => {
                let mut conn = self.pool.acquire().await?;
                match self.repo.find_by_key(&mut conn, &key).await? {
                    None => ReplyLookup::UnknownKey,
                    Some(Message { reply: None, .. }) => ReplyLookup::Pending,
                    Some(Message { reply: Some(reply), .. }) => ReplyLookup::Replied(reply),
                }
            }
        };

        let outcome = match &lookup {
            ReplyLookup::MalformedKey => "malformed",
            ReplyLookup::UnknownKey => "unknown",
            ReplyLookup::Pending => "pending",
            ReplyLookup::Replied(_) => "replied",
        };
        self.metrics.reply_checks_total.add(1, &[KeyValue::new("outcome", outcome)]);

        Ok(lookup)
    }

    /// Lists public messages, newest first.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the query fails.
    #[tracing::instrument(err(level = "warn"), skip(self))]
    pub async fn public_messages(&self, page: Page) -> Result<Vec<Message>> {
        let mut conn = self.pool.acquire().await?;
        self.repo.list(&mut conn, MessageFilter::public_only(), page).await
    }

    /// Lists every message matching `filter`, newest first.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the query fails.
    #[tracing::instrument(err(level = "warn"), skip(self))]
    pub async fn list_messages(&self, filter: MessageFilter, page: Page) -> Result<Vec<Message>> {
        let mut conn = self.pool.acquire().await?;
        self.repo.list(&mut conn, filter, page).await
    }

    /// Fetches a single message by key.
    ///
    /// # Errors
    /// Returns `AppError::NotFound` if no message has this key.
    /// Returns `AppError::Database` if the lookup fails.
    #[tracing::instrument(err(level = "debug"), skip(self, raw_key))]
    pub async fn get_message(&self, raw_key: &str) -> Result<Message> {
        let key = MessageKey::parse(raw_key.trim()).ok_or_else(|| AppError::NotFound(KEY_NOT_FOUND.to_string()))?;
        let mut conn = self.pool.acquire().await?;
        self.repo.find_by_key(&mut conn, &key).await?.ok_or_else(|| AppError::NotFound(KEY_NOT_FOUND.to_string()))
    }

    /// Sets the reply on a message, replacing any earlier reply.
    ///
    /// # Errors
    /// Returns `AppError::Validation` if the reply text is empty or too long.
    /// Returns `AppError::NotFound` if no message has this key.
    /// Returns `AppError::Database` if the update fails.
    #[tracing::instrument(err(level = "debug"), skip(self, raw_key, raw_reply))]
    pub async fn reply(&self, raw_key: &str, raw_reply: &str) -> Result<Reply> {
        let body = self.limits.reply_body(raw_reply).map_err(|errors| AppError::field("reply", errors))?;
        let key = MessageKey::parse(raw_key.trim()).ok_or_else(|| AppError::NotFound(KEY_NOT_FOUND.to_string()))?;

        let replied_at = OffsetDateTime::now_utc();
        let mut conn = self.pool.acquire().await?;
        if !self.repo.set_reply(&mut conn, &key, &body, replied_at).await? {
            return Err(AppError::NotFound(KEY_NOT_FOUND.to_string()));
        }

        tracing::info!("Reply stored");
        self.metrics.replies_total.add(1, &[]);
        Ok(Reply { body, replied_at })
    }

    /// Aggregate counts over all messages.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the query fails.
    #[tracing::instrument(err(level = "warn"), skip(self))]
    pub async fn stats(&self) -> Result<MessageStats> {
        let mut conn = self.pool.acquire().await?;
        self.repo.stats(&mut conn).await
    }

    #[must_use]
    pub fn page(&self, limit: Option<i64>, offset: Option<i64>) -> Page {
        Page::new(limit, offset, self.max_page_size)
    }
}
