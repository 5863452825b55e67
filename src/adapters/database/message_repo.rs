use crate::adapters::database::records::{MessageRecord, StatsRecord};
use crate::domain::key::MessageKey;
use crate::domain::message::{Message, MessageFilter, MessageStats, Page};
use crate::error::{AppError, Result};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use time::OffsetDateTime;

const MESSAGE_COLUMNS: &str = "key, body, is_public, created_at, reply_body, reply_timestamp";

#[derive(Clone, Debug, Default)]
pub struct MessageRepository {}

impl MessageRepository {
    #[must_use]
    pub const fn new() -> Self {
        Self {}
    }

    /// Records a new message in the database.
    ///
    /// Returns `Ok(None)` when `key` is already taken, leaving the table untouched.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the insert fails for any other reason.
    #[tracing::instrument(level = "debug", skip(self, conn, key, body))]
    pub(crate) async fn create(
        &self,
        conn: &mut SqliteConnection,
        key: &MessageKey,
        body: &str,
        is_public: bool,
        created_at: OffsetDateTime,
    ) -> Result<Option<Message>> {
        let result = sqlx::query_as::<_, MessageRecord>(
            r"
            INSERT INTO messages (key, body, is_public, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING key, body, is_public, created_at, reply_body, reply_timestamp
            ",
        )
        .bind(key.as_str())
        .bind(body)
        .bind(is_public)
        .bind(created_at)
        .fetch_one(conn)
        .await;

        match result {
            Ok(record) => Ok(Some(record.into())),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Ok(None),
            Err(e) => Err(AppError::Database(e)),
        }
    }

    /// Fetches a message by its exact key.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the query fails.
    #[tracing::instrument(level = "debug", skip(self, conn))]
    pub(crate) async fn find_by_key(&self, conn: &mut SqliteConnection, key: &MessageKey) -> Result<Option<Message>> {
        let record = sqlx::query_as::<_, MessageRecord>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE key = ?"
        ))
        .bind(key.as_str())
        .fetch_optional(conn)
        .await?;

        Ok(record.map(Into::into))
    }

    /// Sets (or overwrites) the reply on a message.
    ///
    /// Returns `false` if no message has this key.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the update fails.
    #[tracing::instrument(level = "debug", skip(self, conn, reply))]
    pub(crate) async fn set_reply(
        &self,
        conn: &mut SqliteConnection,
        key: &MessageKey,
        reply: &str,
        replied_at: OffsetDateTime,
    ) -> Result<bool> {
        let result = sqlx::query("UPDATE messages SET reply_body = ?, reply_timestamp = ? WHERE key = ?")
            .bind(reply)
            .bind(replied_at)
            .bind(key.as_str())
            .execute(conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists messages matching `filter`, newest first.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the query fails.
    #[tracing::instrument(level = "debug", skip(self, conn))]
    pub(crate) async fn list(
        &self,
        conn: &mut SqliteConnection,
        filter: MessageFilter,
        page: Page,
    ) -> Result<Vec<Message>> {
        let mut query = QueryBuilder::<Sqlite>::new(format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE 1 = 1"));

        if let Some(is_public) = filter.is_public {
            query.push(" AND is_public = ").push_bind(is_public);
        }
        match filter.replied {
            Some(true) => {
                query.push(" AND reply_body IS NOT NULL");
            }
            Some(false) => {
                query.push(" AND reply_body IS NULL");
            }
            None => {}
        }

        // Stored timestamps have variable-width fractions and do not sort as text; ids follow insertion.
        query.push(" ORDER BY id DESC");

        match page.limit {
            Some(limit) => {
                query.push(" LIMIT ").push_bind(limit).push(" OFFSET ").push_bind(page.offset);
            }
            // SQLite only accepts OFFSET after a LIMIT; -1 means unbounded.
            None if page.offset > 0 => {
                query.push(" LIMIT -1 OFFSET ").push_bind(page.offset);
            }
            None => {}
        }

        let records = query.build_query_as::<MessageRecord>().fetch_all(conn).await?;
        Ok(records.into_iter().map(Into::into).collect())
    }

    /// Aggregates message counts in a single pass.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the query fails.
    #[tracing::instrument(level = "debug", skip(self, conn))]
    pub(crate) async fn stats(&self, conn: &mut SqliteConnection) -> Result<MessageStats> {
        let record = sqlx::query_as::<_, StatsRecord>(
            r"
            SELECT
                COUNT(*) AS total,
                COALESCE(SUM(CASE WHEN reply_body IS NOT NULL THEN 1 ELSE 0 END), 0) AS replied,
                COALESCE(SUM(CASE WHEN is_public THEN 1 ELSE 0 END), 0) AS public
            FROM messages
            ",
        )
        .fetch_one(conn)
        .await?;

        Ok(record.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::database::DbPool;
    use sqlx::sqlite::SqlitePoolOptions;
    use time::Duration;
    use time::macros::datetime;

    async fn memory_pool() -> DbPool {
        let pool = SqlitePoolOptions::new().max_connections(1).connect("sqlite::memory:").await.unwrap();
        sqlx::migrate!().run(&pool).await.unwrap();
        pool
    }

    fn key(raw: &str) -> MessageKey {
        MessageKey::parse(raw).unwrap()
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let pool = memory_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let repo = MessageRepository::new();
        let now = OffsetDateTime::now_utc();

        let created = repo.create(&mut conn, &key("aaaaaaaaaaaaaaaa"), "hello world!", true, now).await.unwrap();
        let created = created.expect("fresh key should insert");
        assert!(created.is_public);
        assert!(!created.is_replied());

        let found = repo.find_by_key(&mut conn, &key("aaaaaaaaaaaaaaaa")).await.unwrap().unwrap();
        assert_eq!(found.body, "hello world!");
        assert!(repo.find_by_key(&mut conn, &key("bbbbbbbbbbbbbbbb")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_key_is_reported_not_raised() {
        let pool = memory_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let repo = MessageRepository::new();
        let now = OffsetDateTime::now_utc();

        let first = repo.create(&mut conn, &key("aaaaaaaaaaaaaaaa"), "first message", false, now).await.unwrap();
        assert!(first.is_some());
        let second = repo.create(&mut conn, &key("aaaaaaaaaaaaaaaa"), "second message", false, now).await.unwrap();
        assert!(second.is_none());
        assert_eq!(repo.stats(&mut conn).await.unwrap().total, 1);
    }

    #[tokio::test]
    async fn test_set_reply_overwrites() {
        let pool = memory_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let repo = MessageRepository::new();
        let now = OffsetDateTime::now_utc();
        let k = key("cccccccccccccccc");

        repo.create(&mut conn, &k, "a question here", false, now).await.unwrap();
        assert!(repo.set_reply(&mut conn, &k, "first", now).await.unwrap());
        assert!(repo.set_reply(&mut conn, &k, "second", now + Duration::seconds(1)).await.unwrap());

        let reply = repo.find_by_key(&mut conn, &k).await.unwrap().unwrap().reply.unwrap();
        assert_eq!(reply.body, "second");
        assert!(!repo.set_reply(&mut conn, &key("dddddddddddddddd"), "nobody", now).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_filters_and_order() {
        let pool = memory_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let repo = MessageRepository::new();
        let base = OffsetDateTime::now_utc();

        let keys = ["k000000000000000", "k000000000000001", "k000000000000002", "k000000000000003"];
        for (i, raw) in keys.iter().enumerate() {
            let offset = Duration::seconds(i64::try_from(i).unwrap());
            repo.create(&mut conn, &key(raw), &format!("message {i}"), i % 2 == 0, base + offset).await.unwrap();
        }
        repo.set_reply(&mut conn, &key(keys[2]), "answered", base).await.unwrap();

        let all = repo.list(&mut conn, MessageFilter::default(), Page::default()).await.unwrap();
        let bodies: Vec<_> = all.iter().map(|m| m.body.as_str()).collect();
        assert_eq!(bodies, ["message 3", "message 2", "message 1", "message 0"]);

        let public = repo.list(&mut conn, MessageFilter::public_only(), Page::default()).await.unwrap();
        assert!(public.iter().all(|m| m.is_public));
        assert_eq!(public.len(), 2);

        let pending_public = MessageFilter { is_public: Some(true), replied: Some(false) };
        let pending = repo.list(&mut conn, pending_public, Page::default()).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].body, "message 0");

        let window = repo.list(&mut conn, MessageFilter::default(), Page { limit: Some(2), offset: 1 }).await.unwrap();
        let bodies: Vec<_> = window.iter().map(|m| m.body.as_str()).collect();
        assert_eq!(bodies, ["message 2", "message 1"]);

        let tail = repo.list(&mut conn, MessageFilter::default(), Page { limit: None, offset: 3 }).await.unwrap();
        assert_eq!(tail.len(), 1);
    }

    #[tokio::test]
    async fn test_list_newest_first_within_one_second() {
        let pool = memory_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let repo = MessageRepository::new();

        let older = datetime!(2025-01-02 03:04:05.100 UTC);
        let newer = datetime!(2025-01-02 03:04:05.120 UTC);
        let whole = datetime!(2025-01-02 03:04:06 UTC);
        let latest = datetime!(2025-01-02 03:04:06.3 UTC);

        repo.create(&mut conn, &key("aaaaaaaaaaaaaaaa"), "older message", true, older).await.unwrap();
        repo.create(&mut conn, &key("bbbbbbbbbbbbbbbb"), "newer message", true, newer).await.unwrap();
        repo.create(&mut conn, &key("cccccccccccccccc"), "whole second", true, whole).await.unwrap();
        repo.create(&mut conn, &key("dddddddddddddddd"), "latest message", true, latest).await.unwrap();

        let listed = repo.list(&mut conn, MessageFilter::default(), Page::default()).await.unwrap();
        let bodies: Vec<_> = listed.iter().map(|m| m.body.as_str()).collect();
        assert_eq!(bodies, ["latest message", "whole second", "newer message", "older message"]);

        let page = Page { limit: Some(2), offset: 1 };
        let window = repo.list(&mut conn, MessageFilter::public_only(), page).await.unwrap();
        let bodies: Vec<_> = window.iter().map(|m| m.body.as_str()).collect();
        assert_eq!(bodies, ["whole second", "newer message"]);
    }

    #[tokio::test]
    async fn test_stats() {
        let pool = memory_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let repo = MessageRepository::new();
        let now = OffsetDateTime::now_utc();

        assert_eq!(repo.stats(&mut conn).await.unwrap(), MessageStats::default());

        repo.create(&mut conn, &key("eeeeeeeeeeeeeeee"), "public message", true, now).await.unwrap();
        repo.create(&mut conn, &key("ffffffffffffffff"), "private message", false, now).await.unwrap();
        repo.set_reply(&mut conn, &key("ffffffffffffffff"), "ok", now).await.unwrap();

        let stats = repo.stats(&mut conn).await.unwrap();
        assert_eq!(stats, MessageStats { total: 2, replied: 1, public: 1 });
    }
}
