use crate::config::MessagingConfig;
use crate::domain::key::MessageKey;
use time::OffsetDateTime;

#[derive(Debug, Clone)]
pub struct Message {
    pub key: MessageKey,
    pub body: String,
    pub is_public: bool,
    pub created_at: OffsetDateTime,
    pub reply: Option<Reply>,
}

impl Message {
    #[must_use]
    pub const fn is_replied(&self) -> bool {
        self.reply.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub body: String,
    pub replied_at: OffsetDateTime,
}

/// Outcome of redeeming a key. Only `Replied` carries content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyLookup {
    MalformedKey,
    UnknownKey,
    Pending,
    Replied(Reply),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MessageFilter {
    pub is_public: Option<bool>,
    pub replied: Option<bool>,
}

impl MessageFilter {
    #[must_use]
    pub const fn public_only() -> Self {
        Self { is_public: Some(true), replied: None }
    }
}

/// Optional window over a listing. `limit: None` means everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Page {
    pub limit: Option<i64>,
    pub offset: i64,
}

impl Page {
    #[must_use]
    pub fn new(limit: Option<i64>, offset: Option<i64>, max_page_size: i64) -> Self {
        Self { limit: limit.map(|l| l.clamp(1, max_page_size.max(1))), offset: offset.unwrap_or(0).max(0) }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MessageStats {
    pub total: i64,
    pub replied: i64,
    pub public: i64,
}

impl MessageStats {
    #[must_use]
    pub const fn pending(&self) -> i64 {
        self.total - self.replied
    }

    #[must_use]
    pub const fn private(&self) -> i64 {
        self.total - self.public
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TextLimits {
    pub message_min: usize,
    pub message_max: usize,
    pub reply_max: usize,
}

impl From<&MessagingConfig> for TextLimits {
    fn from(config: &MessagingConfig) -> Self {
        Self {
            message_min: config.message_min_length,
            message_max: config.message_max_length,
            reply_max: config.reply_max_length,
        }
    }
}

impl TextLimits {
    /// Trims and length-checks a submitted message body.
    ///
    /// # Errors
    /// Returns every violated constraint as a human-readable message.
    pub fn message_body(&self, raw: &str) -> Result<String, Vec<String>> {
        let body = raw.trim();
        if body.is_empty() {
            return Err(vec!["Message cannot be empty".to_string()]);
        }
        let len = body.chars().count();
        if len < self.message_min {
            return Err(vec![format!("Message must be at least {} characters", self.message_min)]);
        }
        if len > self.message_max {
            return Err(vec![format!("Message must be at most {} characters", self.message_max)]);
        }
        Ok(body.to_string())
    }

    /// Trims and length-checks admin reply text.
    ///
    /// # Errors
    /// Returns every violated constraint as a human-readable message.
    pub fn reply_body(&self, raw: &str) -> Result<String, Vec<String>> {
        let body = raw.trim();
        if body.is_empty() {
            return Err(vec!["Reply cannot be empty".to_string()]);
        }
        if body.chars().count() > self.reply_max {
            return Err(vec![format!("Reply must be at most {} characters", self.reply_max)]);
        }
        Ok(body.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMITS: TextLimits = TextLimits { message_min: 10, message_max: 500, reply_max: 20 };

    #[test]
    fn test_message_body_is_trimmed() {
        assert_eq!(LIMITS.message_body("   Hello there, anonymous!\n").unwrap(), "Hello there, anonymous!");
    }

    #[test]
    fn test_message_body_bounds() {
        assert!(LIMITS.message_body("hi").is_err());
        assert!(LIMITS.message_body("          ").is_err());
        assert!(LIMITS.message_body(&"a".repeat(10)).is_ok());
        assert!(LIMITS.message_body(&"a".repeat(500)).is_ok());
        assert!(LIMITS.message_body(&"a".repeat(501)).is_err());
    }

    #[test]
    fn test_whitespace_padding_does_not_satisfy_minimum() {
        assert!(LIMITS.message_body("   hi      ").is_err());
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        // 10 characters, 20 bytes
        assert!(LIMITS.message_body("éééééééééé").is_ok());
    }

    #[test]
    fn test_reply_body_bounds() {
        assert!(LIMITS.reply_body("  ").is_err());
        assert_eq!(LIMITS.reply_body(" Thanks! ").unwrap(), "Thanks!");
        assert!(LIMITS.reply_body(&"x".repeat(21)).is_err());
    }

    #[test]
    fn test_page_clamping() {
        assert_eq!(Page::new(None, None, 100), Page { limit: None, offset: 0 });
        assert_eq!(Page::new(Some(0), Some(-5), 100), Page { limit: Some(1), offset: 0 });
        assert_eq!(Page::new(Some(1000), Some(3), 100), Page { limit: Some(100), offset: 3 });
    }

    #[test]
    fn test_stats_derived_counts() {
        let stats = MessageStats { total: 7, replied: 3, public: 2 };
        assert_eq!(stats.pending(), 4);
        assert_eq!(stats.private(), 5);
    }
}
