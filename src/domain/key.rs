use rand::{Rng, rngs::OsRng};
use std::fmt;

pub const KEY_LENGTH: usize = 16;
const KEY_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Capability token that unlocks the reply to one message.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct MessageKey(String);

impl MessageKey {
    /// Accepts only keys in the issued format: 16 characters of `[a-z0-9]`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let well_formed =
            raw.len() == KEY_LENGTH && raw.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit());
        well_formed.then(|| Self(raw.to_string()))
    }

    /// Wraps a key read back from the store, which only ever holds issued keys.
    pub(crate) const fn from_stored(raw: String) -> Self {
        Self(raw)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for MessageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Keys are capabilities; traces only ever see a prefix.
impl fmt::Debug for MessageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix: String = self.0.chars().take(4).collect();
        write!(f, "MessageKey({prefix}…)")
    }
}

/// Source of fresh message keys.
pub trait KeyGenerator: Send + Sync + fmt::Debug {
    fn generate(&self) -> MessageKey;
}

/// Draws keys from the operating system CSPRNG.
#[derive(Clone, Copy, Debug, Default)]
pub struct OsKeyGenerator;

impl KeyGenerator for OsKeyGenerator {
    fn generate(&self) -> MessageKey {
        let key: String =
            (0..KEY_LENGTH).map(|_| char::from(KEY_ALPHABET[OsRng.gen_range(0..KEY_ALPHABET.len())])).collect();
        MessageKey(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generated_keys_are_well_formed() {
        let generator = OsKeyGenerator;
        for _ in 0..100 {
            let key = generator.generate();
            assert!(MessageKey::parse(key.as_str()).is_some(), "malformed key: {key}");
        }
    }

    #[test]
    fn test_generated_keys_do_not_repeat() {
        let generator = OsKeyGenerator;
        let keys: HashSet<_> = (0..1000).map(|_| generator.generate()).collect();
        assert_eq!(keys.len(), 1000);
    }

    #[test]
    fn test_parse_rejects_bad_keys() {
        assert!(MessageKey::parse("").is_none());
        assert!(MessageKey::parse("short").is_none());
        assert!(MessageKey::parse("ABCDEFGH12345678").is_none());
        assert!(MessageKey::parse("abcdefgh-2345678").is_none());
        assert!(MessageKey::parse("abcdefgh123456789").is_none());
        assert!(MessageKey::parse("abcdefgh1234567é").is_none());
        assert!(MessageKey::parse("abcdefgh12345678").is_some());
    }

    #[test]
    fn test_debug_hides_key() {
        let key = MessageKey::parse("abcdefgh12345678").unwrap();
        let rendered = format!("{key:?}");
        assert!(!rendered.contains("12345678"));
    }
}
