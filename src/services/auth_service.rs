use crate::config::AdminSecret;
use sha2::{Digest, Sha256};
use std::fmt;

/// Verifies admin bearer tokens against the configured shared secret.
///
/// Both sides are hashed before comparison so the comparison runs over
/// fixed-length digests, and the loop never exits early.
#[derive(Clone)]
pub struct AdminAuthenticator {
    secret_digest: Option<[u8; 32]>,
}

impl AdminAuthenticator {
    /// An unset or empty secret disables admin access entirely.
    #[must_use]
    pub fn new(secret: Option<&AdminSecret>) -> Self {
        let secret_digest = secret.filter(|s| !s.expose().is_empty()).map(|s| digest(s.expose()));
        Self { secret_digest }
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.secret_digest.is_some()
    }

    #[must_use]
    pub fn verify(&self, token: &str) -> bool {
        let Some(expected) = &self.secret_digest else {
            tracing::debug!("Admin access attempted while no admin secret is configured");
            return false;
        };

        let presented = digest(token);
        expected.iter().zip(presented.iter()).fold(0u8, |acc, (a, b)| acc | (a ^ b)) == 0
    }
}

impl fmt::Debug for AdminAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminAuthenticator").field("enabled", &self.is_enabled()).finish()
    }
}

fn digest(value: &str) -> [u8; 32] {
    Sha256::digest(value.as_bytes()).into()
}
