/// Confirmation token model
///
/// Tokens back both account confirmation and password reset. Each token is a
/// 6-digit code emailed to the user; only its SHA-256 digest is stored. A
/// token is single-use and stops resolving [`TOKEN_TTL_MINUTES`] minutes after
/// creation, after which the purge sweep removes it.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tokens (
///     id UUID PRIMARY KEY,
///     token_hash CHAR(64) NOT NULL,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::auth::token::{generate_code, hash_code};

/// Minutes a token stays redeemable
pub const TOKEN_TTL_MINUTES: i64 = 10;

/// Stored token record
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Token {
    /// Unique token ID
    pub id: Uuid,

    /// SHA-256 hex digest of the emailed code
    pub token_hash: String,

    /// User the token was issued to
    pub user_id: Uuid,

    /// When the token was issued
    pub created_at: DateTime<Utc>,
}

impl Token {
    /// Issues a new token for `user_id`
    ///
    /// Returns the record to persist and the plaintext code to email. The
    /// plaintext code is not retained anywhere else.
    pub fn issue(user_id: Uuid) -> (Self, String) {
        let code = generate_code();
        (Self::for_code(user_id, &code), code)
    }

    /// Builds the record for an already drawn `code`
    pub fn for_code(user_id: Uuid, code: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            token_hash: hash_code(code),
            user_id,
            created_at: Utc::now(),
        }
    }

    /// Time to live
    pub fn ttl() -> Duration {
        Duration::minutes(TOKEN_TTL_MINUTES)
    }

    /// Oldest creation time that is still redeemable at `now`
    pub fn cutoff(now: DateTime<Utc>) -> DateTime<Utc> {
        now - Self::ttl()
    }

    /// Whether the token has expired at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.created_at <= Self::cutoff(now)
    }
}
