/// Confirmation codes
///
/// Codes are 6-digit, zero-padded numbers emailed to the user. The database
/// only ever sees the SHA-256 digest of a code, so lookups hash the submitted
/// code and compare digests.
///
/// Expired tokens stop resolving immediately (repositories filter on
/// creation time); [`run_purge_loop`] removes them from storage.

use rand::Rng;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use uuid::Uuid;

use crate::models::token::Token;
use crate::repo::{RepoError, RepoResult, TokenRepository};

/// Number of digits in a confirmation code
pub const CODE_LENGTH: usize = 6;

/// Generates a random 6-digit confirmation code
///
/// # Example
///
/// ```
/// use uptask_shared::auth::token::generate_code;
///
/// let code = generate_code();
/// assert_eq!(code.len(), 6);
/// assert!(code.chars().all(|c| c.is_ascii_digit()));
/// ```
pub fn generate_code() -> String {
    let n: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{:0width$}", n, width = CODE_LENGTH)
}

/// Hex-encoded SHA-256 digest of a code
pub fn hash_code(code: &str) -> String {
    hex::encode(Sha256::digest(code.trim().as_bytes()))
}

/// Draws before giving up on finding a code no live token uses
pub const MAX_CODE_DRAWS: usize = 8;

/// Issues and stores a token whose code no other live token shares
///
/// Lookups go by code alone, so two live tokens with the same code would let
/// one user redeem the other's. Colliding draws are discarded.
pub async fn issue_unique(
    tokens: &dyn TokenRepository,
    user_id: Uuid,
) -> RepoResult<(Token, String)> {
    issue_unique_with(tokens, user_id, generate_code).await
}

async fn issue_unique_with<F>(
    tokens: &dyn TokenRepository,
    user_id: Uuid,
    mut draw: F,
) -> RepoResult<(Token, String)>
where
    F: FnMut() -> String + Send,
{
    for _ in 0..MAX_CODE_DRAWS {
        let code = draw();
        if tokens.find_by_code(&code).await?.is_some() {
            tracing::debug!(%user_id, "Drawn code is already live, redrawing");
            continue;
        }

        let token = Token::for_code(user_id, &code);
        match tokens.save(&token).await {
            Ok(()) => return Ok((token, code)),
            Err(RepoError::Duplicate(_)) => continue,
            Err(e) => return Err(e),
        }
    }

    Err(RepoError::CodesExhausted(MAX_CODE_DRAWS))
}

/// Periodically deletes expired tokens until `shutdown` is cancelled
pub async fn run_purge_loop(
    tokens: Arc<dyn TokenRepository>,
    every: Duration,
    shutdown: CancellationToken,
) {
    tracing::info!(interval_secs = every.as_secs(), "Token purge loop starting");

    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {
                match tokens.purge_expired(chrono::Utc::now()).await {
                    Ok(0) => {}
                    Ok(count) => tracing::debug!(count, "Purged expired tokens"),
                    Err(e) => tracing::warn!(error = %e, "Failed to purge expired tokens"),
                }
            }
        }
    }

    tracing::info!("Token purge loop stopped");
}
