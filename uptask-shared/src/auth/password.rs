/// Account password storage
///
/// Passwords are stored as Argon2id PHC strings (`$argon2id$v=19$m=...`),
/// so the salt and cost parameters travel with each hash and verification
/// needs nothing but the stored string.
///
/// Cost: 19 MiB memory, 2 passes, 1 lane.
///
/// ```
/// use uptask_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), uptask_shared::auth::password::PasswordError> {
/// let stored = hash_password("12345")?;
/// assert!(verify_password("12345", &stored)?);
/// assert!(!verify_password("54321", &stored)?);
/// # Ok(())
/// # }
/// ```

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error("stored password hash is malformed: {0}")]
    MalformedHash(String),

    #[error("password verification failed: {0}")]
    Verify(String),

    /// The blocking task running the hasher was cancelled or panicked
    #[error("password task aborted: {0}")]
    Aborted(String),
}

const MEMORY_KIB: u32 = 19 * 1024;
const PASSES: u32 = 2;
const LANES: u32 = 1;

fn hasher() -> Result<Argon2<'static>, PasswordError> {
    let params = Params::new(MEMORY_KIB, PASSES, LANES, None)
        .map_err(|e| PasswordError::Hash(e.to_string()))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hashes `password` with a fresh random salt
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    hasher()?
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::Hash(e.to_string()))
}

/// Checks `password` against a stored PHC string
///
/// A wrong password is `Ok(false)`; errors mean the stored hash is unusable.
pub fn verify_password(password: &str, stored: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(stored).map_err(|e| PasswordError::MalformedHash(e.to_string()))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::Verify(e.to_string())),
    }
}

/// [`hash_password`] on the blocking pool
pub async fn hash_password_async(password: String) -> Result<String, PasswordError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| PasswordError::Aborted(e.to_string()))?
}

/// [`verify_password`] on the blocking pool
pub async fn verify_password_async(password: String, stored: String) -> Result<bool, PasswordError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &stored))
        .await
        .map_err(|e| PasswordError::Aborted(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_embeds_parameters() {
        let stored = hash_password("12345").unwrap();
        assert!(stored.starts_with("$argon2id$v=19$"));
        assert!(stored.contains("m=19456,t=2,p=1"));
    }

    #[test]
    fn test_salts_differ() {
        assert_ne!(hash_password("12345").unwrap(), hash_password("12345").unwrap());
    }

    #[test]
    fn test_verify() {
        let stored = hash_password("contraseña").unwrap();
        assert!(verify_password("contraseña", &stored).unwrap());
        assert!(!verify_password("contrasena", &stored).unwrap());
        assert!(!verify_password("", &stored).unwrap());
    }

    #[test]
    fn test_malformed_hash() {
        assert!(matches!(
            verify_password("12345", "plaintext"),
            Err(PasswordError::MalformedHash(_))
        ));
    }

    #[tokio::test]
    async fn test_blocking_pool_wrappers() {
        let stored = hash_password_async("12345".to_string()).await.unwrap();
        assert!(verify_password_async("12345".to_string(), stored.clone()).await.unwrap());
        assert!(!verify_password_async("nope".to_string(), stored).await.unwrap());
    }
}
