/// Authentication utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`token`]: Confirmation code generation, digests and expiry sweep
///
/// # Example
///
/// ```
/// use uptask_shared::auth::password::{hash_password, verify_password};
/// use uptask_shared::auth::token::{generate_code, hash_code};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("12345")?;
/// assert!(verify_password("12345", &hash)?);
///
/// let code = generate_code();
/// assert_eq!(hash_code(&code).len(), 64);
/// # Ok(())
/// # }
/// ```

pub mod password;
pub mod token;
