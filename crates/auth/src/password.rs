//! Password hashing (bcrypt).

use thiserror::Error;

pub const MIN_PASSWORD_LEN: usize = 8;

/// bcrypt work factor for production hashes.
pub const DEFAULT_COST: u32 = bcrypt::DEFAULT_COST;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password must be at least {MIN_PASSWORD_LEN} characters")]
    TooShort,

    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}

/// Hash a plaintext password with the given bcrypt cost.
///
/// Production callers use `DEFAULT_COST`; tests pass a low cost.
pub fn hash_password(plain: &str, cost: u32) -> Result<String, PasswordError> {
    if plain.chars().count() < MIN_PASSWORD_LEN {
        return Err(PasswordError::TooShort);
    }
    Ok(bcrypt::hash(plain, cost)?)
}

/// Verify a plaintext password against a stored hash.
///
/// A malformed stored hash counts as a mismatch.
pub fn verify_password(plain: &str, hash: &str) -> bool {
    bcrypt::verify(plain, hash).unwrap_or(false)
}
