use anyhow::{Result, anyhow};
use argon2::Argon2;
use roster_types::models::{HASH_LEN, SALT_LEN, SaltedPasswordHash};
use sha2::{Digest, Sha256};

use crate::salt::generate_salt;

/// Reduce a plaintext password to its unsalted SHA-256 hash.
pub fn generate_password_hash(plaintext: &str) -> [u8; HASH_LEN] {
    Sha256::digest(plaintext.as_bytes()).into()
}

/// Stretch a password hash with Argon2id under a fresh random salt.
pub fn generate_salted_password_hash(password_hash: &[u8; HASH_LEN]) -> Result<SaltedPasswordHash> {
    let salt = generate_salt();
    let hash = salt_password_hash(password_hash, &salt)?;
    Ok(SaltedPasswordHash { hash, salt })
}

/// Stretch a password hash with Argon2id under the given salt.
pub fn salt_password_hash(
    password_hash: &[u8; HASH_LEN],
    salt: &[u8; SALT_LEN],
) -> Result<[u8; HASH_LEN]> {
    let mut out = [0u8; HASH_LEN];
    Argon2::default()
        .hash_password_into(password_hash, salt, &mut out)
        .map_err(|e| anyhow!("Password hashing failed: {}", e))?;
    Ok(out)
}

/// Credentials bind the password to the account name, so the same password
/// on two accounts never yields the same pre-salt hash.
pub fn hash_credentials(password: &str, account_name: &str) -> Result<SaltedPasswordHash> {
    let password_hash = generate_password_hash(&format!("{}{}", password, account_name));
    generate_salted_password_hash(&password_hash)
}

/// Check a plaintext password against stored credentials.
pub fn verify_credentials(
    password: &str,
    account_name: &str,
    stored: &SaltedPasswordHash,
) -> Result<bool> {
    let password_hash = generate_password_hash(&format!("{}{}", password, account_name));
    let candidate = salt_password_hash(&password_hash, &stored.salt)?;

    // Compare every byte regardless of where the first mismatch is.
    let diff = candidate
        .iter()
        .zip(stored.hash.iter())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b));
    Ok(diff == 0)
}
