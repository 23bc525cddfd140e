//! Roster credential hashing
//!
//! Passwords are never stored. A plaintext is first reduced to a SHA-256
//! password hash, which is then stretched with Argon2id under a random
//! per-account salt. Only the stretched hash and the salt reach the database.

pub mod password;
pub mod salt;

pub use password::{
    generate_password_hash, generate_salted_password_hash, hash_credentials,
    salt_password_hash, verify_credentials,
};
