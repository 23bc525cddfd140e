use rand::RngCore;
use roster_types::models::SALT_LEN;

/// Generate a random salt for a new password hash.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt);
    salt
}
