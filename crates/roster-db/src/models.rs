//! Database row types. These map directly to SQLite rows and are kept apart
//! from the roster-types records so the DB layer owns its decoding rules.

use rusqlite::Row;
use roster_types::models::{AccountId, AccountRecord, HASH_LEN, SALT_LEN, SaltedPasswordHash};

use crate::{Result, StoreError};

/// Column list every account query selects, in `AccountRow::from_row` order.
/// Kept as a macro so it can be spliced into `concat!` SQL literals.
macro_rules! account_columns {
    () => {
        "accounts.id, accounts.name, accounts.password, accounts.salt, accounts.data"
    };
}
pub(crate) use account_columns;

pub struct AccountRow {
    pub id: i64,
    pub name: String,
    pub password: Vec<u8>,
    pub salt: Vec<u8>,
    pub data: Option<Vec<u8>>,
}

impl AccountRow {
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            password: row.get(2)?,
            salt: row.get(3)?,
            data: row.get(4)?,
        })
    }

    /// Validate credential lengths and normalise empty data to `None`.
    pub fn into_record(self) -> Result<AccountRecord> {
        let hash: [u8; HASH_LEN] = self.password.try_into().map_err(|v: Vec<u8>| {
            StoreError::CorruptRecord(format!(
                "account {} password hash is {} bytes, expected {}",
                self.id,
                v.len(),
                HASH_LEN
            ))
        })?;
        let salt: [u8; SALT_LEN] = self.salt.try_into().map_err(|v: Vec<u8>| {
            StoreError::CorruptRecord(format!(
                "account {} salt is {} bytes, expected {}",
                self.id,
                v.len(),
                SALT_LEN
            ))
        })?;

        Ok(AccountRecord {
            id: AccountId::new(self.id),
            name: self.name,
            password_hash: SaltedPasswordHash { hash, salt },
            data: self.data.filter(|d| !d.is_empty()),
        })
    }
}
