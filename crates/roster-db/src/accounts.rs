use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, params};
use roster_crypto::{hash_credentials, verify_credentials};
use roster_types::models::{Account, AccountId, AccountRecord, AccountUpdate, SaltedPasswordHash};
use tracing::{debug, info};

use crate::error::is_constraint_violation;
use crate::executor::QueryExecutor;
use crate::models::{AccountRow, account_columns};
use crate::{Result, StoreError};

const SELECT_BY_ID: &str = concat!("SELECT ", account_columns!(), " FROM accounts WHERE id = ?1");
const SELECT_BY_NAME: &str =
    concat!("SELECT ", account_columns!(), " FROM accounts WHERE name = ?1");

const UPDATE_PASSWORD_AND_DATA: &str =
    "UPDATE accounts SET password = ?1, salt = ?2, data = ?3 WHERE id = ?4";
const UPDATE_PASSWORD: &str = "UPDATE accounts SET password = ?1, salt = ?2 WHERE id = ?3";
const UPDATE_DATA: &str = "UPDATE accounts SET data = ?1 WHERE id = ?2";

/// Account persistence: creation, lookup and in-place update.
#[derive(Clone)]
pub struct AccountStore {
    exec: QueryExecutor,
}

impl AccountStore {
    pub fn new(exec: QueryExecutor) -> Self {
        Self { exec }
    }

    /// Insert a new account. The id comes from the insert itself.
    pub async fn add_account(
        &self,
        name: &str,
        password_hash: SaltedPasswordHash,
        data: Option<Vec<u8>>,
    ) -> Result<AccountRecord> {
        let name = name.to_string();
        // An empty payload is stored as NULL so it reads back as absent.
        let data = data.filter(|d| !d.is_empty());

        let record = self
            .exec
            .write(move |conn| {
                conn.execute(
                    "INSERT INTO accounts (name, password, salt, data) VALUES (?1, ?2, ?3, ?4)",
                    params![
                        name,
                        &password_hash.hash[..],
                        &password_hash.salt[..],
                        data.as_deref()
                    ],
                )
                .map_err(|e| {
                    if is_constraint_violation(&e) {
                        StoreError::AccountExists(name.clone())
                    } else {
                        e.into()
                    }
                })?;

                Ok(AccountRecord {
                    id: AccountId::new(conn.last_insert_rowid()),
                    name,
                    password_hash,
                    data,
                })
            })
            .await?;

        info!(id = %record.id, name = %record.name, "Account created");
        Ok(record)
    }

    /// Look up an account by id. With `escalate`, absence is an error.
    pub async fn get_account_by_id(&self, id: AccountId, escalate: bool) -> Result<Option<Account>> {
        let record = self.get_account_record_by_id(id).await?;
        escalate_missing(record.map(Account::from), escalate, || {
            StoreError::not_found_id(id)
        })
    }

    /// Look up an account by name. With `escalate`, absence is an error.
    pub async fn get_account_by_name(&self, name: &str, escalate: bool) -> Result<Option<Account>> {
        let record = self.get_account_record_by_name(name).await?;
        escalate_missing(record.map(Account::from), escalate, || {
            StoreError::not_found_name(name)
        })
    }

    pub async fn get_account_record_by_id(&self, id: AccountId) -> Result<Option<AccountRecord>> {
        debug!(%id, "Fetching account record");
        self.fetch_record(SELECT_BY_ID, Value::Integer(id.get())).await
    }

    pub async fn get_account_record_by_name(&self, name: &str) -> Result<Option<AccountRecord>> {
        debug!(name, "Fetching account record");
        self.fetch_record(SELECT_BY_NAME, Value::Text(name.to_string()))
            .await
    }

    async fn fetch_record(&self, sql: &'static str, key: Value) -> Result<Option<AccountRecord>> {
        let rows = self
            .exec
            .execute_query(sql, vec![key], AccountRow::from_row)
            .await?;

        rows.into_iter().next().map(AccountRow::into_record).transpose()
    }

    /// Ids are assigned by the database on insert; this only hands out
    /// `AccountId::PLACEHOLDER` for callers that want one up front.
    pub async fn allocate_account_id(&self) -> Result<AccountId> {
        Ok(AccountId::PLACEHOLDER)
    }

    /// Apply the changed fields of `update` and return the updated account.
    ///
    /// A new password is hashed together with the account name under a fresh
    /// salt before anything is written. Only the changed columns are
    /// updated, so concurrent updates of different fields both survive.
    pub async fn update_account(&self, id: AccountId, update: AccountUpdate) -> Result<Account> {
        let mut record = self
            .get_account_record_by_id(id)
            .await?
            .ok_or_else(|| StoreError::not_found_id(id))?;

        if let Some(password) = update.new_password() {
            record.password_hash = hash_credentials(password, &record.name)
                .map_err(|e| StoreError::Hashing(e.to_string()))?;
        }
        if let Some(data) = update.new_data() {
            record.data = data.filter(|d| !d.is_empty()).map(<[u8]>::to_vec);
        }

        let hash = Value::Blob(record.password_hash.hash.to_vec());
        let salt = Value::Blob(record.password_hash.salt.to_vec());
        let data = record.data.clone().map_or(Value::Null, Value::Blob);
        let key = Value::Integer(id.get());

        let (sql, params) = match (update.is_password_changed(), update.is_data_changed()) {
            (true, true) => (UPDATE_PASSWORD_AND_DATA, vec![hash, salt, data, key]),
            (true, false) => (UPDATE_PASSWORD, vec![hash, salt, key]),
            (false, true) => (UPDATE_DATA, vec![data, key]),
            (false, false) => return Ok(Account::from(record)),
        };

        if self.exec.execute_command(sql, params).await? == 0 {
            return Err(StoreError::not_found_id(id));
        }

        debug!(%id, "Account updated");
        Ok(Account::from(record))
    }

    /// Verify a name/password pair. `None` for unknown names and wrong passwords.
    pub async fn authenticate(&self, name: &str, password: &str) -> Result<Option<Account>> {
        let Some(record) = self.get_account_record_by_name(name).await? else {
            return Ok(None);
        };

        let valid = verify_credentials(password, &record.name, &record.password_hash)
            .map_err(|e| StoreError::Hashing(e.to_string()))?;

        Ok(valid.then(|| Account::from(record)))
    }
}

pub(crate) fn query_account(
    conn: &Connection,
    sql: &str,
    key: Value,
) -> Result<Option<AccountRecord>> {
    let row = conn
        .prepare_cached(sql)?
        .query_row([key], AccountRow::from_row)
        .optional()?;

    row.map(AccountRow::into_record).transpose()
}

fn escalate_missing<F>(account: Option<Account>, escalate: bool, err: F) -> Result<Option<Account>>
where
    F: FnOnce() -> StoreError,
{
    match account {
        None if escalate => Err(err()),
        other => Ok(other),
    }
}
