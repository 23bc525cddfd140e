use roster_types::models::AccountId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Account with id {} and name {} does not exist.", display_opt(.id), display_opt(.name))]
    AccountNotFound {
        id: Option<AccountId>,
        name: Option<String>,
    },

    #[error("Account name already taken: {0}")]
    AccountExists(String),

    /// A friend or invitation referenced an account that does not exist.
    #[error("Unknown account referenced: {0}")]
    UnknownAccount(String),

    #[error("Corrupt account record: {0}")]
    CorruptRecord(String),

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    /// The blocking worker running the statement panicked or was cancelled.
    #[error("Database worker failed: {0}")]
    Worker(String),

    #[error("DB lock poisoned: {0}")]
    LockPoisoned(String),
}

impl StoreError {
    pub fn not_found_id(id: AccountId) -> Self {
        Self::AccountNotFound {
            id: Some(id),
            name: None,
        }
    }

    pub fn not_found_name(name: &str) -> Self {
        Self::AccountNotFound {
            id: None,
            name: Some(name.to_string()),
        }
    }
}

fn display_opt<T: std::fmt::Display>(value: &Option<T>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "None".to_string(),
    }
}

/// True when SQLite rejected a write on a UNIQUE, PRIMARY KEY or FOREIGN KEY
/// constraint.
pub(crate) fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}
