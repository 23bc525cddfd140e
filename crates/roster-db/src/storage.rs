use std::path::Path;
use std::sync::Arc;

use crate::accounts::AccountStore;
use crate::executor::QueryExecutor;
use crate::friends::FriendStore;
use crate::{Database, Result};

/// Entry point to the store: one database, one executor, both stores.
#[derive(Clone)]
pub struct Storage {
    db: Arc<Database>,
    accounts: AccountStore,
    friends: FriendStore,
}

impl Storage {
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::from_database(Database::open(path)?))
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::from_database(Database::open_in_memory()?))
    }

    pub fn from_database(db: Database) -> Self {
        let db = Arc::new(db);
        let exec = QueryExecutor::new(db.clone());
        Self {
            accounts: AccountStore::new(exec.clone()),
            friends: FriendStore::new(exec),
            db,
        }
    }

    /// True while the underlying writer connection is usable.
    pub fn is_ready_to_use(&self) -> bool {
        self.db
            .with_conn_mut(|conn| Ok(conn.is_autocommit()))
            .unwrap_or(false)
    }

    pub fn accounts(&self) -> &AccountStore {
        &self.accounts
    }

    pub fn friends(&self) -> &FriendStore {
        &self.friends
    }
}
