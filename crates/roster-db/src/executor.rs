use std::sync::Arc;

use rusqlite::types::Value;
use rusqlite::{Connection, Row, params_from_iter};
use tracing::error;

use crate::{Database, Result, StoreError};

/// Runs statements on tokio's blocking pool so async callers never wait on
/// SQLite I/O inside the runtime.
///
/// Dropping a returned future does not cancel the statement: once handed to
/// a worker it runs to completion, the result is just discarded.
#[derive(Clone)]
pub struct QueryExecutor {
    db: Arc<Database>,
}

impl QueryExecutor {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Run an INSERT, UPDATE or DELETE and return the affected row count.
    pub async fn execute_command(&self, sql: &'static str, params: Vec<Value>) -> Result<usize> {
        self.write(move |conn| Ok(conn.execute(sql, params_from_iter(params.iter()))?))
            .await
    }

    /// Run a SELECT, mapping each row on the worker.
    pub async fn execute_query<T, F>(
        &self,
        sql: &'static str,
        params: Vec<Value>,
        mut map_row: F,
    ) -> Result<Vec<T>>
    where
        T: Send + 'static,
        F: FnMut(&Row<'_>) -> rusqlite::Result<T> + Send + 'static,
    {
        self.read(move |conn| {
            let mut stmt = conn.prepare_cached(sql)?;
            let rows = stmt
                .query_map(params_from_iter(params.iter()), |row| map_row(row))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await
    }

    /// Run a closure against a reader connection.
    pub async fn read<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || db.with_conn(f))
            .await
            .map_err(join_error)?
    }

    /// Run a closure against the writer connection.
    pub async fn write<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || db.with_conn_mut(f))
            .await
            .map_err(join_error)?
    }
}

fn join_error(e: tokio::task::JoinError) -> StoreError {
    error!("spawn_blocking join error: {}", e);
    StoreError::Worker(e.to_string())
}
