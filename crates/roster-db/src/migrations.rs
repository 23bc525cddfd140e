use rusqlite::Connection;
use tracing::info;

use crate::Result;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (accounts, friends, invitations)");
        conn.execute_batch(
            "
            BEGIN;

            CREATE TABLE accounts (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                name        TEXT NOT NULL UNIQUE,
                password    BLOB NOT NULL,
                salt        BLOB NOT NULL,
                data        BLOB,
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE friends (
                owner   INTEGER NOT NULL REFERENCES accounts(id),
                friend  INTEGER NOT NULL REFERENCES accounts(id),
                PRIMARY KEY (owner, friend)
            );

            CREATE TABLE invitations (
                sender    INTEGER NOT NULL REFERENCES accounts(id),
                receiver  INTEGER NOT NULL REFERENCES accounts(id),
                PRIMARY KEY (sender, receiver)
            );

            CREATE INDEX idx_invitations_receiver
                ON invitations(receiver);

            INSERT INTO schema_version (version) VALUES (1);

            COMMIT;
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn).unwrap();
        run(&conn).unwrap();

        let versions: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |r| r.get(0))
            .unwrap();
        assert_eq!(versions, 1);
    }
}
