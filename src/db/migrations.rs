use anyhow::{bail, Context, Result};
use log::info;
use rusqlite::Connection;

/// Schema steps in order; step `n` (1-based) moves the store to version `n`.
const MIGRATIONS: &[(&str, &str)] = &[
    ("readings", include_str!("schemas/schema_v1.sql")),
    ("profile", include_str!("schemas/schema_v2.sql")),
];

pub const CURRENT_SCHEMA_VERSION: i32 = MIGRATIONS.len() as i32;

/// Brings the store up to `CURRENT_SCHEMA_VERSION` in a single transaction.
pub fn run_migrations(conn: &mut Connection) -> Result<()> {
    let stored: i32 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .context("failed to read user_version pragma")?;

    if stored > CURRENT_SCHEMA_VERSION {
        bail!(
            "database version ({stored}) is newer than supported schema ({CURRENT_SCHEMA_VERSION})"
        );
    }
    let applied = usize::try_from(stored)
        .with_context(|| format!("database reports a negative schema version ({stored})"))?;

    let pending = &MIGRATIONS[applied..];
    if pending.is_empty() {
        return Ok(());
    }

    let tx = conn
        .transaction()
        .context("failed to open migration transaction")?;
    for (offset, (name, sql)) in pending.iter().enumerate() {
        let version = applied + offset + 1;
        tx.execute_batch(sql)
            .with_context(|| format!("migration {version} ({name}) failed"))?;
    }
    tx.pragma_update(None, "user_version", CURRENT_SCHEMA_VERSION)
        .context("failed to update user_version pragma")?;
    tx.commit().context("failed to commit migrations")?;

    info!(
        "Migrated store from schema {stored} to {CURRENT_SCHEMA_VERSION} ({} step(s))",
        pending.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_version(conn: &Connection) -> i32 {
        conn.pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap()
    }

    fn table_exists(conn: &Connection, name: &str) -> bool {
        conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [name],
            |row| row.get::<_, i64>(0),
        )
        .unwrap()
            == 1
    }

    #[test]
    fn migrates_in_memory_database() {
        let mut conn = Connection::open_in_memory().unwrap();
        run_migrations(&mut conn).unwrap();
        // Second run is a no-op.
        run_migrations(&mut conn).unwrap();

        assert_eq!(user_version(&conn), CURRENT_SCHEMA_VERSION);
        assert!(table_exists(&conn, "readings"));
        assert!(table_exists(&conn, "profile"));
    }

    #[test]
    fn applies_only_pending_steps() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(MIGRATIONS[0].1).unwrap();
        conn.pragma_update(None, "user_version", 1).unwrap();
        conn.execute(
            "INSERT INTO readings (id, value, recorded_at, source, created_at)
             VALUES ('r1', 98.0, '2024-05-01T08:00:00.000Z', 'mock', '2024-05-01T08:00:00.000Z')",
            [],
        )
        .unwrap();

        run_migrations(&mut conn).unwrap();

        assert_eq!(user_version(&conn), CURRENT_SCHEMA_VERSION);
        assert!(table_exists(&conn, "profile"));
        let kept: i64 = conn
            .query_row("SELECT COUNT(*) FROM readings", [], |row| row.get(0))
            .unwrap();
        assert_eq!(kept, 1);
    }

    #[test]
    fn rejects_newer_database() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "user_version", CURRENT_SCHEMA_VERSION + 1)
            .unwrap();
        let err = run_migrations(&mut conn).unwrap_err();
        assert!(err.to_string().contains("newer than supported"));
    }
}
