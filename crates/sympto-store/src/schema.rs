use rusqlite::Connection;

use crate::error::Result;

pub const SCHEMA_VERSION: i64 = 2;

/// Symptom flag columns added after the first schema version.
const SYMPTOM_COLUMNS: [&str; 3] = ["abdominal_pain", "breast_tenderness", "intercourse"];

pub fn initialize(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA journal_mode = WAL;")?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.pragma_update(None, "busy_timeout", 5000)?;
    conn.pragma_update(None, "wal_autocheckpoint", 100)?;

    // In-memory and fresh databases legitimately fail this
    if conn
        .execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")
        .is_ok()
    {
        tracing::info!("startup WAL checkpoint complete");
    }

    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS metadata (
            key   TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS users (
            user_id    INTEGER PRIMARY KEY,
            username   TEXT,
            first_name TEXT,
            last_name  TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS records (
            id                INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id           INTEGER NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
            record_date       TEXT NOT NULL,
            temperature       REAL,
            mucus_type        TEXT,
            menstruation_type TEXT,
            cervical_position INTEGER,
            note              TEXT,
            abdominal_pain    INTEGER NOT NULL DEFAULT 0,
            breast_tenderness INTEGER NOT NULL DEFAULT 0,
            intercourse       INTEGER NOT NULL DEFAULT 0,
            created_at        TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at        TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(user_id, record_date)
        );

        CREATE INDEX IF NOT EXISTS idx_records_user ON records(user_id);
        CREATE INDEX IF NOT EXISTS idx_records_date ON records(record_date);
        ",
    )?;

    // v1 databases predate the symptom flags
    for column in SYMPTOM_COLUMNS {
        if conn
            .prepare(&format!("SELECT {column} FROM records LIMIT 0"))
            .is_err()
        {
            conn.execute_batch(&format!(
                "ALTER TABLE records ADD COLUMN {column} INTEGER NOT NULL DEFAULT 0;"
            ))?;
            tracing::info!(column, "added missing records column");
        }
    }

    conn.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES ('schema_version', ?1)",
        [SCHEMA_VERSION.to_string()],
    )?;

    Ok(())
}

pub fn get_schema_version(conn: &Connection) -> Result<Option<i64>> {
    let mut stmt = conn.prepare("SELECT value FROM metadata WHERE key = 'schema_version'")?;
    let version = stmt
        .query_row([], |row| {
            let v: String = row.get(0)?;
            Ok(v.parse::<i64>().unwrap_or(0))
        })
        .ok();
    Ok(version)
}
