use std::path::Path;

use rusqlite::{Connection, OptionalExtension, Row, Transaction, TransactionBehavior, params};
use serde::{Deserialize, Serialize};

use sympto_core::{CoreError, CycleAnalysis, RawObservation, RawTemperature, analyze, parse_date};

use crate::error::{Result, StoreError};
use crate::schema;

const RECORD_COLUMNS: &str = "record_date, temperature, mucus_type, menstruation_type, \
     cervical_position, note, abdominal_pain, breast_tenderness, intercourse";

/// Profile row for one user.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct User {
    pub user_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl User {
    pub fn new(user_id: i64) -> Self {
        Self {
            user_id,
            ..Default::default()
        }
    }
}

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    // --- Metadata ---

    pub fn get_metadata(&self, key: &str) -> Result<Option<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT value FROM metadata WHERE key = ?1")?;
        let result = stmt.query_row([key], |row| row.get(0)).optional()?;
        Ok(result)
    }

    pub fn set_metadata(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    // --- Users ---

    /// Create the user or refresh its profile fields.
    pub fn upsert_user(&self, user: &User) -> Result<()> {
        self.conn.execute(
            "INSERT INTO users (user_id, username, first_name, last_name)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (user_id) DO UPDATE SET
                 username = excluded.username,
                 first_name = excluded.first_name,
                 last_name = excluded.last_name,
                 updated_at = datetime('now')",
            params![user.user_id, user.username, user.first_name, user.last_name],
        )?;
        Ok(())
    }

    pub fn get_user(&self, user_id: i64) -> Result<Option<User>> {
        let user = self
            .conn
            .query_row(
                "SELECT user_id, username, first_name, last_name FROM users WHERE user_id = ?1",
                [user_id],
                |row| {
                    Ok(User {
                        user_id: row.get(0)?,
                        username: row.get(1)?,
                        first_name: row.get(2)?,
                        last_name: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(user)
    }

    fn ensure_user_on(conn: &Connection, user_id: i64) -> Result<()> {
        conn.execute(
            "INSERT OR IGNORE INTO users (user_id) VALUES (?1)",
            [user_id],
        )?;
        Ok(())
    }

    // --- Records ---

    /// Insert or overwrite the record for `(user_id, obs.date)`.
    ///
    /// The date must be `YYYY-MM-DD` and the temperature numeric; a missing
    /// user row is created on the fly.
    pub fn upsert_record(&self, user_id: i64, obs: &RawObservation) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        Self::upsert_record_on(&tx, user_id, obs)?;
        tx.commit()?;
        tracing::debug!(user_id, date = %obs.date, "record saved");
        Ok(())
    }

    fn upsert_record_on(conn: &Connection, user_id: i64, obs: &RawObservation) -> Result<()> {
        let (date, temperature) = validate(obs)?;
        Self::ensure_user_on(conn, user_id)?;
        conn.execute(
            "INSERT INTO records (user_id, record_date, temperature, mucus_type,
                 menstruation_type, cervical_position, note,
                 abdominal_pain, breast_tenderness, intercourse)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT (user_id, record_date) DO UPDATE SET
                 temperature = excluded.temperature,
                 mucus_type = excluded.mucus_type,
                 menstruation_type = excluded.menstruation_type,
                 cervical_position = excluded.cervical_position,
                 note = excluded.note,
                 abdominal_pain = excluded.abdominal_pain,
                 breast_tenderness = excluded.breast_tenderness,
                 intercourse = excluded.intercourse,
                 updated_at = datetime('now')",
            params![
                user_id,
                date,
                temperature,
                obs.mucus_type,
                obs.menstruation_type,
                obs.cervical_position,
                obs.note,
                obs.abdominal_pain.unwrap_or(false),
                obs.breast_tenderness.unwrap_or(false),
                obs.intercourse.unwrap_or(false),
            ],
        )?;
        Ok(())
    }

    /// Save many records in one transaction; nothing is written if any
    /// record is malformed.
    pub fn upsert_records(&self, user_id: i64, records: &[RawObservation]) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        for obs in records {
            Self::upsert_record_on(&tx, user_id, obs)?;
        }
        tx.commit()?;
        Ok(records.len())
    }

    /// Merge the fields set in `patch` into the stored record for its date
    /// and save the result. Fields left `None` keep their stored value.
    ///
    /// Read and write share one immediate transaction, so another process
    /// writing the same day cannot slip in between them.
    pub fn apply_patch(&self, user_id: i64, patch: &RawObservation) -> Result<RawObservation> {
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)?;
        let merged = match Self::get_record_on(&tx, user_id, &patch.date)? {
            Some(existing) => merge(existing, patch),
            None => patch.clone(),
        };
        Self::upsert_record_on(&tx, user_id, &merged)?;
        tx.commit()?;
        tracing::debug!(user_id, date = %merged.date, "record patched");
        Ok(merged)
    }

    pub fn get_record(&self, user_id: i64, date: &str) -> Result<Option<RawObservation>> {
        Self::get_record_on(&self.conn, user_id, date)
    }

    fn get_record_on(conn: &Connection, user_id: i64, date: &str) -> Result<Option<RawObservation>> {
        let date = canonical_date(date)?;
        let record = conn
            .query_row(
                &format!(
                    "SELECT {RECORD_COLUMNS} FROM records WHERE user_id = ?1 AND record_date = ?2"
                ),
                params![user_id, date],
                row_to_observation,
            )
            .optional()?;
        Ok(record)
    }

    /// The `limit` most recent records, newest first.
    pub fn recent_records(&self, user_id: i64, limit: usize) -> Result<Vec<RawObservation>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {RECORD_COLUMNS} FROM records WHERE user_id = ?1
             ORDER BY record_date DESC LIMIT ?2"
        ))?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt
            .query_map(params![user_id, limit], row_to_observation)?
            .collect::<std::result::Result<_, _>>()?;
        Ok(rows)
    }

    /// Every record of the user, oldest first.
    pub fn all_records(&self, user_id: i64) -> Result<Vec<RawObservation>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {RECORD_COLUMNS} FROM records WHERE user_id = ?1 ORDER BY record_date"
        ))?;
        let rows = stmt
            .query_map([user_id], row_to_observation)?
            .collect::<std::result::Result<_, _>>()?;
        Ok(rows)
    }

    /// Returns whether a record existed for that date.
    pub fn delete_record(&self, user_id: i64, date: &str) -> Result<bool> {
        let date = canonical_date(date)?;
        let removed = self.conn.execute(
            "DELETE FROM records WHERE user_id = ?1 AND record_date = ?2",
            params![user_id, date],
        )?;
        if removed > 0 {
            tracing::debug!(user_id, %date, "record deleted");
        }
        Ok(removed > 0)
    }

    pub fn record_count(&self, user_id: i64) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM records WHERE user_id = ?1",
            [user_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    // --- Analysis ---

    /// Classify the `window` most recent observed days of a user. Only
    /// those rows are read; the engine restores date order.
    pub fn analyze_user(&self, user_id: i64, window: usize) -> Result<CycleAnalysis> {
        let records = self.recent_records(user_id, window)?;
        let analysis = analyze(&records, Some(window))?;
        tracing::debug!(user_id, window, status = ?analysis.status, "user analyzed");
        Ok(analysis)
    }
}

fn canonical_date(date: &str) -> Result<String> {
    parse_date(date)
        .map(|d| d.to_string())
        .ok_or_else(|| StoreError::InvalidData(format!("invalid date '{date}' (expected YYYY-MM-DD)")))
}

/// Canonical date and coerced temperature, or the reason the record is
/// rejected.
fn validate(obs: &RawObservation) -> Result<(String, Option<f64>)> {
    let date = parse_date(&obs.date).ok_or_else(|| CoreError::InvalidDate {
        index: 0,
        value: obs.date.clone(),
    })?;
    let temperature = match &obs.temperature {
        Some(raw) => raw.coerce().map_err(|_| CoreError::InvalidTemperature {
            index: 0,
            value: raw.to_string(),
        })?,
        None => None,
    };
    Ok((date.to_string(), temperature))
}

fn merge(mut base: RawObservation, patch: &RawObservation) -> RawObservation {
    if patch.temperature.is_some() {
        base.temperature = patch.temperature.clone();
    }
    if patch.mucus_type.is_some() {
        base.mucus_type = patch.mucus_type.clone();
    }
    if patch.menstruation_type.is_some() {
        base.menstruation_type = patch.menstruation_type.clone();
    }
    if patch.cervical_position.is_some() {
        base.cervical_position = patch.cervical_position;
    }
    if patch.note.is_some() {
        base.note = patch.note.clone();
    }
    if patch.abdominal_pain.is_some() {
        base.abdominal_pain = patch.abdominal_pain;
    }
    if patch.breast_tenderness.is_some() {
        base.breast_tenderness = patch.breast_tenderness;
    }
    if patch.intercourse.is_some() {
        base.intercourse = patch.intercourse;
    }
    base
}

fn row_to_observation(row: &Row<'_>) -> rusqlite::Result<RawObservation> {
    // Unset flags are stored as 0 and read back as "not recorded"
    let flag = |idx: usize| -> rusqlite::Result<Option<bool>> {
        Ok(row.get::<_, bool>(idx)?.then_some(true))
    };
    Ok(RawObservation {
        date: row.get(0)?,
        temperature: row.get::<_, Option<f64>>(1)?.map(RawTemperature::Number),
        mucus_type: row.get(2)?,
        menstruation_type: row.get(3)?,
        cervical_position: row.get(4)?,
        note: row.get(5)?,
        abdominal_pain: flag(6)?,
        breast_tenderness: flag(7)?,
        intercourse: flag(8)?,
    })
}
