//! SQLite local store
//!
//! ## Tables
//!
//! - `medications` - one row per medication, tombstones included
//! - `schema_info` - schema version
//!
//! Timestamps are stored as RFC 3339 text with every sub-second digit, so
//! a value read back compares equal to the value written.

use std::path::Path;

use chrono::{NaiveTime, Weekday};
use rusqlite::{params, Connection, ErrorCode, Row, Transaction};
use tracing::debug;

use super::error::{StorageError, StorageResult};
use super::schema::{init_schema, needs_init};
use super::{Change, ChangeSet, LocalStore};
use crate::config::Config;
use crate::models::{Frequency, Medication, ReminderSettings, Status};
use crate::timestamp;

const REMINDER_TIME_FORMAT: &str = "%H:%M";

const SELECT_COLUMNS: &str = "SELECT id, owner, name, dosage, frequency, created_at, updated_at, \
     status, reminder_alert, reminder_first, reminder_second, reminder_weekday \
     FROM medications";

const INSERT_SQL: &str = "INSERT INTO medications (\
     id, owner, name, dosage, frequency, created_at, updated_at, \
     status, reminder_alert, reminder_first, reminder_second, reminder_weekday\
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)";

/// SQLite-backed `LocalStore`
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open or create the database configured by `config`
    pub fn open(config: &Config) -> StorageResult<Self> {
        Self::open_path(&config.sqlite_path())
    }

    /// Open or create the database at `path`
    pub fn open_path(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StorageError::from_io(e, parent.to_path_buf()))?;
        }

        let conn = Connection::open(path)?;
        if needs_init(&conn) {
            debug!(path = %path.display(), "Initializing medication schema");
            init_schema(&conn)?;
        }

        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Get a reference to the underlying connection
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl LocalStore for SqliteStore {
    fn find_by_id_and_owner(&self, id: &str, owner: &str) -> StorageResult<Option<Medication>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SELECT_COLUMNS} WHERE id = ? AND owner = ?"))?;
        let mut rows = stmt.query(params![id, owner])?;

        match rows.next()? {
            Some(row) => Ok(Some(MedicationRow::read(row)?.into_medication()?)),
            None => Ok(None),
        }
    }

    fn find_all_by_owner(&self, owner: &str) -> StorageResult<Vec<Medication>> {
        let mut stmt = self.conn.prepare(&format!(
            "{SELECT_COLUMNS} WHERE owner = ? ORDER BY created_at, id"
        ))?;

        let rows = stmt
            .query_map(params![owner], MedicationRow::read)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(MedicationRow::into_medication).collect()
    }

    fn insert(&mut self, medication: &Medication) -> StorageResult<()> {
        let result = execute_row(&self.conn, INSERT_SQL, medication);

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                Err(StorageError::DuplicateId {
                    id: medication.id.clone(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    fn commit(&mut self, changes: ChangeSet) -> StorageResult<()> {
        let tx = self.conn.transaction()?;

        for (id, change) in changes {
            match change {
                Change::Upsert(med) => upsert(&tx, &med)?,
                Change::Purge => {
                    tx.execute("DELETE FROM medications WHERE id = ?", params![id])?;
                }
            }
        }

        // Dropping an uncommitted transaction rolls it back
        tx.commit()?;
        Ok(())
    }
}

// ==================== Row mapping ====================

/// Raw column values, before validation
struct MedicationRow {
    id: String,
    owner: String,
    name: String,
    dosage: String,
    frequency: String,
    created_at: String,
    updated_at: String,
    status: i64,
    reminder_alert: bool,
    reminder_first: Option<String>,
    reminder_second: Option<String>,
    reminder_weekday: Option<String>,
}

impl MedicationRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            owner: row.get(1)?,
            name: row.get(2)?,
            dosage: row.get(3)?,
            frequency: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
            status: row.get(7)?,
            reminder_alert: row.get(8)?,
            reminder_first: row.get(9)?,
            reminder_second: row.get(10)?,
            reminder_weekday: row.get(11)?,
        })
    }

    fn into_medication(self) -> StorageResult<Medication> {
        let id = self.id;
        let invalid = |details: String| StorageError::invalid_row(&id, details);

        let frequency = self
            .frequency
            .parse::<Frequency>()
            .map_err(|e| invalid(e.to_string()))?;
        let created_at = timestamp::parse(&self.created_at)
            .map_err(|e| invalid(format!("created_at '{}': {}", self.created_at, e)))?;
        let updated_at = timestamp::parse(&self.updated_at)
            .map_err(|e| invalid(format!("updated_at '{}': {}", self.updated_at, e)))?;
        let status = Status::from_code(self.status)
            .ok_or_else(|| invalid(format!("unknown status code {}", self.status)))?;

        let parse_time = |raw: Option<String>| -> StorageResult<Option<NaiveTime>> {
            raw.map(|s| {
                NaiveTime::parse_from_str(&s, REMINDER_TIME_FORMAT)
                    .map_err(|e| invalid(format!("reminder time '{}': {}", s, e)))
            })
            .transpose()
        };
        let first = parse_time(self.reminder_first)?;
        let second = parse_time(self.reminder_second)?;
        let weekday = self
            .reminder_weekday
            .map(|s| {
                s.parse::<Weekday>()
                    .map_err(|_| invalid(format!("reminder weekday '{}'", s)))
            })
            .transpose()?;

        Ok(Medication {
            id,
            owner: self.owner,
            name: self.name,
            dosage: self.dosage,
            frequency,
            created_at,
            updated_at,
            status,
            reminder: ReminderSettings {
                alert: self.reminder_alert,
                first,
                second,
                weekday,
            },
        })
    }
}

/// Run `sql` with the twelve medication columns bound in table order
fn execute_row(conn: &Connection, sql: &str, med: &Medication) -> rusqlite::Result<usize> {
    let fmt_time = |t: Option<NaiveTime>| t.map(|t| t.format(REMINDER_TIME_FORMAT).to_string());
    conn.execute(
        sql,
        params![
            med.id,
            med.owner,
            med.name,
            med.dosage,
            med.frequency.as_str(),
            timestamp::format_storage(&med.created_at),
            timestamp::format_storage(&med.updated_at),
            med.status.code(),
            med.reminder.alert,
            fmt_time(med.reminder.first),
            fmt_time(med.reminder.second),
            med.reminder.weekday.map(|d| d.to_string()),
        ],
    )
}

// ==================== Transaction helpers ====================

/// Insert or replace one medication
fn upsert(tx: &Transaction, med: &Medication) -> StorageResult<()> {
    let sql = format!(
        r#"
        {INSERT_SQL}
        ON CONFLICT(id) DO UPDATE SET
            owner = excluded.owner,
            name = excluded.name,
            dosage = excluded.dosage,
            frequency = excluded.frequency,
            created_at = excluded.created_at,
            updated_at = excluded.updated_at,
            status = excluded.status,
            reminder_alert = excluded.reminder_alert,
            reminder_first = excluded.reminder_first,
            reminder_second = excluded.reminder_second,
            reminder_weekday = excluded.reminder_weekday
        "#
    );
    execute_row(tx, &sql, med)?;
    Ok(())
}
