//! Storage layer for the ttk time tracker.
//!
//! Provides persistence for sheets and tracking entries using `rusqlite`.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! This means a `Database` instance can be moved between threads but cannot be shared
//! across threads without external synchronization.
//!
//! # Schema
//!
//! ## Timestamp Format
//!
//! Timestamps are stored as TEXT in RFC 3339 UTC with millisecond precision
//! (e.g., `2024-06-10T09:00:00.000Z`). This ensures:
//! - Lexicographic ordering matches chronological ordering
//! - Human-readable values in the database
//! - Timezone-aware (always UTC)
//!
//! Range queries format their bounds the same way, so the `start_time`
//! comparisons stay purely textual.
//!
//! ## State Invariants
//!
//! At most one sheet has `active = 1` and at most one entry has a NULL
//! `end_time`. Both invariants are enforced transactionally by the
//! guarded operations ([`Database::select_or_create_sheet`],
//! [`Database::start_entry`], [`Database::close_entry`]); imported
//! entries bypass the open-entry check because they arrive already
//! closed.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use thiserror::Error;
use ttk_core::{ClosedEntry, SheetName};

/// Storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A sheet with this name already exists.
    #[error("sheet already exists: {name}")]
    DuplicateSheet { name: String },
    /// No sheet has this name.
    #[error("no sheet found with name: {name}")]
    SheetNotFound { name: String },
    /// Tracking was requested without an active sheet.
    #[error("no active sheet selected, use the 'sheet' command to select or create one")]
    NoActiveSheet,
    /// An entry is still open.
    #[error("an entry is already being tracked, stop it before starting another")]
    AlreadyTracking,
    /// No entry is open.
    #[error("no entry is currently being tracked")]
    NoOpenEntry,
    /// A closed interval ends before it starts.
    #[error("entry interval ends before it starts: {started_at} > {ended_at}")]
    InvalidInterval {
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
    },
    /// Failed to parse a stored timestamp.
    #[error("invalid timestamp for entry {entry_id}: {timestamp}")]
    TimestampParse {
        entry_id: i64,
        timestamp: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

/// A sheet row as shown by listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetInfo {
    pub name: String,
    pub active: bool,
}

/// The currently active sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSheet {
    pub id: i64,
    pub name: String,
}

/// The entry currently being tracked, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenEntry {
    pub id: i64,
    pub sheet: String,
    pub started_at: DateTime<Utc>,
    pub note: String,
}

/// Whether [`Database::select_or_create_sheet`] created the sheet or
/// merely switched to an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetSelection {
    Created,
    Switched,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), StoreError> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS sheets (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                active INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );

            -- Entries table: one row per tracked interval
            -- start_time/end_time: RFC 3339 UTC (e.g. '2024-06-10T09:00:00.000Z')
            -- end_time: NULL while the entry is still open
            CREATE TABLE IF NOT EXISTS entries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                sheet_id INTEGER NOT NULL,
                start_time TEXT NOT NULL,
                end_time TEXT,
                note TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL,
                FOREIGN KEY (sheet_id) REFERENCES sheets(id)
            );

            CREATE INDEX IF NOT EXISTS idx_entries_sheet ON entries(sheet_id);
            CREATE INDEX IF NOT EXISTS idx_entries_start ON entries(start_time);
            ",
        )?;
        Ok(())
    }

    /// Returns whether a sheet with this name exists.
    pub fn sheet_exists(&self, name: &SheetName) -> Result<bool, StoreError> {
        let exists = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sheets WHERE name = ?)",
            [name.as_str()],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// Creates a new (inactive) sheet and returns its row ID.
    pub fn create_sheet(
        &mut self,
        name: &SheetName,
        created_at: DateTime<Utc>,
    ) -> Result<i64, StoreError> {
        let result = self.conn.execute(
            "INSERT INTO sheets (name, active, created_at) VALUES (?, 0, ?)",
            params![name.as_str(), format_timestamp(created_at)],
        );
        match result {
            Ok(_) => Ok(self.conn.last_insert_rowid()),
            Err(err) if is_unique_violation(&err) => Err(StoreError::DuplicateSheet {
                name: name.to_string(),
            }),
            Err(err) => Err(err.into()),
        }
    }

    /// Lists all sheets ordered by name.
    pub fn list_sheets(&self) -> Result<Vec<SheetInfo>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, active FROM sheets ORDER BY name ASC")?;
        let rows = stmt.query_map([], |row| {
            Ok(SheetInfo {
                name: row.get(0)?,
                active: row.get(1)?,
            })
        })?;
        let mut sheets = Vec::new();
        for row in rows {
            sheets.push(row?);
        }
        Ok(sheets)
    }

    /// Returns the active sheet, if one is selected.
    pub fn active_sheet(&self) -> Result<Option<ActiveSheet>, StoreError> {
        let sheet = self
            .conn
            .query_row("SELECT id, name FROM sheets WHERE active = 1", [], |row| {
                Ok(ActiveSheet {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })
            .optional()?;
        Ok(sheet)
    }

    /// Makes the named sheet the single active one.
    pub fn activate_sheet(&mut self, name: &SheetName) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        tx.execute("UPDATE sheets SET active = 0 WHERE active = 1", [])?;
        let updated = tx.execute(
            "UPDATE sheets SET active = 1 WHERE name = ?",
            [name.as_str()],
        )?;
        if updated == 0 {
            // Dropping the transaction rolls the deactivation back
            return Err(StoreError::SheetNotFound {
                name: name.to_string(),
            });
        }
        tx.commit()?;
        Ok(())
    }

    /// Activates the named sheet, creating it first when it does not
    /// exist yet. Deactivation, creation, and activation happen in one
    /// transaction so the single-active invariant holds throughout.
    pub fn select_or_create_sheet(
        &mut self,
        name: &SheetName,
        now: DateTime<Utc>,
    ) -> Result<SheetSelection, StoreError> {
        let tx = self.conn.transaction()?;
        tx.execute("UPDATE sheets SET active = 0 WHERE active = 1", [])?;
        let updated = tx.execute(
            "UPDATE sheets SET active = 1 WHERE name = ?",
            [name.as_str()],
        )?;
        let selection = if updated == 0 {
            tx.execute(
                "INSERT INTO sheets (name, active, created_at) VALUES (?, 1, ?)",
                params![name.as_str(), format_timestamp(now)],
            )?;
            SheetSelection::Created
        } else {
            SheetSelection::Switched
        };
        tx.commit()?;
        tracing::debug!(sheet = name.as_str(), ?selection, "selected sheet");
        Ok(selection)
    }

    /// Starts tracking a new entry on the active sheet.
    ///
    /// Fails when no sheet is active or another entry is still open;
    /// both guards run inside the insert transaction.
    pub fn start_entry(
        &mut self,
        started_at: DateTime<Utc>,
        note: &str,
    ) -> Result<i64, StoreError> {
        let tx = self.conn.transaction()?;
        let sheet = tx
            .query_row("SELECT id, name FROM sheets WHERE active = 1", [], |row| {
                Ok(ActiveSheet {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })
            .optional()?;
        let Some(sheet) = sheet else {
            return Err(StoreError::NoActiveSheet);
        };
        let open: Option<i64> = tx
            .query_row(
                "SELECT id FROM entries WHERE end_time IS NULL ORDER BY id ASC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;
        if open.is_some() {
            return Err(StoreError::AlreadyTracking);
        }
        let timestamp = format_timestamp(started_at);
        tx.execute(
            "
            INSERT INTO entries (sheet_id, start_time, end_time, note, created_at)
            VALUES (?, ?, NULL, ?, ?)
            ",
            params![sheet.id, timestamp, note, timestamp],
        )?;
        let entry_id = tx.last_insert_rowid();
        tx.commit()?;
        tracing::debug!(entry_id, sheet = %sheet.name, "started tracking");
        Ok(entry_id)
    }

    /// Returns the entry currently being tracked, if any.
    pub fn open_entry(&self) -> Result<Option<OpenEntry>, StoreError> {
        let row = self
            .conn
            .query_row(
                "
                SELECT e.id, s.name, e.start_time, e.note
                FROM entries e
                JOIN sheets s ON s.id = e.sheet_id
                WHERE e.end_time IS NULL
                ORDER BY e.id ASC
                LIMIT 1
                ",
                [],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;
        match row {
            Some((id, sheet, started_at, note)) => Ok(Some(OpenEntry {
                id,
                sheet,
                started_at: parse_timestamp(&started_at, id)?,
                note,
            })),
            None => Ok(None),
        }
    }

    /// Closes an open entry, writing its end time and final note.
    pub fn close_entry(
        &mut self,
        entry_id: i64,
        ended_at: DateTime<Utc>,
        note: &str,
    ) -> Result<(), StoreError> {
        let updated = self.conn.execute(
            "UPDATE entries SET end_time = ?, note = ? WHERE id = ? AND end_time IS NULL",
            params![format_timestamp(ended_at), note, entry_id],
        )?;
        if updated == 0 {
            return Err(StoreError::NoOpenEntry);
        }
        tracing::debug!(entry_id, "stopped tracking");
        Ok(())
    }

    /// Inserts an already-finished entry, as delivered by an import.
    ///
    /// The open-entry guard does not apply here; imported entries are
    /// assumed closed and an absent end time is stored as-is.
    pub fn insert_closed_entry(
        &mut self,
        sheet: &SheetName,
        started_at: DateTime<Utc>,
        ended_at: Option<DateTime<Utc>>,
        note: &str,
        imported_at: DateTime<Utc>,
    ) -> Result<i64, StoreError> {
        if let Some(ended_at) = ended_at {
            if ended_at < started_at {
                return Err(StoreError::InvalidInterval {
                    started_at,
                    ended_at,
                });
            }
        }
        let sheet_id: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM sheets WHERE name = ?",
                [sheet.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        let Some(sheet_id) = sheet_id else {
            return Err(StoreError::SheetNotFound {
                name: sheet.to_string(),
            });
        };
        self.conn.execute(
            "
            INSERT INTO entries (sheet_id, start_time, end_time, note, created_at)
            VALUES (?, ?, ?, ?, ?)
            ",
            params![
                sheet_id,
                format_timestamp(started_at),
                ended_at.map(format_timestamp),
                note,
                format_timestamp(imported_at),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Lists closed entries whose start time falls within the range.
    ///
    /// The range is inclusive of `start` and exclusive of `end`. Rows
    /// are ordered by sheet name, then by creation order within each
    /// sheet. Entries that are still open are excluded.
    pub fn closed_entries_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ClosedEntry>, StoreError> {
        if end <= start {
            return Ok(Vec::new());
        }
        let start = format_timestamp(start);
        let end = format_timestamp(end);
        let mut stmt = self.conn.prepare(
            "
            SELECT e.id, s.name, e.start_time, e.end_time, e.note
            FROM entries e
            JOIN sheets s ON s.id = e.sheet_id
            WHERE e.start_time >= ? AND e.start_time < ? AND e.end_time IS NOT NULL
            ORDER BY s.name ASC, e.id ASC
            ",
        )?;
        let rows = stmt.query_map([start, end], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;
        let mut entries = Vec::new();
        for row in rows {
            let (id, sheet, started_at, ended_at, note) = row?;
            entries.push(ClosedEntry {
                sheet,
                started_at: parse_timestamp(&started_at, id)?,
                ended_at: parse_timestamp(&ended_at, id)?,
                note,
            });
        }
        Ok(entries)
    }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(inner, _)
            if inner.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

fn parse_timestamp(timestamp: &str, entry_id: i64) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|source| StoreError::TimestampParse {
            entry_id,
            timestamp: timestamp.to_string(),
            source,
        })
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}
