//! SQLite-backed persistence for users, entries, goals and routines.
//!
//! Every table is mapped by a [`Record`] impl, so create/get/list/delete share
//! one implementation. Writes touch a single entity; a routine and its items
//! are written in one transaction.
//!
//! # Invariants
//! - Records are validated before any SQL runs; a rejected write leaves the
//!   database untouched.
//! - Records owned by a user can only be written for an existing user.
//! - `list_by_user` returns records in ascending timestamp order, ties in
//!   insertion order.

mod columns;
mod records;
pub mod schema;

use crate::{Error, Profile, Result, User};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::time::Duration;
use uuid::Uuid;

use columns::millis;

/// Mapping between a domain type and its table
pub trait Record: Sized {
    /// Name used in error messages
    const ENTITY: &'static str;
    const TABLE: &'static str;
    /// Select list in the order `from_row` reads it
    const COLUMNS: &'static str;

    fn id(&self) -> Uuid;

    /// User that must exist before this record can be written
    fn owner(&self) -> Option<Uuid> {
        None
    }

    /// Human readable key for duplicate errors
    fn label(&self) -> String {
        self.id().to_string()
    }

    fn validate(&self) -> Result<()>;

    fn insert(&self, conn: &Connection) -> rusqlite::Result<()>;

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;

    /// Load data kept in child tables
    fn load_children(&mut self, _conn: &Connection) -> Result<()> {
        Ok(())
    }
}

/// A record that belongs to one user and carries a timestamp
pub trait UserOwned: Record {
    const TIME_COLUMN: &'static str;
}

/// Inclusive time bounds; `None` leaves that side open
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TimeRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl TimeRange {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn since(start: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: None,
        }
    }

    pub fn until(end: DateTime<Utc>) -> Self {
        Self {
            start: None,
            end: Some(end),
        }
    }

    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start.map_or(true, |start| at >= start) && self.end.map_or(true, |end| at <= end)
    }

    pub fn validate(&self) -> Result<()> {
        if let (Some(start), Some(end)) = (self.start, self.end) {
            if start > end {
                return Err(Error::validation(format!(
                    "time range starts after it ends ({} > {})",
                    start, end
                )));
            }
        }
        Ok(())
    }
}

/// Handle on the fittrack database
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open or create a database file and bring its schema up to date
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        tracing::info!("Opened database at {:?}", path);
        Self::bootstrap(conn)
    }

    /// Open a private in-memory database (tests, dry runs)
    pub fn open_in_memory() -> Result<Self> {
        Self::bootstrap(Connection::open_in_memory()?)
    }

    fn bootstrap(mut conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.busy_timeout(Duration::from_secs(5))?;
        schema::apply_migrations(&mut conn)?;
        Ok(Self { conn })
    }

    /// Validate and insert a record, returning its id
    pub fn create<R: Record>(&self, record: &R) -> Result<Uuid> {
        record.validate()?;
        if let Some(owner) = record.owner() {
            self.require_user(owner)?;
        }

        record
            .insert(&self.conn)
            .map_err(|e| write_error(e, R::ENTITY, &record.label()))?;

        tracing::debug!("Created {} {}", R::ENTITY, record.id());
        Ok(record.id())
    }

    pub fn get<R: Record>(&self, id: Uuid) -> Result<R> {
        let sql = format!("SELECT {} FROM {} WHERE id = ?1", R::COLUMNS, R::TABLE);
        let mut record = self
            .conn
            .query_row(&sql, [id.to_string()], R::from_row)
            .optional()?
            .ok_or_else(|| Error::not_found(R::ENTITY, id))?;

        record.load_children(&self.conn)?;
        Ok(record)
    }

    /// All records of one type for a user, oldest first
    pub fn list_by_user<R: UserOwned>(&self, user_id: Uuid, range: TimeRange) -> Result<Vec<R>> {
        range.validate()?;
        self.require_user(user_id)?;

        let sql = format!(
            "SELECT {cols} FROM {table}
             WHERE user_id = ?1
               AND (?2 IS NULL OR {time} >= ?2)
               AND (?3 IS NULL OR {time} <= ?3)
             ORDER BY {time} ASC, rowid ASC",
            cols = R::COLUMNS,
            table = R::TABLE,
            time = R::TIME_COLUMN,
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params![
                user_id.to_string(),
                range.start.map(millis),
                range.end.map(millis)
            ],
            R::from_row,
        )?;

        let mut records = rows.collect::<rusqlite::Result<Vec<R>>>()?;
        for record in &mut records {
            record.load_children(&self.conn)?;
        }

        tracing::debug!(
            "Listed {} {} records for user {}",
            records.len(),
            R::ENTITY,
            user_id
        );
        Ok(records)
    }

    pub fn delete<R: Record>(&self, id: Uuid) -> Result<()> {
        let sql = format!("DELETE FROM {} WHERE id = ?1", R::TABLE);
        let deleted = self.conn.execute(&sql, [id.to_string()])?;

        if deleted == 0 {
            return Err(Error::not_found(R::ENTITY, id));
        }

        tracing::debug!("Deleted {} {}", R::ENTITY, id);
        Ok(())
    }

    /// Look up a user by username (case-insensitive)
    pub fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE username = ?1",
            User::COLUMNS,
            User::TABLE
        );
        let user = self
            .conn
            .query_row(&sql, [username.trim()], User::from_row)
            .optional()?;
        Ok(user)
    }

    pub fn user_exists(&self, user_id: Uuid) -> Result<bool> {
        let exists = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1)",
            [user_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    pub fn require_user(&self, user_id: Uuid) -> Result<()> {
        if self.user_exists(user_id)? {
            Ok(())
        } else {
            Err(Error::not_found(User::ENTITY, user_id))
        }
    }

    /// Replace a user's profile. The only mutation users support.
    pub fn update_profile(&self, user_id: Uuid, profile: &Profile) -> Result<()> {
        profile.validate()?;

        let changed = self.conn.execute(
            "UPDATE users
             SET age_years = ?1, sex = ?2, weight_kg = ?3, height_cm = ?4, fitness_goal = ?5
             WHERE id = ?6",
            params![
                profile.age_years,
                profile.sex.as_str(),
                profile.weight_kg,
                profile.height_cm,
                profile.fitness_goal.as_str(),
                user_id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(Error::not_found(User::ENTITY, user_id));
        }

        tracing::info!("Updated profile for user {}", user_id);
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }
}

fn write_error(err: rusqlite::Error, entity: &str, label: &str) -> Error {
    if let rusqlite::Error::SqliteFailure(failure, _) = &err {
        if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
            || failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
        {
            return Error::Duplicate(format!("{} '{}' already exists", entity, label));
        }
    }
    Error::Database(err)
}
