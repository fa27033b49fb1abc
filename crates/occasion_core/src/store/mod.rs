//! Calendar store seam.
//!
//! # Responsibility
//! - Define the write contract the reconciler needs from a calendar store.
//! - Define batch operations whose reminders point back into the same batch.
//!
//! # Invariants
//! - `apply_batch` is atomic: every operation applies or none does.
//! - `BatchOp::CreateReminder::parent` indexes a `CreateEvent` earlier in the
//!   same batch, never a previous one.
//!
//! # See also
//! - `sqlite` for the bundled implementation.

pub mod sqlite;

use crate::config::{CalendarAccess, CalendarSettings};
use crate::db::DbError;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub use sqlite::SqliteCalendarStore;

pub type CalendarId = i64;
pub type EventId = i64;
pub type StoreResult<T> = Result<T, StoreError>;

/// Calendar store failure.
#[derive(Debug)]
pub enum StoreError {
    /// Write permission missing or store unreachable.
    AccessDenied(String),
    Db(DbError),
    CalendarNotFound(CalendarId),
    /// Batch references that do not resolve inside the batch.
    InvalidBatch(String),
    InvalidData(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AccessDenied(reason) => write!(f, "calendar access denied: {reason}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::CalendarNotFound(id) => write!(f, "calendar not found: {id}"),
            Self::InvalidBatch(message) => write!(f, "invalid batch: {message}"),
            Self::InvalidData(message) => write!(f, "invalid stored calendar data: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Owner account of the synthetic calendar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarAccount {
    pub account_name: String,
    pub account_type: String,
}

/// Creation request for the synthetic calendar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCalendar {
    pub account: CalendarAccount,
    pub display_name: String,
    pub color: u32,
    pub access: CalendarAccess,
}

impl From<&CalendarSettings> for NewCalendar {
    fn from(value: &CalendarSettings) -> Self {
        Self {
            account: CalendarAccount {
                account_name: value.account_name.clone(),
                account_type: value.account_type.clone(),
            },
            display_name: value.display_name.clone(),
            color: value.color,
            access: value.access,
        }
    }
}

/// All-day event insert payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    pub title: String,
    pub start_ms: i64,
    pub end_ms: i64,
    pub contact_link: Option<String>,
    pub sync_key: String,
}

/// Event as currently stored, with its reminders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredEvent {
    pub id: EventId,
    pub title: String,
    pub start_ms: i64,
    pub end_ms: i64,
    pub contact_link: Option<String>,
    pub sync_key: String,
    pub reminders: Vec<i32>,
}

/// One operation inside an atomic write batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOp {
    DeleteEvent(EventId),
    CreateEvent(NewEvent),
    /// `parent` is the position of a `CreateEvent` in the same batch.
    CreateReminder { parent: usize, minutes: i32 },
}

/// Result of one applied batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub created_events: Vec<EventId>,
    pub created_reminders: usize,
    pub deleted_events: usize,
}

/// Write access to the external calendar store.
pub trait CalendarStore {
    /// Fails when the store cannot be written at all.
    fn check_access(&self) -> StoreResult<()>;
    fn find_calendar(&self, account: &CalendarAccount) -> StoreResult<Option<CalendarId>>;
    /// Returns `None` when the insert did not yield a calendar id, e.g. when
    /// another writer created the same account's calendar first.
    fn create_calendar(&mut self, calendar: &NewCalendar) -> StoreResult<Option<CalendarId>>;
    fn set_calendar_color(&mut self, id: CalendarId, color: u32) -> StoreResult<()>;
    /// Deletes every event of the calendar and returns how many were removed.
    fn clear_events(&mut self, id: CalendarId) -> StoreResult<usize>;
    /// Lists events ordered by start time then id.
    fn list_events(&self, id: CalendarId) -> StoreResult<Vec<StoredEvent>>;
    /// Applies all operations in one transaction.
    fn apply_batch(&mut self, id: CalendarId, ops: &[BatchOp]) -> StoreResult<BatchOutcome>;
}
