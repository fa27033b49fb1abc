//! Reconciliation of the desired occurrence set into the calendar store.
//!
//! # Responsibility
//! - Locate or create the synthetic calendar.
//! - Replace (full) or patch (differential) its events in bounded batches.
//!
//! # Invariants
//! - No write happens before both stores passed their access checks.
//! - A failed batch does not roll back batches flushed before it.

pub mod batch;
pub mod reconciler;

use crate::config::ConfigError;
use crate::contacts::ContactSourceError;
use crate::store::StoreError;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type SyncResult<T> = Result<T, SyncError>;

/// Counters of applied writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WriteStats {
    pub batches: usize,
    pub inserted: usize,
    pub reminders: usize,
    pub deleted: usize,
}

/// Sync failure.
#[derive(Debug)]
pub enum SyncError {
    Config(ConfigError),
    /// Contacts cannot be read; nothing was written.
    ContactAccess(ContactSourceError),
    /// Calendar cannot be written; nothing was written.
    CalendarAccess(StoreError),
    /// The synthetic calendar could neither be found nor created.
    CalendarUnavailable,
    Store(StoreError),
    /// One batch failed; earlier batches stay applied.
    BatchFailed {
        batch_index: usize,
        applied: WriteStats,
        source: StoreError,
    },
}

impl Display for SyncError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::ContactAccess(err) => write!(f, "{err}"),
            Self::CalendarAccess(err) => write!(f, "{err}"),
            Self::CalendarUnavailable => {
                write!(f, "synthetic calendar could not be located or created")
            }
            Self::Store(err) => write!(f, "{err}"),
            Self::BatchFailed {
                batch_index,
                applied,
                source,
            } => write!(
                f,
                "batch {batch_index} failed after {} events were written: {source}",
                applied.inserted
            ),
        }
    }
}

impl Error for SyncError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::ContactAccess(err) => Some(err),
            Self::CalendarAccess(err) => Some(err),
            Self::CalendarUnavailable => None,
            Self::Store(err) => Some(err),
            Self::BatchFailed { source, .. } => Some(source),
        }
    }
}

impl From<ConfigError> for SyncError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<StoreError> for SyncError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl SyncError {
    /// Stable short code for logs and FFI callers.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "invalid_config",
            Self::ContactAccess(_) => "contacts_unavailable",
            Self::CalendarAccess(_) => "calendar_unavailable",
            Self::CalendarUnavailable => "calendar_missing",
            Self::Store(_) => "store_failed",
            Self::BatchFailed { .. } => "batch_failed",
        }
    }
}
