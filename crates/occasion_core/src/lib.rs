//! Core engine for occasion sync.
//!
//! Turns dated contact records (birthdays, anniversaries, custom dates) into
//! all-day events of one synthetic calendar. This crate is the single source
//! of truth for parsing, expansion, titling and reconciliation rules.

pub mod config;
pub mod contacts;
pub mod db;
pub mod logging;
pub mod model;
pub mod occurrence;
pub mod parse;
pub mod service;
pub mod store;
pub mod sync;

pub use config::{
    CalendarSettings, ConfigError, DateOrder, ExcludedSource, LabelTemplates, ReminderSetting,
    SyncConfig, YearWindow,
};
pub use contacts::memory::{ContactRecordInput, InMemoryContactSource};
pub use contacts::{ContactSource, ContactSourceError};
pub use logging::{default_log_level, init_logging, init_stderr_logging, logging_status};
pub use model::occurrence::{CalendarOccurrence, ParsedDate, SENTINEL_YEAR};
pub use model::record::{ContactEventRecord, DedupKey, EventCategory, SourceRef};
pub use occurrence::builder::{BuiltEventSet, EventSetBuilder};
pub use parse::date_parser::{parse as parse_date, parse_with_format};
pub use service::sync_service::{SyncPlan, SyncReport, SyncService};
pub use store::{CalendarStore, SqliteCalendarStore, StoreError, StoredEvent};
pub use sync::reconciler::{ReconcileReport, SyncMode};
pub use sync::{SyncError, SyncResult};

/// Minimal health-check API for host integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
