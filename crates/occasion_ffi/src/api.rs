//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose the sync triggers and the contact date check to Dart via FRB.
//! - Accept host-read contacts and config as JSON documents.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Reports cross the boundary as JSON strings with stable field names.

use occasion_core::db::open_db;
use occasion_core::{
    core_version as core_version_inner, init_logging as init_logging_inner,
    parse_with_format, ping as ping_inner, DateOrder, InMemoryContactSource, SqliteCalendarStore,
    SyncConfig, SyncError, SyncMode, SyncService,
};
use log::warn;
use serde::Serialize;

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Result envelope shared by every sync trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncActionResponse {
    /// Whether the trigger completed.
    pub ok: bool,
    /// Stable failure code (`invalid_config`, `contacts_unavailable`, ...).
    pub error_code: Option<String>,
    /// Serialized report on success.
    pub report_json: Option<String>,
    /// Human-readable message for diagnostics/UI.
    pub message: String,
}

impl SyncActionResponse {
    fn success(message: impl Into<String>, report_json: String) -> Self {
        Self {
            ok: true,
            error_code: None,
            report_json: Some(report_json),
            message: message.into(),
        }
    }

    fn failure(code: &str, message: impl Into<String>) -> Self {
        warn!("event=ffi_call module=ffi status=error error_code={code}");
        Self {
            ok: false,
            error_code: Some(code.to_string()),
            report_json: None,
            message: message.into(),
        }
    }
}

/// Outcome of probing one raw date string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateProbeResponse {
    pub ok: bool,
    /// `None` when the raw value carried no year.
    pub year: Option<i32>,
    pub month: u32,
    pub day: u32,
    /// Name of the format that matched.
    pub format: String,
}

/// Rebuilds the synthetic calendar from the given contact records.
///
/// Input semantics:
/// - `db_path`: calendar store file; created and migrated when absent.
/// - `config_json`: `SyncConfig` document; blank means defaults.
/// - `records_json`: JSON array of contact date records read by the host.
///
/// # FFI contract
/// - Sync call, DB-backed; run it off the UI thread.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn perform_full_sync(
    db_path: String,
    config_json: String,
    records_json: String,
) -> SyncActionResponse {
    run_sync_trigger(SyncMode::Full, &db_path, &config_json, &records_json)
}

/// Patches the synthetic calendar, keeping unchanged events.
///
/// Same inputs and contract as [`perform_full_sync`].
#[flutter_rust_bridge::frb(sync)]
pub fn perform_differential_sync(
    db_path: String,
    config_json: String,
    records_json: String,
) -> SyncActionResponse {
    run_sync_trigger(SyncMode::Differential, &db_path, &config_json, &records_json)
}

/// Applies the configured calendar color without touching events.
///
/// `report_json` carries `{"calendar_id": <id>}` on success.
#[flutter_rust_bridge::frb(sync)]
pub fn update_calendar_color_only(db_path: String, config_json: String) -> SyncActionResponse {
    let config = match parse_config(&config_json) {
        Ok(config) => config,
        Err(response) => return response,
    };
    let mut conn = match open_db(db_path.trim()) {
        Ok(conn) => conn,
        Err(err) => {
            return SyncActionResponse::failure(
                "store_failed",
                format!("calendar DB open failed: {err}"),
            )
        }
    };
    let store = SqliteCalendarStore::new(&mut conn);
    let mut service = SyncService::new(InMemoryContactSource::default(), store, config);

    match service.update_calendar_color_only() {
        Ok(calendar_id) => match to_json(&serde_json::json!({ "calendar_id": calendar_id })) {
            Ok(json) => SyncActionResponse::success("Calendar color updated.", json),
            Err(message) => SyncActionResponse::failure("report_encoding", message),
        },
        Err(err) => sync_failure(&err),
    }
}

/// Reports how a raw contact date would be read.
///
/// # FFI contract
/// - Pure, no I/O.
/// - Unparseable input yields `ok=false` with zeroed fields.
#[flutter_rust_bridge::frb(sync)]
pub fn probe_contact_date(raw: String, day_first: bool) -> DateProbeResponse {
    let order = if day_first {
        DateOrder::DayFirst
    } else {
        DateOrder::MonthFirst
    };
    match parse_with_format(&raw, order) {
        Some((parsed, format)) => DateProbeResponse {
            ok: true,
            year: parsed.has_explicit_year.then_some(parsed.year),
            month: parsed.month,
            day: parsed.day,
            format: format.to_string(),
        },
        None => DateProbeResponse {
            ok: false,
            year: None,
            month: 0,
            day: 0,
            format: String::new(),
        },
    }
}

fn run_sync_trigger(
    mode: SyncMode,
    db_path: &str,
    config_json: &str,
    records_json: &str,
) -> SyncActionResponse {
    let config = match parse_config(config_json) {
        Ok(config) => config,
        Err(response) => return response,
    };
    let contacts = match InMemoryContactSource::from_json_str(records_json) {
        Ok(contacts) => contacts,
        Err(err) => return SyncActionResponse::failure("contacts_unavailable", err.to_string()),
    };
    let mut conn = match open_db(db_path.trim()) {
        Ok(conn) => conn,
        Err(err) => {
            return SyncActionResponse::failure(
                "store_failed",
                format!("calendar DB open failed: {err}"),
            )
        }
    };
    let store = SqliteCalendarStore::new(&mut conn);
    let mut service = SyncService::new(contacts, store, config);

    let result = match mode {
        SyncMode::Full => service.perform_full_sync(),
        SyncMode::Differential => service.perform_differential_sync(),
    };
    match result {
        Ok(report) => match to_json(&report) {
            Ok(json) => SyncActionResponse::success(
                format!(
                    "Synced {} occurrence(s) in {} batch(es).",
                    report.occurrences, report.reconcile.batches
                ),
                json,
            ),
            Err(message) => SyncActionResponse::failure("report_encoding", message),
        },
        Err(err) => sync_failure(&err),
    }
}

fn parse_config(config_json: &str) -> Result<SyncConfig, SyncActionResponse> {
    if config_json.trim().is_empty() {
        return Ok(SyncConfig::default());
    }
    SyncConfig::from_json_str(config_json)
        .map_err(|err| SyncActionResponse::failure("invalid_config", err.to_string()))
}

fn sync_failure(err: &SyncError) -> SyncActionResponse {
    SyncActionResponse::failure(err.code(), err.to_string())
}

fn to_json(value: &impl Serialize) -> Result<String, String> {
    serde_json::to_string(value).map_err(|err| format!("report encoding failed: {err}"))
}
