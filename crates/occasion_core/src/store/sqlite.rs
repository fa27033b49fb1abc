//! SQLite-backed synthetic calendar store.
//!
//! # Responsibility
//! - Persist the synthetic calendar, its all-day events and their reminders.
//! - Resolve in-batch reminder back-references inside one transaction.
//!
//! # Invariants
//! - One calendar per `(account_name, account_type)`.
//! - A failed batch leaves the database exactly as before the batch.

use crate::config::CalendarAccess;
use crate::db::migrations::latest_version;
use crate::store::{
    BatchOp, BatchOutcome, CalendarAccount, CalendarId, CalendarStore, EventId, NewCalendar,
    StoreError, StoreResult, StoredEvent,
};
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use std::collections::BTreeMap;

/// Calendar store over a migrated SQLite connection.
pub struct SqliteCalendarStore<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteCalendarStore<'conn> {
    /// Wraps a connection returned by `open_db` / `open_db_in_memory`.
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }

    /// Number of calendars owned by any account; used by diagnostics.
    pub fn calendar_count(&self) -> StoreResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM calendars;", [], |row| row.get(0))?;
        usize::try_from(count).map_err(|_| StoreError::InvalidData(format!("count {count}")))
    }

    /// Current color of one calendar.
    pub fn calendar_color(&self, id: CalendarId) -> StoreResult<u32> {
        self.conn
            .query_row("SELECT color FROM calendars WHERE id = ?1;", [id], |row| {
                row.get::<_, u32>(0)
            })
            .optional()?
            .ok_or(StoreError::CalendarNotFound(id))
    }

    fn load_reminders(&self, id: CalendarId) -> StoreResult<BTreeMap<EventId, Vec<i32>>> {
        let mut reminders: BTreeMap<EventId, Vec<i32>> = BTreeMap::new();
        let mut stmt = self.conn.prepare(
            "SELECT r.event_id, r.minutes
             FROM reminders r
             JOIN events e ON e.id = r.event_id
             WHERE e.calendar_id = ?1
             ORDER BY r.event_id ASC, r.id ASC;",
        )?;
        let mut rows = stmt.query([id])?;
        while let Some(row) = rows.next()? {
            reminders
                .entry(row.get::<_, EventId>(0)?)
                .or_default()
                .push(row.get(1)?);
        }
        Ok(reminders)
    }

    fn require_calendar(&self, id: CalendarId) -> StoreResult<()> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM calendars WHERE id = ?1);",
            [id],
            |row| row.get(0),
        )?;
        if exists == 1 {
            Ok(())
        } else {
            Err(StoreError::CalendarNotFound(id))
        }
    }
}

impl CalendarStore for SqliteCalendarStore<'_> {
    fn check_access(&self) -> StoreResult<()> {
        let version: u32 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;
        if version != latest_version() {
            return Err(StoreError::AccessDenied(format!(
                "calendar database schema version {version} is not migrated"
            )));
        }
        Ok(())
    }

    fn find_calendar(&self, account: &CalendarAccount) -> StoreResult<Option<CalendarId>> {
        let id = self
            .conn
            .query_row(
                "SELECT id FROM calendars WHERE account_name = ?1 AND account_type = ?2;",
                params![account.account_name, account.account_type],
                |row| row.get::<_, CalendarId>(0),
            )
            .optional()?;
        Ok(id)
    }

    fn create_calendar(&mut self, calendar: &NewCalendar) -> StoreResult<Option<CalendarId>> {
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO calendars (
                account_name,
                account_type,
                display_name,
                color,
                access_level
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                calendar.account.account_name,
                calendar.account.account_type,
                calendar.display_name,
                calendar.color,
                access_to_db(calendar.access),
            ],
        )?;
        if changed == 0 {
            return Ok(None);
        }
        Ok(Some(self.conn.last_insert_rowid()))
    }

    fn set_calendar_color(&mut self, id: CalendarId, color: u32) -> StoreResult<()> {
        let changed = self.conn.execute(
            "UPDATE calendars SET color = ?1 WHERE id = ?2;",
            params![color, id],
        )?;
        if changed == 0 {
            return Err(StoreError::CalendarNotFound(id));
        }
        Ok(())
    }

    fn clear_events(&mut self, id: CalendarId) -> StoreResult<usize> {
        self.require_calendar(id)?;
        Ok(self
            .conn
            .execute("DELETE FROM events WHERE calendar_id = ?1;", [id])?)
    }

    fn list_events(&self, id: CalendarId) -> StoreResult<Vec<StoredEvent>> {
        self.require_calendar(id)?;

        let mut reminders = self.load_reminders(id)?;

        let mut stmt = self.conn.prepare(
            "SELECT id, title, start_ms, end_ms, contact_link, sync_key
             FROM events
             WHERE calendar_id = ?1
             ORDER BY start_ms ASC, id ASC;",
        )?;
        let mut rows = stmt.query([id])?;
        let mut events = Vec::new();
        while let Some(row) = rows.next()? {
            let event_id: EventId = row.get("id")?;
            events.push(StoredEvent {
                id: event_id,
                title: row.get("title")?,
                start_ms: row.get("start_ms")?,
                end_ms: row.get("end_ms")?,
                contact_link: row.get("contact_link")?,
                sync_key: row.get("sync_key")?,
                reminders: reminders.remove(&event_id).unwrap_or_default(),
            });
        }
        Ok(events)
    }

    fn apply_batch(&mut self, id: CalendarId, ops: &[BatchOp]) -> StoreResult<BatchOutcome> {
        self.require_calendar(id)?;
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let outcome = apply_ops(&tx, id, ops)?;
        tx.commit()?;
        Ok(outcome)
    }
}

fn apply_ops(
    tx: &Transaction<'_>,
    calendar_id: CalendarId,
    ops: &[BatchOp],
) -> StoreResult<BatchOutcome> {
    // Position in `ops` -> created event id, for reminder back-references.
    let mut created_at: BTreeMap<usize, EventId> = BTreeMap::new();
    let mut outcome = BatchOutcome::default();

    for (position, op) in ops.iter().enumerate() {
        match op {
            BatchOp::DeleteEvent(event_id) => {
                outcome.deleted_events += tx.execute(
                    "DELETE FROM events WHERE id = ?1 AND calendar_id = ?2;",
                    params![event_id, calendar_id],
                )?;
            }
            BatchOp::CreateEvent(event) => {
                tx.execute(
                    "INSERT INTO events (
                        calendar_id,
                        title,
                        start_ms,
                        end_ms,
                        all_day,
                        timezone,
                        contact_link,
                        sync_key
                    ) VALUES (?1, ?2, ?3, ?4, 1, 'UTC', ?5, ?6);",
                    params![
                        calendar_id,
                        event.title,
                        event.start_ms,
                        event.end_ms,
                        event.contact_link,
                        event.sync_key,
                    ],
                )?;
                let event_id = tx.last_insert_rowid();
                created_at.insert(position, event_id);
                outcome.created_events.push(event_id);
            }
            BatchOp::CreateReminder { parent, minutes } => {
                let event_id = created_at.get(parent).copied().ok_or_else(|| {
                    StoreError::InvalidBatch(format!(
                        "reminder at {position} references {parent}, which is not an event created earlier in this batch"
                    ))
                })?;
                tx.execute(
                    "INSERT INTO reminders (event_id, minutes) VALUES (?1, ?2);",
                    params![event_id, minutes],
                )?;
                outcome.created_reminders += 1;
            }
        }
    }

    Ok(outcome)
}

fn access_to_db(access: CalendarAccess) -> &'static str {
    match access {
        CalendarAccess::Read => "read",
        CalendarAccess::Owner => "owner",
    }
}
