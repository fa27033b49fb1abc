//! Calendar reconciliation.
//!
//! # Responsibility
//! - Locate or create the synthetic calendar idempotently.
//! - Write the desired occurrence set as a full rebuild or a differential
//!   patch keyed by `sync_key`.
//!
//! # Invariants
//! - Calendar creation is retried through one re-query when the insert
//!   fails or yields no id (another writer may have won the race).
//! - Differential mode leaves events identical to their desired state
//!   untouched; externally edited events are replaced, not merged.

use crate::config::CalendarSettings;
use crate::model::occurrence::CalendarOccurrence;
use crate::store::{CalendarId, CalendarStore, NewCalendar, StoredEvent};
use crate::sync::batch::BatchWriter;
use crate::sync::{SyncError, SyncResult};
use log::{info, warn};
use serde::Serialize;
use std::collections::HashMap;

const CREATE_RETRIES: u8 = 1;

/// Write strategy for one reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// Delete every event, then insert the desired set.
    Full,
    /// Delete stale events, insert missing ones, keep identical ones.
    Differential,
}

impl SyncMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Differential => "differential",
        }
    }
}

/// Counts of one reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub calendar_id: CalendarId,
    pub mode: SyncMode,
    pub deleted: usize,
    pub inserted: usize,
    pub reminders: usize,
    pub unchanged: usize,
    pub batches: usize,
}

/// Writes occurrence sets into the synthetic calendar of one store.
pub struct Reconciler<'a, S: CalendarStore + ?Sized> {
    store: &'a mut S,
    calendar: &'a CalendarSettings,
    batch_size: usize,
}

impl<'a, S: CalendarStore + ?Sized> Reconciler<'a, S> {
    pub fn new(store: &'a mut S, calendar: &'a CalendarSettings, batch_size: usize) -> Self {
        Self {
            store,
            calendar,
            batch_size,
        }
    }

    /// Returns the synthetic calendar id, creating the calendar when absent.
    ///
    /// Safe to call repeatedly; always yields the same id once created.
    pub fn locate_or_create_calendar(&mut self) -> SyncResult<CalendarId> {
        self.locate_or_create(CREATE_RETRIES)
    }

    fn locate_or_create(&mut self, retries_left: u8) -> SyncResult<CalendarId> {
        let request = NewCalendar::from(self.calendar);
        if let Some(id) = self.store.find_calendar(&request.account)? {
            return Ok(id);
        }

        match self.store.create_calendar(&request) {
            Ok(Some(id)) => {
                info!(
                    "event=calendar_create module=sync status=ok calendar_id={} account_type={}",
                    id, request.account.account_type
                );
                Ok(id)
            }
            Ok(None) if retries_left > 0 => {
                warn!("event=calendar_create module=sync status=retry reason=no_id");
                self.locate_or_create(retries_left - 1)
            }
            Err(err) if retries_left > 0 => {
                warn!("event=calendar_create module=sync status=retry reason=error error={err}");
                self.locate_or_create(retries_left - 1)
            }
            Ok(None) => Err(SyncError::CalendarUnavailable),
            Err(err) => Err(SyncError::Store(err)),
        }
    }

    /// Applies the configured color to the synthetic calendar.
    pub fn update_color(&mut self) -> SyncResult<CalendarId> {
        let id = self.locate_or_create_calendar()?;
        self.store.set_calendar_color(id, self.calendar.color)?;
        info!(
            "event=calendar_color module=sync status=ok calendar_id={} color={:#010x}",
            id, self.calendar.color
        );
        Ok(id)
    }

    /// Writes `occurrences` into the calendar using `mode`.
    pub fn reconcile(
        &mut self,
        calendar_id: CalendarId,
        occurrences: &[CalendarOccurrence],
        mode: SyncMode,
    ) -> SyncResult<ReconcileReport> {
        match mode {
            SyncMode::Full => self.reconcile_full(calendar_id, occurrences),
            SyncMode::Differential => self.reconcile_differential(calendar_id, occurrences),
        }
    }

    fn reconcile_full(
        &mut self,
        calendar_id: CalendarId,
        occurrences: &[CalendarOccurrence],
    ) -> SyncResult<ReconcileReport> {
        let cleared = self.store.clear_events(calendar_id)?;

        let mut writer = BatchWriter::new(&mut *self.store, calendar_id, self.batch_size);
        for occurrence in occurrences {
            writer.insert_occurrence(occurrence)?;
        }
        let stats = writer.finish()?;

        Ok(ReconcileReport {
            calendar_id,
            mode: SyncMode::Full,
            deleted: cleared,
            inserted: stats.inserted,
            reminders: stats.reminders,
            unchanged: 0,
            batches: stats.batches,
        })
    }

    fn reconcile_differential(
        &mut self,
        calendar_id: CalendarId,
        occurrences: &[CalendarOccurrence],
    ) -> SyncResult<ReconcileReport> {
        let existing = self.store.list_events(calendar_id)?;
        let plan = plan_differential(&existing, occurrences);

        let mut writer = BatchWriter::new(&mut *self.store, calendar_id, self.batch_size);
        for event_id in &plan.stale {
            writer.delete_event(*event_id)?;
        }
        for occurrence in &plan.missing {
            writer.insert_occurrence(occurrence)?;
        }
        let stats = writer.finish()?;

        Ok(ReconcileReport {
            calendar_id,
            mode: SyncMode::Differential,
            deleted: stats.deleted,
            inserted: stats.inserted,
            reminders: stats.reminders,
            unchanged: plan.unchanged,
            batches: stats.batches,
        })
    }
}

struct DifferentialPlan<'o> {
    stale: Vec<i64>,
    missing: Vec<&'o CalendarOccurrence>,
    unchanged: usize,
}

fn plan_differential<'o>(
    existing: &[StoredEvent],
    desired: &'o [CalendarOccurrence],
) -> DifferentialPlan<'o> {
    let mut by_key: HashMap<&str, Vec<&StoredEvent>> = HashMap::new();
    for event in existing {
        by_key.entry(event.sync_key.as_str()).or_default().push(event);
    }

    let mut missing = Vec::new();
    let mut unchanged = 0;
    for occurrence in desired {
        let matched = by_key.get_mut(occurrence.sync_key.as_str()).and_then(|candidates| {
            let position = candidates.iter().position(|event| same_content(event, occurrence))?;
            Some(candidates.swap_remove(position))
        });
        match matched {
            Some(_) => unchanged += 1,
            None => missing.push(occurrence),
        }
    }

    let mut stale: Vec<i64> = by_key
        .into_values()
        .flatten()
        .map(|event| event.id)
        .collect();
    stale.sort_unstable();

    DifferentialPlan {
        stale,
        missing,
        unchanged,
    }
}

fn same_content(event: &StoredEvent, occurrence: &CalendarOccurrence) -> bool {
    event.title == occurrence.title
        && event.start_ms == occurrence.start_ms
        && event.end_ms == occurrence.end_ms
        && event.contact_link == occurrence.contact_link
        && event.reminders == occurrence.reminders
}
