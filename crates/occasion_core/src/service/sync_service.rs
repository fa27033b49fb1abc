//! Sync use-case service.
//!
//! # Responsibility
//! - Expose the trigger surface: full sync, differential sync, recolor.
//! - Run access checks, filtering, building and reconciliation in order.
//!
//! # Invariants
//! - Access to both stores is verified before any calendar write.
//! - The service owns no global state; callers serialize concurrent syncs.

use crate::config::SyncConfig;
use crate::contacts::filter::filter_and_dedup;
use crate::contacts::ContactSource;
use crate::occurrence::builder::{BuiltEventSet, EventSetBuilder, SkippedRecord};
use crate::store::{CalendarId, CalendarStore};
use crate::sync::reconciler::{ReconcileReport, Reconciler, SyncMode};
use crate::sync::{SyncError, SyncResult};
use chrono::{Datelike, Local};
use log::{error, info};
use serde::Serialize;
use std::time::Instant;

/// Outcome of one sync trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub current_year: i32,
    pub records_read: usize,
    pub excluded: usize,
    pub duplicates: usize,
    pub skipped: Vec<SkippedRecord>,
    pub occurrences: usize,
    pub reconcile: ReconcileReport,
}

/// Desired state computed without touching the calendar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncPlan {
    pub records_read: usize,
    pub excluded: usize,
    pub duplicates: usize,
    pub event_set: BuiltEventSet,
}

/// Request-scoped sync engine over one contact source and one store.
pub struct SyncService<C: ContactSource, S: CalendarStore> {
    contacts: C,
    store: S,
    config: SyncConfig,
}

impl<C: ContactSource, S: CalendarStore> SyncService<C, S> {
    pub fn new(contacts: C, store: S, config: SyncConfig) -> Self {
        Self {
            contacts,
            store,
            config,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Rebuilds the synthetic calendar from scratch for the current year.
    pub fn perform_full_sync(&mut self) -> SyncResult<SyncReport> {
        self.sync_for_year(SyncMode::Full, current_year())
    }

    /// Patches the synthetic calendar for the current year.
    pub fn perform_differential_sync(&mut self) -> SyncResult<SyncReport> {
        self.sync_for_year(SyncMode::Differential, current_year())
    }

    /// Runs one sync with an explicit current year.
    pub fn sync_for_year(&mut self, mode: SyncMode, current_year: i32) -> SyncResult<SyncReport> {
        let started_at = Instant::now();
        info!(
            "event=sync module=service status=start mode={} year={}",
            mode.as_str(),
            current_year
        );

        let result = self.run_sync(mode, current_year);
        match &result {
            Ok(report) => info!(
                "event=sync module=service status=ok mode={} duration_ms={} records={} excluded={} duplicates={} skipped={} deleted={} inserted={} unchanged={} batches={}",
                mode.as_str(),
                started_at.elapsed().as_millis(),
                report.records_read,
                report.excluded,
                report.duplicates,
                report.skipped.len(),
                report.reconcile.deleted,
                report.reconcile.inserted,
                report.reconcile.unchanged,
                report.reconcile.batches
            ),
            Err(err) => error!(
                "event=sync module=service status=error mode={} duration_ms={} error_code={} error={}",
                mode.as_str(),
                started_at.elapsed().as_millis(),
                err.code(),
                err
            ),
        }
        result
    }

    /// Applies the configured color without touching events.
    pub fn update_calendar_color_only(&mut self) -> SyncResult<CalendarId> {
        self.config.validate()?;
        self.store
            .check_access()
            .map_err(SyncError::CalendarAccess)?;
        Reconciler::new(&mut self.store, &self.config.calendar, self.config.batch_size)
            .update_color()
    }

    /// Reads, filters and builds the desired occurrence set.
    pub fn plan(&self, current_year: i32) -> SyncResult<SyncPlan> {
        self.config.validate()?;
        let records = self
            .contacts
            .read_records()
            .map_err(SyncError::ContactAccess)?;
        let records_read = records.len();
        let filtered = filter_and_dedup(records, &self.config.excluded_sources);
        let event_set = EventSetBuilder::new(&self.config).build(&filtered.records, current_year);

        Ok(SyncPlan {
            records_read,
            excluded: filtered.excluded,
            duplicates: filtered.duplicates,
            event_set,
        })
    }

    fn run_sync(&mut self, mode: SyncMode, current_year: i32) -> SyncResult<SyncReport> {
        self.config.validate()?;
        self.contacts
            .check_access()
            .map_err(SyncError::ContactAccess)?;
        self.store
            .check_access()
            .map_err(SyncError::CalendarAccess)?;

        let plan = self.plan(current_year)?;

        let mut reconciler =
            Reconciler::new(&mut self.store, &self.config.calendar, self.config.batch_size);
        let calendar_id = reconciler.locate_or_create_calendar()?;
        let reconcile = reconciler.reconcile(calendar_id, &plan.event_set.occurrences, mode)?;

        Ok(SyncReport {
            current_year,
            records_read: plan.records_read,
            excluded: plan.excluded,
            duplicates: plan.duplicates,
            occurrences: plan.event_set.occurrences.len(),
            skipped: plan.event_set.skipped,
            reconcile,
        })
    }
}

fn current_year() -> i32 {
    Local::now().year()
}
