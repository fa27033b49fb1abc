//! Bounded batch writer.
//!
//! # Invariants
//! - A flushed batch never holds more than `threshold` operations.
//! - An occurrence and all of its reminders land in the same batch.
//! - Reminder back-references count from zero in every new batch.

use crate::model::occurrence::CalendarOccurrence;
use crate::store::{BatchOp, CalendarId, CalendarStore, EventId, NewEvent, StoreError};
use crate::sync::{SyncError, SyncResult, WriteStats};
use log::{debug, error};

/// Accumulates operations and flushes them as atomic store batches.
pub struct BatchWriter<'s, S: CalendarStore + ?Sized> {
    store: &'s mut S,
    calendar_id: CalendarId,
    threshold: usize,
    ops: Vec<BatchOp>,
    stats: WriteStats,
}

impl<'s, S: CalendarStore + ?Sized> BatchWriter<'s, S> {
    pub fn new(store: &'s mut S, calendar_id: CalendarId, threshold: usize) -> Self {
        Self {
            store,
            calendar_id,
            threshold: threshold.max(1),
            ops: Vec::with_capacity(threshold.max(1)),
            stats: WriteStats::default(),
        }
    }

    /// Queues one event deletion.
    pub fn delete_event(&mut self, event_id: EventId) -> SyncResult<()> {
        self.reserve(1)?;
        self.ops.push(BatchOp::DeleteEvent(event_id));
        Ok(())
    }

    /// Queues one occurrence followed directly by its reminders.
    pub fn insert_occurrence(&mut self, occurrence: &CalendarOccurrence) -> SyncResult<()> {
        self.reserve(1 + occurrence.reminders.len())?;

        let parent = self.ops.len();
        self.ops.push(BatchOp::CreateEvent(NewEvent {
            title: occurrence.title.clone(),
            start_ms: occurrence.start_ms,
            end_ms: occurrence.end_ms,
            contact_link: occurrence.contact_link.clone(),
            sync_key: occurrence.sync_key.clone(),
        }));
        self.ops.extend(
            occurrence
                .reminders
                .iter()
                .map(|minutes| BatchOp::CreateReminder {
                    parent,
                    minutes: *minutes,
                }),
        );
        Ok(())
    }

    /// Flushes pending operations, if any.
    pub fn flush(&mut self) -> SyncResult<()> {
        if self.ops.is_empty() {
            return Ok(());
        }

        let batch_index = self.stats.batches;
        let ops = std::mem::take(&mut self.ops);
        match self.store.apply_batch(self.calendar_id, &ops) {
            Ok(outcome) => {
                self.stats.batches += 1;
                self.stats.inserted += outcome.created_events.len();
                self.stats.reminders += outcome.created_reminders;
                self.stats.deleted += outcome.deleted_events;
                debug!(
                    "event=batch_flush module=sync status=ok batch={} ops={} inserted={} reminders={} deleted={}",
                    batch_index,
                    ops.len(),
                    outcome.created_events.len(),
                    outcome.created_reminders,
                    outcome.deleted_events
                );
                Ok(())
            }
            Err(source) => {
                error!(
                    "event=batch_flush module=sync status=error batch={} ops={} error={}",
                    batch_index,
                    ops.len(),
                    source
                );
                Err(SyncError::BatchFailed {
                    batch_index,
                    applied: self.stats,
                    source,
                })
            }
        }
    }

    /// Flushes the remainder and returns the totals.
    pub fn finish(mut self) -> SyncResult<WriteStats> {
        self.flush()?;
        Ok(self.stats)
    }

    pub fn pending(&self) -> usize {
        self.ops.len()
    }

    fn reserve(&mut self, group: usize) -> SyncResult<()> {
        if group > self.threshold {
            return Err(SyncError::Store(StoreError::InvalidBatch(format!(
                "operation group of {group} exceeds batch threshold {}",
                self.threshold
            ))));
        }
        if self.ops.len() + group > self.threshold {
            self.flush()?;
        }
        Ok(())
    }
}
