//! Desired occurrence set construction.
//!
//! # Responsibility
//! - Drive parse -> expand -> title over unique contact records.
//! - Attach one reminder per enabled offset to every occurrence.
//!
//! # Invariants
//! - Unparseable records contribute zero occurrences and are reported.
//! - Occurrences keep record order, then ascending year, so each one's
//!   reminders can be written right after it.

use crate::config::SyncConfig;
use crate::model::occurrence::{CalendarOccurrence, DAY_MILLIS};
use crate::model::record::ContactEventRecord;
use crate::occurrence::expander::expand;
use crate::occurrence::title::TitleGenerator;
use crate::parse::date_parser::parse;
use log::{debug, warn};
use serde::Serialize;

/// Record dropped because its date could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRecord {
    pub record_slot: usize,
    pub display_name: Option<String>,
    pub raw_date: String,
}

/// Output of one build pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuiltEventSet {
    pub occurrences: Vec<CalendarOccurrence>,
    pub skipped: Vec<SkippedRecord>,
}

impl BuiltEventSet {
    /// `(occurrence index, minutes)` for every reminder, in write order.
    pub fn reminder_assignments(&self) -> impl Iterator<Item = (usize, i32)> + '_ {
        self.occurrences
            .iter()
            .enumerate()
            .flat_map(|(index, occurrence)| {
                occurrence.reminders.iter().map(move |minutes| (index, *minutes))
            })
    }

    pub fn reminder_count(&self) -> usize {
        self.occurrences.iter().map(|o| o.reminders.len()).sum()
    }
}

/// Builds the full desired occurrence set for one sync.
pub struct EventSetBuilder<'cfg> {
    config: &'cfg SyncConfig,
    titles: TitleGenerator<'cfg>,
    reminder_offsets: Vec<i32>,
}

impl<'cfg> EventSetBuilder<'cfg> {
    pub fn new(config: &'cfg SyncConfig) -> Self {
        Self {
            config,
            titles: TitleGenerator::new(config),
            reminder_offsets: config.enabled_reminder_offsets(),
        }
    }

    /// Builds occurrences for already filtered and deduplicated records.
    pub fn build(&self, records: &[ContactEventRecord], current_year: i32) -> BuiltEventSet {
        let mut built = BuiltEventSet::default();

        for (record_slot, record) in records.iter().enumerate() {
            let Some(parsed) = parse(&record.raw_date, self.config.date_order) else {
                warn!(
                    "event=date_parse module=occurrence status=skip contact={:?} raw_date={:?}",
                    record.log_name(),
                    record.raw_date
                );
                built.skipped.push(SkippedRecord {
                    record_slot,
                    display_name: record.display_name.clone(),
                    raw_date: record.raw_date.clone(),
                });
                continue;
            };

            let contact_link = if self.config.attach_contact_links {
                record.contact_link.clone()
            } else {
                None
            };

            for skeleton in expand(&parsed, current_year, self.config.window) {
                let title = self.titles.render(
                    record.category,
                    record.custom_label.as_deref(),
                    record.display_name.as_deref(),
                    skeleton.age,
                    skeleton.include_age,
                );
                let start_ms = skeleton.start_millis();
                built.occurrences.push(CalendarOccurrence {
                    event_date: skeleton.date,
                    start_ms,
                    end_ms: start_ms + DAY_MILLIS,
                    title,
                    age: skeleton.age,
                    include_age: skeleton.include_age,
                    reminders: self.reminder_offsets.clone(),
                    record_slot,
                    sync_key: format!("{}#{}", record.dedup_key, skeleton.target_year),
                    contact_link: contact_link.clone(),
                });
            }
        }

        debug!(
            "event=event_set_build module=occurrence status=ok records={} occurrences={} reminders={} skipped={}",
            records.len(),
            built.occurrences.len(),
            built.reminder_count(),
            built.skipped.len()
        );
        built
    }
}

#[cfg(test)]
mod tests {
    use super::EventSetBuilder;
    use crate::config::{ReminderSetting, SyncConfig};
    use crate::model::record::{ContactEventRecord, EventCategory};

    fn birthday(link: &str, name: &str, raw: &str) -> ContactEventRecord {
        ContactEventRecord::new(format!("raw-{link}"), link, EventCategory::Birthday, raw)
            .with_display_name(name)
            .with_contact_link(format!("contact://{link}"))
    }

    #[test]
    fn builds_one_occurrence_per_year_with_titles() {
        let config = SyncConfig::default();
        let built =
            EventSetBuilder::new(&config).build(&[birthday("a", "Ada", "1974-06-01")], 2024);

        assert_eq!(built.occurrences.len(), 9);
        assert!(built.skipped.is_empty());
        let current = &built.occurrences[3];
        assert_eq!(current.age, 50);
        assert_eq!(current.title, "\u{2605} Ada's birthday (50)");
        assert_eq!(current.contact_link.as_deref(), Some("contact://a"));
        assert!(current.sync_key.ends_with("#2024"));
        assert_eq!(current.end_ms - current.start_ms, 86_400_000);
    }

    #[test]
    fn unparseable_record_is_skipped_and_reported() {
        let config = SyncConfig::default();
        let records = [birthday("a", "Ada", "not a date"), birthday("b", "Bob", "--03-01")];
        let built = EventSetBuilder::new(&config).build(&records, 2024);

        assert_eq!(built.skipped.len(), 1);
        assert_eq!(built.skipped[0].display_name.as_deref(), Some("Ada"));
        assert_eq!(built.skipped[0].raw_date, "not a date");
        assert_eq!(built.occurrences.len(), 9);
        assert!(built.occurrences.iter().all(|o| o.record_slot == 1));
    }

    #[test]
    fn each_enabled_offset_adds_one_reminder() {
        let mut config = SyncConfig::default();
        config.reminders = vec![
            ReminderSetting {
                enabled: true,
                minutes: -900,
            },
            ReminderSetting {
                enabled: false,
                minutes: 0,
            },
            ReminderSetting {
                enabled: true,
                minutes: 540,
            },
        ];
        let built = EventSetBuilder::new(&config).build(&[birthday("a", "Ada", "--01-01")], 2024);

        assert!(built.occurrences.iter().all(|o| o.reminders == vec![-900, 540]));
        assert_eq!(built.reminder_count(), 18);
        let assignments: Vec<(usize, i32)> = built.reminder_assignments().take(3).collect();
        assert_eq!(assignments, vec![(0, -900), (0, 540), (1, -900)]);
    }

    #[test]
    fn links_are_dropped_when_disabled() {
        let mut config = SyncConfig::default();
        config.attach_contact_links = false;
        let built = EventSetBuilder::new(&config).build(&[birthday("a", "Ada", "--01-01")], 2024);
        assert!(built.occurrences.iter().all(|o| o.contact_link.is_none()));
    }
}
