use chrono::NaiveDate;
use occasion_core::db::open_db_in_memory;
use occasion_core::model::occurrence::{date_to_utc_millis, DAY_MILLIS};
use occasion_core::{
    CalendarStore, ContactEventRecord, DedupKey, EventCategory, ExcludedSource,
    InMemoryContactSource, SourceRef, SqliteCalendarStore, StoredEvent, SyncConfig, SyncMode,
    SyncService,
};

const YEAR: i32 = 2024;

fn work_source() -> SourceRef {
    SourceRef::new("com.work", "dan@work.example")
}

fn records() -> Vec<ContactEventRecord> {
    vec![
        ContactEventRecord::new("raw-ada", "lk-ada", EventCategory::Birthday, "1984-04-05")
            .with_display_name("Ada")
            .with_contact_link("contact://lk-ada"),
        // Same contact reached through a second raw entry.
        ContactEventRecord::new("raw-ada-2", "lk-ada", EventCategory::Birthday, "04/05/1984")
            .with_display_name("Ada L."),
        ContactEventRecord::new("raw-bob", "lk-bob", EventCategory::Anniversary, "--12-24")
            .with_display_name("Bob"),
        ContactEventRecord::new("raw-carol", "lk-carol", EventCategory::Birthday, "not a date")
            .with_display_name("Carol"),
        ContactEventRecord::new("raw-dan", "lk-dan", EventCategory::Birthday, "1970-01-02")
            .with_display_name("Dan")
            .with_origin_source(work_source()),
        ContactEventRecord::new("raw-eve", "lk-eve", EventCategory::Custom, "--05-15")
            .with_custom_label("Name day")
            .with_display_name("Eve"),
    ]
}

fn config() -> SyncConfig {
    SyncConfig {
        excluded_sources: vec![ExcludedSource::whole(work_source())],
        ..SyncConfig::default()
    }
}

fn sync_key(link: &str, category: EventCategory, label: Option<&str>, year: i32) -> String {
    format!("{}#{year}", DedupKey::derive(link, category, label))
}

fn find<'e>(events: &'e [StoredEvent], key: &str) -> &'e StoredEvent {
    events
        .iter()
        .find(|event| event.sync_key == key)
        .unwrap_or_else(|| panic!("no event with sync key {key}"))
}

#[test]
fn full_sync_writes_the_whole_window() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = SyncService::new(
        InMemoryContactSource::new(records()),
        SqliteCalendarStore::new(&mut conn),
        config(),
    );

    let report = service.sync_for_year(SyncMode::Full, YEAR).unwrap();

    assert_eq!(report.records_read, 6);
    assert_eq!(report.excluded, 1);
    assert_eq!(report.duplicates, 1);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].display_name.as_deref(), Some("Carol"));
    // Ada, Bob and Eve over 2021..=2029.
    assert_eq!(report.occurrences, 27);
    assert_eq!(report.reconcile.inserted, 27);
    assert_eq!(report.reconcile.reminders, 27);
    assert_eq!(report.reconcile.batches, 1);

    let events = service
        .store()
        .list_events(report.reconcile.calendar_id)
        .unwrap();
    assert_eq!(events.len(), 27);

    let ada = find(&events, &sync_key("lk-ada", EventCategory::Birthday, None, 2024));
    let start = date_to_utc_millis(NaiveDate::from_ymd_opt(2024, 4, 5).unwrap());
    assert_eq!(ada.title, "\u{2605} Ada's birthday (40)");
    assert_eq!(ada.start_ms, start);
    assert_eq!(ada.end_ms, start + DAY_MILLIS);
    assert_eq!(ada.reminders, vec![-900]);
    assert_eq!(ada.contact_link.as_deref(), Some("contact://lk-ada"));

    let ada_next = find(&events, &sync_key("lk-ada", EventCategory::Birthday, None, 2025));
    assert_eq!(ada_next.title, "Ada's birthday (41)");

    let bob = find(&events, &sync_key("lk-bob", EventCategory::Anniversary, None, 2021));
    assert_eq!(bob.title, "Bob's anniversary");

    let eve = find(
        &events,
        &sync_key("lk-eve", EventCategory::Custom, Some("Name day"), 2029),
    );
    assert_eq!(eve.title, "Eve: Name day");

    assert!(events.iter().all(|event| !event.title.contains("Dan")));
    assert!(events.iter().all(|event| !event.title.contains("Carol")));
}

#[test]
fn repeated_full_sync_converges_to_the_same_calendar() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = SyncService::new(
        InMemoryContactSource::new(records()),
        SqliteCalendarStore::new(&mut conn),
        config(),
    );

    let first = service.sync_for_year(SyncMode::Full, YEAR).unwrap();
    let before = projection(
        &service
            .store()
            .list_events(first.reconcile.calendar_id)
            .unwrap(),
    );

    let second = service.sync_for_year(SyncMode::Full, YEAR).unwrap();
    assert_eq!(second.reconcile.calendar_id, first.reconcile.calendar_id);
    assert_eq!(second.reconcile.deleted, 27);
    assert_eq!(second.reconcile.inserted, 27);

    let after = projection(
        &service
            .store()
            .list_events(second.reconcile.calendar_id)
            .unwrap(),
    );
    assert_eq!(before, after);
    assert_eq!(service.store().calendar_count().unwrap(), 1);
}

#[test]
fn batches_split_on_occurrence_boundaries() {
    let mut config = config();
    config.reminders[1].enabled = true;
    config.batch_size = 7;

    let mut conn = open_db_in_memory().unwrap();
    let mut service = SyncService::new(
        InMemoryContactSource::new(records()),
        SqliteCalendarStore::new(&mut conn),
        config,
    );
    let report = service.sync_for_year(SyncMode::Full, YEAR).unwrap();

    // Three operations per occurrence, two occurrences per batch.
    assert_eq!(report.reconcile.batches, 14);
    assert_eq!(report.reconcile.reminders, 54);

    let events = service
        .store()
        .list_events(report.reconcile.calendar_id)
        .unwrap();
    assert!(events.iter().all(|event| event.reminders == vec![-900, 540]));
}

#[test]
fn disabled_contact_links_are_not_written() {
    let config = SyncConfig {
        attach_contact_links: false,
        ..config()
    };
    let mut conn = open_db_in_memory().unwrap();
    let mut service = SyncService::new(
        InMemoryContactSource::new(records()),
        SqliteCalendarStore::new(&mut conn),
        config,
    );
    let report = service.sync_for_year(SyncMode::Full, YEAR).unwrap();

    let events = service
        .store()
        .list_events(report.reconcile.calendar_id)
        .unwrap();
    assert!(events.iter().all(|event| event.contact_link.is_none()));
}

#[test]
fn plan_reports_the_desired_set_without_writing() {
    let mut conn = open_db_in_memory().unwrap();
    let service = SyncService::new(
        InMemoryContactSource::new(records()),
        SqliteCalendarStore::new(&mut conn),
        config(),
    );

    let plan = service.plan(YEAR).unwrap();
    assert_eq!(plan.event_set.occurrences.len(), 27);
    assert_eq!(plan.event_set.reminder_count(), 27);
    assert_eq!(service.store().calendar_count().unwrap(), 0);
}

fn projection(events: &[StoredEvent]) -> Vec<(String, String, i64, Vec<i32>)> {
    let mut rows = events
        .iter()
        .map(|event| {
            (
                event.sync_key.clone(),
                event.title.clone(),
                event.start_ms,
                event.reminders.clone(),
            )
        })
        .collect::<Vec<_>>();
    rows.sort();
    rows
}
