use occasion_core::db::open_db_in_memory;
use occasion_core::{
    CalendarStore, ContactEventRecord, EventCategory, InMemoryContactSource, SqliteCalendarStore,
    StoredEvent, SyncConfig, SyncMode, SyncService,
};
use rusqlite::Connection;
use std::collections::BTreeMap;

const YEAR: i32 = 2024;

fn birthday(link: &str, name: &str, raw: &str) -> ContactEventRecord {
    ContactEventRecord::new(format!("raw-{link}"), link, EventCategory::Birthday, raw)
        .with_display_name(name)
}

fn ids_by_key(events: &[StoredEvent]) -> BTreeMap<String, i64> {
    events
        .iter()
        .map(|event| (event.sync_key.clone(), event.id))
        .collect()
}

fn sync(
    conn: &mut Connection,
    records: Vec<ContactEventRecord>,
    mode: SyncMode,
) -> (occasion_core::SyncReport, Vec<StoredEvent>) {
    let mut service = SyncService::new(
        InMemoryContactSource::new(records),
        SqliteCalendarStore::new(conn),
        SyncConfig::default(),
    );
    let report = service.sync_for_year(mode, YEAR).unwrap();
    let events = service
        .store()
        .list_events(report.reconcile.calendar_id)
        .unwrap();
    (report, events)
}

#[test]
fn differential_sync_on_empty_calendar_inserts_everything() {
    let mut conn = open_db_in_memory().unwrap();
    let (report, events) = sync(
        &mut conn,
        vec![birthday("lk-ada", "Ada", "1990-04-05")],
        SyncMode::Differential,
    );

    assert_eq!(report.reconcile.mode, SyncMode::Differential);
    assert_eq!(report.reconcile.inserted, 9);
    assert_eq!(report.reconcile.deleted, 0);
    assert_eq!(report.reconcile.unchanged, 0);
    assert_eq!(events.len(), 9);
}

#[test]
fn unchanged_events_keep_their_ids() {
    let mut conn = open_db_in_memory().unwrap();
    let records = vec![
        birthday("lk-ada", "Ada", "1990-04-05"),
        birthday("lk-bob", "Bob", "--06-01"),
    ];
    let (_, before) = sync(&mut conn, records.clone(), SyncMode::Full);

    let (report, after) = sync(&mut conn, records, SyncMode::Differential);

    assert_eq!(report.reconcile.unchanged, 18);
    assert_eq!(report.reconcile.inserted, 0);
    assert_eq!(report.reconcile.deleted, 0);
    assert_eq!(report.reconcile.batches, 0);
    assert_eq!(ids_by_key(&before), ids_by_key(&after));
}

#[test]
fn removed_and_renamed_contacts_are_patched() {
    let mut conn = open_db_in_memory().unwrap();
    let (_, before) = sync(
        &mut conn,
        vec![
            birthday("lk-ada", "Ada", "1990-04-05"),
            birthday("lk-bob", "Bob", "--06-01"),
            birthday("lk-cara", "Cara", "1985-09-09"),
        ],
        SyncMode::Full,
    );

    let (report, after) = sync(
        &mut conn,
        vec![
            birthday("lk-ada", "Ada", "1990-04-05"),
            birthday("lk-cara", "Cara B", "1985-09-09"),
        ],
        SyncMode::Differential,
    );

    assert_eq!(report.reconcile.unchanged, 9);
    assert_eq!(report.reconcile.deleted, 18);
    assert_eq!(report.reconcile.inserted, 9);
    assert_eq!(after.len(), 18);
    assert!(after.iter().all(|event| !event.title.contains("Bob")));
    assert!(after
        .iter()
        .filter(|event| event.sync_key.starts_with("lk-cara"))
        .all(|event| event.title.contains("Cara B's birthday")));
    // Age 40 in 2025 is a jubilee.
    assert!(after
        .iter()
        .any(|event| event.title == "\u{2605} Cara B's birthday (40)"));

    let before_ids = ids_by_key(&before);
    for event in after.iter().filter(|event| event.sync_key.starts_with("lk-ada")) {
        assert_eq!(before_ids.get(&event.sync_key), Some(&event.id));
    }
}

#[test]
fn externally_edited_events_are_replaced() {
    let mut conn = open_db_in_memory().unwrap();
    let records = vec![birthday("lk-ada", "Ada", "1990-04-05")];
    let (_, before) = sync(&mut conn, records.clone(), SyncMode::Full);

    let edited = before[0].id;
    conn.execute(
        "UPDATE events SET title = 'edited by hand' WHERE id = ?1;",
        [edited],
    )
    .unwrap();

    let (report, after) = sync(&mut conn, records, SyncMode::Differential);
    assert_eq!(report.reconcile.deleted, 1);
    assert_eq!(report.reconcile.inserted, 1);
    assert_eq!(report.reconcile.unchanged, 8);
    assert!(after.iter().all(|event| event.title != "edited by hand"));
    assert!(after.iter().all(|event| event.id != edited));
}

#[test]
fn moving_to_the_next_year_shifts_the_window() {
    let mut conn = open_db_in_memory().unwrap();
    let records = vec![birthday("lk-bob", "Bob", "--06-01")];
    let (_, _) = sync(&mut conn, records.clone(), SyncMode::Full);

    let mut service = SyncService::new(
        InMemoryContactSource::new(records),
        SqliteCalendarStore::new(&mut conn),
        SyncConfig::default(),
    );
    let report = service
        .sync_for_year(SyncMode::Differential, YEAR + 1)
        .unwrap();

    // 2021 drops out, 2030 comes in.
    assert_eq!(report.reconcile.unchanged, 8);
    assert_eq!(report.reconcile.deleted, 1);
    assert_eq!(report.reconcile.inserted, 1);
}
