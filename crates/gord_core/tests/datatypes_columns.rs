mod common;

use common::{open_test_db, Event, EventMeta};
use gord_core::{CrudRepository, Date, Json, JsonSlice, JsonType, SqliteRepository, Time, UpdateMap};
use serde_json::json;

fn sample_event() -> Event {
    Event {
        id: 0,
        day: Date::from_ymd(2024, 3, 15).unwrap(),
        starts_at: Time::from_hms(9, 30, 0).unwrap(),
        payload: Json(json!({ "room": "B2", "seats": 12 })),
        labels: JsonSlice(vec!["standup".to_string(), "daily".to_string()]),
        meta: JsonType::new(EventMeta {
            owner: "ops".to_string(),
            priority: 2,
        }),
    }
}

#[test]
fn structured_columns_roundtrip() {
    let conn = open_test_db();
    let repo = SqliteRepository::<Event>::new(&conn);

    let event = sample_event();
    let id = repo.create(&event).unwrap();

    let loaded = repo.find_by_id(&id).unwrap();
    assert_eq!(loaded, Event { id, ..event });
}

#[test]
fn structured_columns_use_text_storage_format() {
    let conn = open_test_db();
    let repo = SqliteRepository::<Event>::new(&conn);
    let id = repo.create(&sample_event()).unwrap();

    let (day, starts_at, labels): (String, String, String) = conn
        .query_row(
            "SELECT day, starts_at, labels FROM events WHERE id = ?1;",
            [id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .unwrap();

    assert_eq!(day, "2024-03-15");
    assert_eq!(starts_at, "09:30:00");
    assert_eq!(labels, r#"["standup","daily"]"#);
}

#[test]
fn updates_accepts_datatype_values() {
    let conn = open_test_db();
    let repo = SqliteRepository::<Event>::new(&conn);
    let event = sample_event();
    let id = repo.create(&event).unwrap();
    let stored = Event { id, ..event };

    let changes = UpdateMap::new()
        .with("day", Date::from_ymd(2024, 4, 1).unwrap())
        .with("starts_at", Time::from_hms(14, 0, 0).unwrap())
        .with("payload", Json(json!({ "room": "C1" })))
        .with("labels", JsonSlice(vec![json!("retro")]))
        .with("meta", JsonType::new(json!({ "owner": "dev", "priority": 1 })));
    assert_eq!(repo.updates(&stored, &changes).unwrap(), 1);

    let loaded = repo.find_by_id(&id).unwrap();
    assert_eq!(loaded.day, Date::from_ymd(2024, 4, 1).unwrap());
    assert_eq!(loaded.starts_at, Time::from_hms(14, 0, 0).unwrap());
    assert_eq!(loaded.payload, Json(json!({ "room": "C1" })));
    assert_eq!(loaded.labels, JsonSlice(vec!["retro".to_string()]));
    assert_eq!(
        loaded.meta.into_inner(),
        EventMeta {
            owner: "dev".to_string(),
            priority: 1,
        }
    );
}

#[test]
fn malformed_json_column_surfaces_as_database_error() {
    let conn = open_test_db();
    let repo = SqliteRepository::<Event>::new(&conn);
    let id = repo.create(&sample_event()).unwrap();

    conn.execute("UPDATE events SET payload = '{broken' WHERE id = ?1;", [id])
        .unwrap();

    assert!(repo.find_by_id(&id).is_err());
}
