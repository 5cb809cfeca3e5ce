//! Integration tests for the HTTP API and the client store.
//!
//! Each test starts a real server on an ephemeral port and talks to it over
//! the network, either with raw `reqwest` calls or through `HttpStore`.

mod common;

use std::time::Duration;

use chrono::{TimeZone, Utc};
use roster_core::{
    AppState, Catalog, Config, ErrorResponse, HttpStore, MemoryStore, NewStudent, RosterError,
    StudentPatch, StudentRecord, StudentStore,
};
use serde_json::json;

use common::{spawn_test_server, spawn_with_store};

fn new_student(course: &str, section: &str) -> NewStudent {
    NewStudent {
        first_name: "Maria".to_string(),
        last_name: "Santos".to_string(),
        email: "maria@example.com".to_string(),
        student_id: "ST0042".to_string(),
        contact_number: "09171234567".to_string(),
        course: course.to_string(),
        section: section.to_string(),
        registration_date: Utc
            .with_ymd_and_hms(2024, 1, 10, 8, 30, 0)
            .single()
            .expect("valid date"),
    }
}

// ----------------------------------------------------------------------------
// Raw HTTP
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_health_endpoint() {
    let (url, _handle) =
        spawn_test_server(AppState::new(&Config::default(), MemoryStore::new())).await;

    let body = reqwest::get(format!("{url}/api/health"))
        .await
        .expect("request failed")
        .text()
        .await
        .expect("body");

    assert_eq!(body, "ok");
}

#[tokio::test]
async fn test_status_codes_over_the_wire() {
    let (url, _handle) =
        spawn_test_server(AppState::new(&Config::default(), MemoryStore::seeded())).await;
    let client = reqwest::Client::new();

    let created = client
        .post(format!("{url}/students"))
        .json(&new_student("bsit", "BSIT-2B"))
        .send()
        .await
        .expect("create failed");
    assert_eq!(created.status(), reqwest::StatusCode::CREATED);

    let rejected = client
        .post(format!("{url}/students"))
        .json(&new_student("bsit", "BSCS-1A"))
        .send()
        .await
        .expect("create failed");
    assert_eq!(rejected.status(), reqwest::StatusCode::UNPROCESSABLE_ENTITY);
    let error: ErrorResponse = rejected.json().await.expect("error body");
    assert_eq!(error.fields.expect("fields")[0].field, "section");

    let missing = client
        .patch(format!("{url}/students/nope"))
        .json(&json!({"firstName": "Ghost"}))
        .send()
        .await
        .expect("patch failed");
    assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);

    for _ in 0..2 {
        let deleted = client
            .delete(format!("{url}/students/nope"))
            .send()
            .await
            .expect("delete failed");
        assert_eq!(deleted.status(), reqwest::StatusCode::NO_CONTENT);
    }
}

// ----------------------------------------------------------------------------
// HttpStore contract
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_create_then_list_round_trip() {
    let (store, _handle) = spawn_with_store(MemoryStore::seeded()).await;
    let before = store.list_records().await.expect("list failed");

    let created = store
        .create_record(new_student("bscs", "BSCS-1B"))
        .await
        .expect("create failed");

    assert!(before.iter().all(|r| r.id != created.id));
    let after = store.list_records().await.expect("list failed");
    assert_eq!(after.len(), before.len() + 1);
    assert_eq!(after.iter().filter(|r| **r == created).count(), 1);
    assert_eq!(created.registration_date, new_student("bscs", "BSCS-1B").registration_date);
}

#[tokio::test]
async fn test_update_overlays_only_patched_fields() {
    let (store, _handle) = spawn_with_store(MemoryStore::seeded()).await;
    let original = store.list_records().await.expect("list failed")[0].clone();

    let patch = StudentPatch {
        course: Some("bscs".to_string()),
        section: Some("BSCS-1A".to_string()),
        ..StudentPatch::default()
    };
    let updated = store.update_record("1", patch).await.expect("update failed");

    let expected = StudentRecord {
        course: "bscs".to_string(),
        section: "BSCS-1A".to_string(),
        ..original
    };
    assert_eq!(updated, expected);
    assert_eq!(store.list_records().await.expect("list failed")[0], expected);
}

#[tokio::test]
async fn test_update_missing_maps_to_not_found() {
    let (store, _handle) = spawn_with_store(MemoryStore::seeded()).await;
    let before = store.list_records().await.expect("list failed");

    let err = store
        .update_record(
            "missing",
            StudentPatch {
                first_name: Some("Ghost".to_string()),
                ..StudentPatch::default()
            },
        )
        .await
        .expect_err("update should fail");

    assert!(matches!(err, RosterError::NotFound { ref id } if id == "missing"));
    assert_eq!(store.list_records().await.expect("list failed"), before);
}

#[tokio::test]
async fn test_invalid_create_maps_to_validation() {
    let (store, _handle) = spawn_with_store(MemoryStore::new()).await;
    let mut bad = new_student("bsit", "BSIT-1A");
    bad.email = "maria-at-example".to_string();

    let err = store.create_record(bad).await.expect_err("create should fail");

    let fields = err.field_errors().expect("validation error");
    assert_eq!(fields.len(), 1);
    assert_eq!(fields[0].field, "email");
    assert!(store.list_records().await.expect("list failed").is_empty());
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let (store, _handle) = spawn_with_store(MemoryStore::seeded()).await;

    store.delete_record("2").await.expect("delete failed");
    store.delete_record("2").await.expect("second delete failed");
    store.delete_record("never").await.expect("missing delete failed");

    let ids: Vec<_> = store
        .list_records()
        .await
        .expect("list failed")
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(ids, ["1", "3"]);
}

#[tokio::test]
async fn test_injected_failure_maps_to_transient() {
    let backing = MemoryStore::seeded();
    let (store, _handle) = spawn_with_store(backing.clone()).await;
    backing.faults().fail_next(1);

    let err = store.list_records().await.expect_err("list should fail");
    assert!(err.is_transient());

    // The next call goes through.
    assert_eq!(store.list_records().await.expect("list failed").len(), 3);
}

#[tokio::test]
async fn test_slow_server_times_out_as_transient() {
    let backing = MemoryStore::seeded().with_latency(Duration::from_millis(500));
    let (url, _handle) =
        spawn_test_server(AppState::new(&Config::default(), backing.clone())).await;
    let store =
        HttpStore::new(url, Some(Duration::from_millis(100))).expect("Failed to build client");

    let err = store.list_records().await.expect_err("list should time out");
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_unreachable_server_is_transient() {
    let port = common::find_available_port();
    let store = HttpStore::new(format!("http://127.0.0.1:{port}"), None)
        .expect("Failed to build client");

    let err = store.list_records().await.expect_err("nothing is listening");
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_fetch_catalog_matches_server() {
    let (store, _handle) = spawn_with_store(MemoryStore::new()).await;

    let catalog = store.fetch_catalog().await.expect("catalog failed");

    assert_eq!(catalog, Catalog::builtin());
}
