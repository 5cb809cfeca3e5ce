//! End-to-end tests driving the registration and management flows against a
//! running server.

mod common;

use chrono::Utc;
use roster_core::{
    FormField, HttpStore, ManagementFlow, MemoryStore, Notification, RandomAssigner,
    RegistrationFlow, RoundRobinAssigner, SubmitOutcome, ViewStatus,
};

use common::spawn_with_store;

fn fill(flow: &mut RegistrationFlow<HttpStore>, first_name: &str, course: &str) {
    flow.set_field(FormField::FirstName, first_name);
    flow.set_field(FormField::LastName, "Reyes");
    flow.set_field(FormField::Email, "reyes@example.com");
    flow.set_field(FormField::StudentId, "ST0100");
    flow.set_field(FormField::ContactNumber, "09990001111");
    flow.set_field(FormField::Course, course);
}

#[tokio::test]
async fn test_registered_student_appears_in_management_view() {
    let (store, _handle) = spawn_with_store(MemoryStore::seeded()).await;
    let catalog = store.fetch_catalog().await.expect("catalog failed");

    let mut registration = RegistrationFlow::new(
        store.clone(),
        catalog.clone(),
        Box::new(RandomAssigner::new()),
    );
    fill(&mut registration, "Ana", "bsis");
    let outcome = registration.submit(Utc::now()).await;
    let SubmitOutcome::Registered(record) = outcome else {
        panic!("registration failed: {outcome:?}");
    };
    assert!(catalog.sections_for("bsis").contains(&record.section));
    assert!(registration.form().is_blank());

    let mut management = ManagementFlow::new(store, catalog);
    management.load().await;
    assert_eq!(management.status(), ViewStatus::Loaded);
    management.set_query("bsis");
    let visible = management.visible();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0], &record);
}

#[tokio::test]
async fn test_round_robin_over_http() {
    let (store, _handle) = spawn_with_store(MemoryStore::new()).await;
    let catalog = store.fetch_catalog().await.expect("catalog failed");
    let mut flow = RegistrationFlow::new(store, catalog, Box::new(RoundRobinAssigner::new()));

    let mut sections = Vec::new();
    for name in ["Ana", "Ben", "Cara", "Dan", "Eve"] {
        fill(&mut flow, name, "bsit");
        match flow.submit(Utc::now()).await {
            SubmitOutcome::Registered(record) => sections.push(record.section),
            other => panic!("registration failed: {other:?}"),
        }
    }

    assert_eq!(
        sections,
        ["BSIT-1A", "BSIT-1B", "BSIT-2A", "BSIT-2B", "BSIT-1A"]
    );
}

#[tokio::test]
async fn test_edit_then_delete_reconciles_local_state() {
    let (store, _handle) = spawn_with_store(MemoryStore::seeded()).await;
    let catalog = store.fetch_catalog().await.expect("catalog failed");
    let mut flow = ManagementFlow::new(store.clone(), catalog.clone());
    flow.load().await;

    assert!(flow.begin_edit("3"));
    let session = flow.edit_session_mut().expect("editor open");
    session.set_course("bsce");
    session.set_field(FormField::Section, "BSCE-2A");
    let updated = flow.save_edit().await.expect("save failed");
    assert_eq!(updated.course, "bsce");
    assert_eq!(flow.records()[2], updated);

    flow.request_delete("1");
    assert!(flow.confirm_delete().await);

    let notes = flow.drain_notifications();
    assert_eq!(
        notes,
        [
            Notification::success("Student updated successfully"),
            Notification::success("Student deleted successfully"),
        ]
    );

    // A fresh view sees the same state as the local copy.
    let mut fresh = ManagementFlow::new(store, catalog);
    fresh.load().await;
    assert_eq!(fresh.records(), flow.records());
}

#[tokio::test]
async fn test_server_outage_surfaces_as_notifications() {
    let backing = MemoryStore::seeded();
    let (store, _handle) = spawn_with_store(backing.clone()).await;
    let catalog = store.fetch_catalog().await.expect("catalog failed");
    let mut flow = ManagementFlow::new(store, catalog);
    flow.load().await;

    backing.faults().fail_next(2);
    flow.refresh().await;
    assert_eq!(flow.status(), ViewStatus::Failed);
    assert_eq!(flow.records().len(), 3);

    flow.request_delete("2");
    assert!(!flow.confirm_delete().await);
    assert_eq!(flow.records().len(), 3);

    let notes = flow.drain_notifications();
    assert_eq!(
        notes,
        [
            Notification::error("Failed to load students"),
            Notification::error("Failed to delete student"),
        ]
    );
    assert_eq!(backing.len().await, 3);
}
