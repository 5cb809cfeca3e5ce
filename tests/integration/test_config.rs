//! Integration tests for `roster.json` loading and a server built from it.

mod common;

use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use roster_core::{
    AppState, Config, FormField, HttpStore, MemoryStore, RegistrationFlow, SectionStrategy,
    StudentStore, SubmitOutcome,
};

use common::spawn_test_server;

/// Path to the fixture directory.
fn fixture_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
}

fn load_fixture() -> Config {
    Config::load_from_dir(&fixture_dir()).expect("Failed to load fixture config")
}

#[test]
fn test_fixture_config_loads() {
    let config = load_fixture();

    assert_eq!(config.latency(), Duration::ZERO);
    assert!(!config.seed_demo_data);
    assert_eq!(config.section_strategy, SectionStrategy::RoundRobin);
    assert_eq!(config.request_timeout(), Some(Duration::from_secs(10)));

    let catalog = config.catalog();
    let ids: Vec<_> = catalog.courses().iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, ["bsit", "bsarch"]);
    assert!(catalog.sections_for("bsarch").is_empty());
}

#[tokio::test]
async fn test_server_uses_configured_catalog() {
    let config = load_fixture();
    let strategy = config.section_strategy;
    let timeout = config.request_timeout();
    let (url, _handle) = spawn_test_server(AppState::new(&config, MemoryStore::new())).await;
    let store = HttpStore::new(url, timeout).expect("Failed to build client");

    let catalog = store.fetch_catalog().await.expect("catalog failed");
    assert_eq!(catalog.courses().len(), 2);

    let mut flow = RegistrationFlow::new(store.clone(), catalog, strategy.build());
    flow.set_field(FormField::FirstName, "Lea");
    flow.set_field(FormField::LastName, "Cruz");
    flow.set_field(FormField::Email, "lea.cruz@example.com");
    flow.set_field(FormField::StudentId, "ST0777");
    flow.set_field(FormField::ContactNumber, "09175550000");

    // A course without sections never reaches the server.
    flow.select_course("bsarch");
    assert!(flow.section().is_none());
    assert!(matches!(
        flow.submit(Utc::now()).await,
        SubmitOutcome::NoSection
    ));
    assert!(store.list_records().await.expect("list failed").is_empty());

    flow.select_course("bsit");
    assert_eq!(flow.section(), Some("BSIT-1A"));
    let outcome = flow.submit(Utc::now()).await;
    assert!(matches!(outcome, SubmitOutcome::Registered(ref r) if r.section == "BSIT-1A"));
    assert_eq!(store.list_records().await.expect("list failed").len(), 1);
}
