//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::net::TcpListener;
use std::time::Duration;

use roster_core::{create_router, AppState, Config, HttpStore, MemoryStore};

/// Helper to find an available port for testing.
pub fn find_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind to port")
        .local_addr()
        .expect("Failed to get local addr")
        .port()
}

/// Spawns the API on an ephemeral port and returns its base URL.
pub async fn spawn_test_server(state: AppState) -> (String, tokio::task::JoinHandle<()>) {
    let port = find_available_port();
    let addr = format!("127.0.0.1:{port}");

    let router = create_router(state);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind");

    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Server failed");
    });

    // Give the server a moment to start
    tokio::time::sleep(Duration::from_millis(50)).await;

    (format!("http://{addr}"), handle)
}

/// Spawns a server over `store` with the default config and returns a
/// client store pointed at it.
pub async fn spawn_with_store(store: MemoryStore) -> (HttpStore, tokio::task::JoinHandle<()>) {
    let (url, handle) = spawn_test_server(AppState::new(&Config::default(), store)).await;
    let client = HttpStore::new(url, Some(Duration::from_secs(10))).expect("Failed to build client");
    (client, handle)
}
