//! Integration tests for graceful shutdown of the HTTP server

use redcap_bridge::adapters::redcap::{InMemoryProject, RegistryProvider};
use redcap_bridge::config::BridgeConfig;
use redcap_bridge::domain::{BridgeError, FieldMetadata};
use redcap_bridge::server::{serve, AppState};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

fn state(port: u16) -> AppState {
    let mut config = BridgeConfig::default();
    config.server.host = "127.0.0.1".to_string();
    config.server.port = port;
    config.server.shutdown_timeout_secs = 1;

    let project = InMemoryProject::new(vec![FieldMetadata::new("record_id", "Record ID", "")]);
    AppState::new(config, RegistryProvider::fixed(Arc::new(project)))
}

#[tokio::test]
async fn test_shutdown_signal_stops_server() {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Port 0 lets the OS pick a free port
    let server = tokio::spawn(serve(state(0), shutdown_rx));

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!server.is_finished());

    shutdown_tx.send(true).unwrap();

    let result = tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server did not stop after the shutdown signal")
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_signal_before_start_stops_immediately() {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    shutdown_tx.send(true).unwrap();

    let result = tokio::time::timeout(Duration::from_secs(5), serve(state(0), shutdown_rx))
        .await
        .expect("server did not stop");
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_bind_failure_is_io_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let err = serve(state(port), shutdown_rx).await.unwrap_err();
    assert!(matches!(err, BridgeError::Io(_)));
}

#[tokio::test]
async fn test_shutdown_signal_propagation() {
    let (shutdown_tx, shutdown_rx1) = watch::channel(false);
    let shutdown_rx2 = shutdown_rx1.clone();

    assert!(!*shutdown_rx1.borrow());
    assert!(!*shutdown_rx2.borrow());

    shutdown_tx.send(true).unwrap();

    assert!(*shutdown_rx1.borrow());
    assert!(*shutdown_rx2.borrow());
}
