// tests/integration/reconnect_test.rs

//! Integration tests for the session supervisor's reconnect policy

use super::test_helpers::*;
use rconnect::config::ReconnectConfig;
use rconnect::core::ledger::ResponseLedger;
use rconnect::core::session::{RconSession, SessionManager, SessionState};
use rconnect::core::tasks::reconnect::SessionSupervisor;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

fn fast_policy(max_attempts: u32) -> ReconnectConfig {
    ReconnectConfig {
        enabled: true,
        initial_delay: Duration::from_millis(20),
        max_delay: Duration::from_millis(80),
        max_attempts,
    }
}

fn spawn_supervisor(
    session: Arc<SessionManager>,
    policy: ReconnectConfig,
) -> (broadcast::Sender<()>, JoinHandle<()>) {
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let handle = tokio::spawn(SessionSupervisor::new(session, policy).run(shutdown_rx));
    (shutdown_tx, handle)
}

/// Polls `condition` every 10ms until it holds, panicking after `timeout`.
async fn eventually(timeout: Duration, what: &str, mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + timeout;
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for {what}"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn test_initial_connect_is_made_by_supervisor() {
    init_tracing();
    let server = FakeRconServer::start(PASSWORD).await;
    let session = session_for(server.port(), PASSWORD, Arc::new(ResponseLedger::new(16)));
    let mut state_rx = session.subscribe();

    let (shutdown_tx, handle) = spawn_supervisor(session.clone(), fast_policy(3));
    wait_for_state(&mut state_rx, SessionState::Authenticated, Duration::from_secs(2)).await;

    shutdown_tx.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_reconnects_after_connection_drop() {
    init_tracing();
    let server = FakeRconServer::start(PASSWORD).await;
    let session = session_for(server.port(), PASSWORD, Arc::new(ResponseLedger::new(16)));
    let mut state_rx = session.subscribe();

    let (shutdown_tx, _handle) = spawn_supervisor(session.clone(), fast_policy(3));
    wait_for_state(&mut state_rx, SessionState::Authenticated, Duration::from_secs(2)).await;

    server.drop_connections();

    eventually(Duration::from_secs(3), "a second connection", || {
        server.accepted() >= 2 && session.is_authenticated()
    })
    .await;
    let packet = session.send("after reconnect").await.unwrap();
    assert_eq!(packet.body_text(), "echo: after reconnect");

    let _ = shutdown_tx.send(());
}

#[tokio::test]
async fn test_recovers_when_server_comes_up_later() {
    init_tracing();
    let port = unused_port().await;
    let session = session_for(port, PASSWORD, Arc::new(ResponseLedger::new(16)));

    let (shutdown_tx, _handle) = spawn_supervisor(session.clone(), fast_policy(0));
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!session.is_authenticated());

    let _server = FakeRconServer::start_on(port, PASSWORD).await;
    eventually(Duration::from_secs(3), "authentication", || {
        session.is_authenticated()
    })
    .await;

    let _ = shutdown_tx.send(());
}

#[tokio::test]
async fn test_gives_up_after_max_attempts() {
    init_tracing();
    let port = unused_port().await;
    let session = session_for(port, PASSWORD, Arc::new(ResponseLedger::new(16)));

    let (shutdown_tx, handle) = spawn_supervisor(session.clone(), fast_policy(3));

    // Three attempts with at most ~80ms of backoff plus jitter between them.
    tokio::time::sleep(Duration::from_millis(700)).await;
    assert_eq!(session.state(), SessionState::Failed);

    let server = FakeRconServer::start_on(port, PASSWORD).await;
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(server.accepted(), 0);
    assert_eq!(session.state(), SessionState::Failed);

    // Having given up, the supervisor still honors shutdown.
    shutdown_tx.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_disabled_reconnect_leaves_session_down() {
    init_tracing();
    let server = FakeRconServer::start(PASSWORD).await;
    let session = session_for(server.port(), PASSWORD, Arc::new(ResponseLedger::new(16)));
    let mut state_rx = session.subscribe();

    let policy = ReconnectConfig {
        enabled: false,
        ..fast_policy(3)
    };
    let (shutdown_tx, _handle) = spawn_supervisor(session.clone(), policy);
    wait_for_state(&mut state_rx, SessionState::Authenticated, Duration::from_secs(2)).await;

    server.drop_connections();
    wait_for_state(&mut state_rx, SessionState::Disconnected, Duration::from_secs(2)).await;

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(session.state(), SessionState::Disconnected);
    assert_eq!(server.accepted(), 1);

    let _ = shutdown_tx.send(());
}

#[tokio::test]
async fn test_shutdown_interrupts_backoff() {
    init_tracing();
    let session = session_for(unused_port().await, PASSWORD, Arc::new(ResponseLedger::new(16)));
    let policy = ReconnectConfig {
        enabled: true,
        initial_delay: Duration::from_secs(30),
        max_delay: Duration::from_secs(60),
        max_attempts: 0,
    };

    let (shutdown_tx, handle) = spawn_supervisor(session.clone(), policy);
    eventually(Duration::from_secs(2), "the initial attempt to fail", || {
        session.state() == SessionState::Failed
    })
    .await;

    shutdown_tx.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("supervisor did not stop during backoff")
        .unwrap();
}
