// tests/integration/session_test.rs

//! Integration tests for the RCON session against an in-process server
//! Tests: connect, authentication, correlation, timeouts, connection loss, close

use super::test_helpers::*;
use rconnect::core::RelayError;
use rconnect::core::ledger::ResponseLedger;
use rconnect::core::session::{RconSession, SessionState};
use std::sync::Arc;
use std::time::{Duration, Instant};

// ===== Connect / Authenticate =====

#[tokio::test]
async fn test_connect_and_authenticate() {
    init_tracing();
    let server = FakeRconServer::start(PASSWORD).await;
    let session = session_for(server.port(), PASSWORD, Arc::new(ResponseLedger::new(16)));

    assert_eq!(session.state(), SessionState::Disconnected);
    session.connect().await.unwrap();

    assert_eq!(session.state(), SessionState::Authenticated);
    assert!(session.is_connected());
    assert!(session.is_authenticated());
    assert_eq!(server.accepted(), 1);
}

#[tokio::test]
async fn test_wrong_password_fails_session() {
    init_tracing();
    let server = FakeRconServer::start(PASSWORD).await;
    let session = session_for(server.port(), "nope", Arc::new(ResponseLedger::new(16)));

    let err = session.connect().await.unwrap_err();
    assert!(matches!(err, RelayError::AuthenticationFailed), "got {err:?}");
    assert_eq!(session.state(), SessionState::Failed);
    assert!(!session.is_connected());
}

#[tokio::test]
async fn test_connect_to_dead_port_fails_session() {
    init_tracing();
    let port = unused_port().await;
    let session = session_for(port, PASSWORD, Arc::new(ResponseLedger::new(16)));

    let err = session.connect().await.unwrap_err();
    assert!(matches!(err, RelayError::ConnectFailed(_)), "got {err:?}");
    assert_eq!(session.state(), SessionState::Failed);
}

#[tokio::test]
async fn test_connect_is_noop_when_already_up() {
    init_tracing();
    let server = FakeRconServer::start(PASSWORD).await;
    let session = session_for(server.port(), PASSWORD, Arc::new(ResponseLedger::new(16)));

    session.connect().await.unwrap();
    session.connect().await.unwrap();

    assert_eq!(server.accepted(), 1);
    assert_eq!(session.state(), SessionState::Authenticated);
}

#[tokio::test]
async fn test_concurrent_connects_share_one_attempt() {
    init_tracing();
    let server = FakeRconServer::start(PASSWORD).await;
    let session = session_for(server.port(), PASSWORD, Arc::new(ResponseLedger::new(16)));

    let (a, b) = tokio::join!(session.connect(), session.connect());
    assert!(a.is_ok());
    assert!(b.is_ok());
    assert_eq!(server.accepted(), 1);
}

#[tokio::test]
async fn test_concurrent_connects_share_failed_attempt() {
    init_tracing();
    let server = FakeRconServer::start(PASSWORD).await;
    let session = session_for(server.port(), "nope", Arc::new(ResponseLedger::new(16)));

    let (a, b) = tokio::join!(session.connect(), session.connect());
    assert!(matches!(a, Err(RelayError::AuthenticationFailed)), "got {a:?}");
    assert!(matches!(b, Err(RelayError::AuthenticationFailed)), "got {b:?}");
    assert_eq!(server.accepted(), 1);
    assert_eq!(session.state(), SessionState::Failed);

    // A later call is a fresh attempt.
    assert!(session.connect().await.is_err());
    assert_eq!(server.accepted(), 2);
}

// ===== Commands =====

#[tokio::test]
async fn test_send_returns_correlated_response() {
    init_tracing();
    let server = FakeRconServer::start(PASSWORD).await;
    let session = session_for(server.port(), PASSWORD, Arc::new(ResponseLedger::new(16)));
    session.connect().await.unwrap();

    let packet = session.send("status").await.unwrap();
    assert_eq!(packet.body_text(), "echo: status");
    assert!(packet.id > 0);
}

#[tokio::test]
async fn test_send_before_connect_is_not_authenticated() {
    init_tracing();
    let server = FakeRconServer::start(PASSWORD).await;
    let session = session_for(server.port(), PASSWORD, Arc::new(ResponseLedger::new(16)));

    let err = session.send("status").await.unwrap_err();
    assert!(matches!(err, RelayError::NotAuthenticated), "got {err:?}");
    assert_eq!(server.accepted(), 0);
}

#[tokio::test]
async fn test_concurrent_commands_are_routed_by_id() {
    init_tracing();
    let server = FakeRconServer::start(PASSWORD).await;
    let session = session_for(server.port(), PASSWORD, Arc::new(ResponseLedger::new(16)));
    session.connect().await.unwrap();

    // The slow command is answered after the fast one; each caller must still
    // get its own response.
    let slow = {
        let session = session.clone();
        tokio::spawn(async move { session.send("slow 200").await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    let fast = session.send("players").await.unwrap();
    let slow = slow.await.unwrap().unwrap();

    assert_eq!(fast.body_text(), "echo: players");
    assert_eq!(slow.body_text(), "slept 200");
    assert_ne!(fast.id, slow.id);
}

#[tokio::test]
async fn test_many_parallel_commands() {
    init_tracing();
    let server = FakeRconServer::start(PASSWORD).await;
    let session = session_for(server.port(), PASSWORD, Arc::new(ResponseLedger::new(64)));
    session.connect().await.unwrap();

    let mut handles = Vec::new();
    for i in 0..20 {
        let session = session.clone();
        handles.push(tokio::spawn(async move {
            let packet = session.send(&format!("cmd {i}")).await.unwrap();
            (i, packet.body_text())
        }));
    }
    for handle in handles {
        let (i, body) = handle.await.unwrap();
        assert_eq!(body, format!("echo: cmd {i}"));
    }
}

#[tokio::test]
async fn test_unanswered_command_times_out() {
    init_tracing();
    let server = FakeRconServer::start(PASSWORD).await;
    let session = session_for(server.port(), PASSWORD, Arc::new(ResponseLedger::new(16)));
    session.connect().await.unwrap();

    let err = session.send("silent").await.unwrap_err();
    assert!(matches!(err, RelayError::ResponseTimeout), "got {err:?}");

    // A timeout does not take the session down.
    assert_eq!(session.state(), SessionState::Authenticated);
    let packet = session.send("after").await.unwrap();
    assert_eq!(packet.body_text(), "echo: after");
}

#[tokio::test]
async fn test_server_hangup_fails_pending_and_disconnects() {
    init_tracing();
    let server = FakeRconServer::start(PASSWORD).await;
    let session = session_for(server.port(), PASSWORD, Arc::new(ResponseLedger::new(16)));
    session.connect().await.unwrap();
    let mut state_rx = session.subscribe();

    let err = session.send("hangup").await.unwrap_err();
    assert!(
        matches!(err, RelayError::ConnectionClosed | RelayError::Io(_)),
        "got {err:?}"
    );

    wait_for_state(&mut state_rx, SessionState::Disconnected, Duration::from_secs(2)).await;
    let err = session.send("status").await.unwrap_err();
    assert!(matches!(err, RelayError::NotAuthenticated), "got {err:?}");
}

#[tokio::test]
async fn test_send_right_after_hangup_fails_fast() {
    init_tracing();
    let server = FakeRconServer::start(PASSWORD).await;
    let session = session_for(server.port(), PASSWORD, Arc::new(ResponseLedger::new(16)));
    session.connect().await.unwrap();

    session.send("hangup").await.unwrap_err();

    // The link may not be detached yet; the send must still fail at once
    // instead of waiting out the response timeout.
    let started = Instant::now();
    let err = session.send("status").await.unwrap_err();
    assert!(
        matches!(
            err,
            RelayError::ConnectionClosed | RelayError::NotAuthenticated | RelayError::Io(_)
        ),
        "got {err:?}"
    );
    assert!(started.elapsed() < Duration::from_millis(400));
}

#[tokio::test]
async fn test_cancelled_dispatch_leaves_nothing_pending() {
    init_tracing();
    let server = FakeRconServer::start(PASSWORD).await;
    let session = session_for(server.port(), PASSWORD, Arc::new(ResponseLedger::new(16)));
    session.connect().await.unwrap();

    let handles: Vec<_> = (0..5)
        .map(|_| {
            let session = session.clone();
            tokio::spawn(async move { session.send("silent").await })
        })
        .collect();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(session.pending_requests(), 5);

    for handle in handles {
        handle.abort();
        assert!(handle.await.unwrap_err().is_cancelled());
    }
    assert_eq!(session.pending_requests(), 0);
    assert_eq!(session.state(), SessionState::Authenticated);
}

#[tokio::test]
async fn test_timed_out_dispatch_leaves_nothing_pending() {
    init_tracing();
    let server = FakeRconServer::start(PASSWORD).await;
    let session = session_for(server.port(), PASSWORD, Arc::new(ResponseLedger::new(16)));
    session.connect().await.unwrap();

    session.send("silent").await.unwrap_err();
    assert_eq!(session.pending_requests(), 0);
}

// ===== Ledger =====

#[tokio::test]
async fn test_responses_are_recorded_in_ledger() {
    init_tracing();
    let server = FakeRconServer::start(PASSWORD).await;
    let ledger = Arc::new(ResponseLedger::new(16));
    let session = session_for(server.port(), PASSWORD, ledger.clone());
    session.connect().await.unwrap();

    let first = session.send("one").await.unwrap();
    let second = session.send("two").await.unwrap();

    assert!(ledger.contains(first.id));
    assert!(ledger.contains(second.id));
    assert_eq!(ledger.len(), 2);
}

// ===== Close =====

#[tokio::test]
async fn test_close_disconnects() {
    init_tracing();
    let server = FakeRconServer::start(PASSWORD).await;
    let session = session_for(server.port(), PASSWORD, Arc::new(ResponseLedger::new(16)));
    session.connect().await.unwrap();

    session.close().await;

    assert_eq!(session.state(), SessionState::Disconnected);
    let err = session.send("status").await.unwrap_err();
    assert!(matches!(err, RelayError::NotAuthenticated), "got {err:?}");
}

#[tokio::test]
async fn test_close_without_connection_is_noop() {
    init_tracing();
    let session = session_for(unused_port().await, PASSWORD, Arc::new(ResponseLedger::new(16)));
    session.close().await;
    assert_eq!(session.state(), SessionState::Disconnected);
}
