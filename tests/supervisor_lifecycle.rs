mod common;

use std::time::Duration;

use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use common::{harness, harness_with, wait_registered, wait_status, StopMode};
use puppetvisor::{NewRun, RunError, RunStatus, RuntimeError, SupervisorConfig, STOPPED_MESSAGE};

#[tokio::test]
async fn concurrent_create_instantiates_once() {
    let h = harness(&["ade"]);
    h.store.set_latency(Some(Duration::from_millis(10)));

    let (a, b) = tokio::join!(h.sup.create("ade"), h.sup.create("ade"));
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_eq!(a.id, b.id);
    assert_eq!(h.provider.attempts(), 1);
    assert_eq!(h.store.run_count(), 1);
    assert_eq!(h.sup.list().await, vec!["ade"]);
}

#[tokio::test]
async fn create_while_registered_returns_current_run() {
    let h = harness(&["ade"]);
    let first = h.sup.create("ade").await.unwrap();
    assert_eq!(first.status, RunStatus::Init);
    assert_eq!(first.message, NewRun::INIT_MESSAGE);

    wait_status(&h.sup, "ade", RunStatus::Waiting).await;
    h.provider.session("ade").scan("https://qr.example/ade", 2);
    wait_status(&h.sup, "ade", RunStatus::Scanning).await;

    let again = h.sup.create("ade").await.unwrap();
    assert_eq!(again.id, first.id);
    assert_eq!(again.status, RunStatus::Scanning);
    assert_eq!(h.provider.attempts(), 1);
}

#[tokio::test]
async fn create_rejects_absent_or_disabled_bot() {
    let h = harness(&[]);
    h.store.add_bot("bob", false).unwrap();

    let err = h.sup.create("zed").await.unwrap_err();
    assert!(matches!(err, RunError::BotNotEnabled { .. }));
    let err = h.sup.create("bob").await.unwrap_err();
    assert_eq!(err.to_string(), "Bot(bob) does not exist or is not enabled");
    assert_eq!(err.status_code(), 503);

    assert_eq!(h.provider.attempts(), 0);
    assert_eq!(h.store.run_count(), 0);
}

#[tokio::test]
async fn ade_walks_from_disabled_to_login() {
    let h = harness(&[]);
    h.store.add_bot("ade", false).unwrap();
    assert!(matches!(
        h.sup.create("ade").await,
        Err(RunError::BotNotEnabled { .. })
    ));

    h.store.set_enabled("ade", true).unwrap();
    let run = h.sup.create("ade").await.unwrap();
    assert_eq!(run.status, RunStatus::Init);

    let waiting = wait_status(&h.sup, "ade", RunStatus::Waiting).await;
    assert_eq!(waiting.message, "Waiting for users to scan the code");

    let session = h.provider.session("ade");
    session.scan("https://qr.example/ade", 2);
    let scanning = wait_status(&h.sup, "ade", RunStatus::Scanning).await;
    assert_eq!(
        scanning.message,
        "Scan QR code is status(2) https://qr.example/ade"
    );
    assert_eq!(scanning.status.as_str(), "scaning");

    session.login("ade");
    let login = wait_status(&h.sup, "ade", RunStatus::Login).await;
    assert_eq!(login.message, "Bot(ade) login.");

    let statuses: Vec<RunStatus> = h.store.history("ade").into_iter().map(|(s, _)| s).collect();
    assert_eq!(
        statuses,
        vec![
            RunStatus::Init,
            RunStatus::Waiting,
            RunStatus::Scanning,
            RunStatus::Login
        ]
    );
}

#[tokio::test]
async fn stop_evicts_and_allows_recreate() {
    let h = harness(&["ade"]);
    h.sup.create("ade").await.unwrap();
    wait_status(&h.sup, "ade", RunStatus::Waiting).await;

    let snapshot = h.sup.cancel("ade").await.unwrap();
    assert_eq!(snapshot.status, RunStatus::Stopped);
    assert_eq!(snapshot.message, STOPPED_MESSAGE);

    let stopped = wait_status(&h.sup, "ade", RunStatus::Stopped).await;
    assert_eq!(stopped.message, "Bot stop.");
    wait_registered(&h.sup, "ade", false).await;

    h.sup.create("ade").await.unwrap();
    assert_eq!(h.provider.attempts(), 2);
    assert!(h.sup.is_registered("ade").await);
    assert_eq!(h.store.run_count(), 1);
}

#[tokio::test]
async fn logout_evicts_and_takes_session_offline() {
    let h = harness(&["ade"]);
    h.sup.create("ade").await.unwrap();
    wait_status(&h.sup, "ade", RunStatus::Waiting).await;

    let session = h.provider.session("ade");
    session.login("ade");
    wait_status(&h.sup, "ade", RunStatus::Login).await;
    assert!(h.sup.online("ade").await);

    session.logout("ade");
    let run = wait_status(&h.sup, "ade", RunStatus::Logout).await;
    assert_eq!(run.message, "Bot(ade) logout.");
    wait_registered(&h.sup, "ade", false).await;
    assert!(!h.sup.online("ade").await);
}

#[tokio::test]
async fn logged_out_session_can_log_in_again() {
    let h = harness(&["ade"]);
    let mut tail = h.sup.subscribe(Some("ade"), CancellationToken::new());
    h.sup.create("ade").await.unwrap();
    wait_status(&h.sup, "ade", RunStatus::Waiting).await;

    let session = h.provider.session("ade");
    session.login("ade");
    wait_status(&h.sup, "ade", RunStatus::Login).await;
    session.logout("ade");
    wait_status(&h.sup, "ade", RunStatus::Logout).await;
    wait_registered(&h.sup, "ade", false).await;

    session.scan("https://qr.example/again", 2);
    session.login("ade");
    let run = wait_status(&h.sup, "ade", RunStatus::Login).await;
    assert_eq!(run.message, "Bot(ade) login.");
    assert_eq!(h.provider.attempts(), 1);

    let mut lines = Vec::new();
    while lines.len() < 6 {
        let line = tokio::time::timeout(Duration::from_secs(1), tail.next())
            .await
            .expect("tail stalled")
            .expect("tail ended");
        lines.push(line);
    }
    assert!(lines[3].ends_with("[ade] ade logged out"), "{lines:?}");
    assert!(lines[4].contains("https://qr.example/again"), "{lines:?}");
    assert!(lines[5].ends_with("[ade] ade logged in"), "{lines:?}");
}

#[tokio::test]
async fn existing_run_restarts_after_bot_is_disabled() {
    let h = harness(&["ade"]);
    let first = h.sup.create("ade").await.unwrap();
    wait_status(&h.sup, "ade", RunStatus::Waiting).await;

    h.sup.cancel("ade").await.unwrap();
    wait_status(&h.sup, "ade", RunStatus::Stopped).await;
    wait_registered(&h.sup, "ade", false).await;

    h.store.set_enabled("ade", false).unwrap();
    let again = h.sup.create("ade").await.unwrap();
    assert_eq!(again.id, first.id);
    assert_eq!(again.status, RunStatus::Stopped);
    assert_eq!(h.provider.attempts(), 2);
    assert_eq!(h.store.run_count(), 1);
    wait_status(&h.sup, "ade", RunStatus::Waiting).await;
}

#[tokio::test]
async fn error_keeps_handle_and_marks_failed() {
    let h = harness(&["ade"]);
    h.sup.create("ade").await.unwrap();
    wait_status(&h.sup, "ade", RunStatus::Waiting).await;

    h.provider.session("ade").fail("socket closed");
    let run = wait_status(&h.sup, "ade", RunStatus::Failed).await;
    assert_eq!(run.message, "socket closed");
    assert!(h.sup.is_registered("ade").await);

    let again = h.sup.create("ade").await.unwrap();
    assert_eq!(again.status, RunStatus::Failed);
    assert_eq!(h.provider.attempts(), 1);
}

#[tokio::test]
async fn cancel_without_run_is_not_found() {
    let h = harness(&["ade"]);

    let err = h.sup.cancel("ade").await.unwrap_err();
    assert!(matches!(err, RunError::RunNotFound { .. }));
    assert_eq!(err.status_code(), 503);
    assert_eq!(err.to_string(), "Bot(ade) run object not found");
}

#[tokio::test]
async fn cancel_with_stop_error_reports_failed_snapshot() {
    let h = harness(&["ade"]);
    h.sup.create("ade").await.unwrap();
    wait_status(&h.sup, "ade", RunStatus::Waiting).await;

    h.provider.session("ade").set_stop_error("puppet busy");
    let snapshot = h.sup.cancel("ade").await.unwrap();
    assert_eq!(snapshot.status, RunStatus::Failed);
    assert_eq!(snapshot.message, "puppet busy");

    let row = h.sup.retrieve("ade", true).await.unwrap().unwrap();
    assert_eq!(row.status, RunStatus::Waiting);
    assert!(h.sup.is_registered("ade").await);
}

#[tokio::test]
async fn retrieve_honors_reject_flag() {
    let h = harness(&["ade"]);
    assert!(h.sup.retrieve("ade", false).await.unwrap().is_none());
    assert!(matches!(
        h.sup.retrieve("ade", true).await,
        Err(RunError::RunNotFound { .. })
    ));
}

#[tokio::test]
async fn online_is_false_without_handle() {
    let h = harness(&["ade"]);
    assert!(!h.sup.online("ade").await);

    h.sup.create("ade").await.unwrap();
    assert!(!h.sup.online("ade").await);
}

#[tokio::test]
async fn instantiation_failure_is_retryable() {
    let h = harness(&["ade"]);
    h.provider.fail_instantiate(true);

    let run = h.sup.create("ade").await.unwrap();
    assert_eq!(run.status, RunStatus::Init);
    assert!(!h.sup.is_registered("ade").await);

    h.provider.fail_instantiate(false);
    h.sup.create("ade").await.unwrap();
    assert!(h.sup.is_registered("ade").await);
    assert_eq!(h.provider.attempts(), 2);
    assert_eq!(h.store.run_count(), 1);
}

#[tokio::test]
async fn start_failure_evicts_handle() {
    let h = harness(&["ade"]);
    h.provider.fail_start(true);

    h.sup.create("ade").await.unwrap();
    wait_registered(&h.sup, "ade", false).await;

    h.provider.fail_start(false);
    h.sup.create("ade").await.unwrap();
    wait_status(&h.sup, "ade", RunStatus::Waiting).await;
    assert_eq!(h.provider.attempts(), 2);
}

#[tokio::test]
async fn status_write_failure_is_not_surfaced() {
    let h = harness(&["ade"]);
    h.store.fail_writes(true);

    h.sup.create("ade").await.unwrap();
    h.provider.session("ade").login("ade");
    assert!(h.sup.online("ade").await);

    tokio::time::sleep(Duration::from_millis(20)).await;
    let row = h.sup.retrieve("ade", true).await.unwrap().unwrap();
    assert_eq!(row.status, RunStatus::Init);
    assert!(h.sup.is_registered("ade").await);

    h.store.fail_writes(false);
    h.provider.session("ade").scan("https://qr.example/again", 1);
    wait_status(&h.sup, "ade", RunStatus::Scanning).await;
}

#[tokio::test]
async fn events_are_persisted_in_emission_order() {
    let h = harness(&["ade"]);
    h.store.set_latency(Some(Duration::from_millis(1)));
    h.sup.create("ade").await.unwrap();
    wait_status(&h.sup, "ade", RunStatus::Waiting).await;

    let session = h.provider.session("ade");
    for code in 0..10 {
        session.scan("https://qr.example/ade", code);
    }
    session.login("ade");
    wait_status(&h.sup, "ade", RunStatus::Login).await;

    let scans: Vec<String> = h
        .store
        .history("ade")
        .into_iter()
        .filter(|(s, _)| *s == RunStatus::Scanning)
        .map(|(_, m)| m)
        .collect();
    let expected: Vec<String> = (0..10)
        .map(|code| format!("Scan QR code is status({code}) https://qr.example/ade"))
        .collect();
    assert_eq!(scans, expected);
}

#[tokio::test]
async fn shutdown_stops_every_session() {
    let h = harness(&["ade", "bob"]);
    h.sup.create("ade").await.unwrap();
    h.sup.create("bob").await.unwrap();
    wait_status(&h.sup, "ade", RunStatus::Waiting).await;
    wait_status(&h.sup, "bob", RunStatus::Waiting).await;

    h.sup.shutdown().await.unwrap();

    assert!(h.sup.list().await.is_empty());
    for name in ["ade", "bob"] {
        let row = h.sup.retrieve(name, true).await.unwrap().unwrap();
        assert_eq!(row.status, RunStatus::Stopped);
    }
}

#[tokio::test]
async fn shutdown_reports_sessions_that_never_stop() {
    let cfg = SupervisorConfig {
        grace: Duration::from_millis(50),
        ..SupervisorConfig::default()
    };
    let h = harness_with(&["ade", "bob"], cfg);
    h.sup.create("bob").await.unwrap();
    h.provider.stop_mode(StopMode::Silent);
    h.sup.create("ade").await.unwrap();
    wait_status(&h.sup, "ade", RunStatus::Waiting).await;
    wait_status(&h.sup, "bob", RunStatus::Waiting).await;

    let err = h.sup.shutdown().await.unwrap_err();
    match err {
        RuntimeError::GraceExceeded { grace, stuck } => {
            assert_eq!(grace, Duration::from_millis(50));
            assert_eq!(stuck, vec!["ade"]);
        }
        other => panic!("unexpected error: {other}"),
    }
}
