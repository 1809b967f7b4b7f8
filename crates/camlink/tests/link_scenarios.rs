//! End-to-end supervision scenarios
//!
//! These drive the acquisition and supervision layers with real short-lived
//! processes standing in for the external media pipelines.

use std::time::Duration;

use camlink::pipeline::LaunchCommand;
use camlink::runtime::{
    acquire_stream, AcquireError, Candidate, PoolState, RunOutcome, StreamSupervisor,
};
use camlink::stream::StreamRole;
use tokio::sync::watch;

const WARMUP: Duration = Duration::from_millis(300);
const POLL: Duration = Duration::from_millis(200);
const GRACE: Duration = Duration::from_secs(2);

fn failing(name: &str) -> Candidate {
    Candidate::new(
        name,
        LaunchCommand::new(name, "sh", vec!["-c".to_string(), "exit 1".to_string()]),
    )
}

fn surviving(name: &str) -> Candidate {
    Candidate::new(
        name,
        LaunchCommand::new(name, "sleep", vec!["30".to_string()]),
    )
}

#[tokio::test]
async fn test_hardware_fallback_still_fills_the_pool() {
    let mut supervisor = StreamSupervisor::new(POLL, GRACE);

    // camera1: hardware candidate dies during warm-up, software survives
    let process = acquire_stream(
        StreamRole::CameraOne,
        &[failing("hardware"), surviving("software")],
        WARMUP,
    )
    .await
    .unwrap();
    assert_eq!(process.label(), "software");
    supervisor.register(process).unwrap();

    // camera2: first candidate survives
    let process = acquire_stream(
        StreamRole::CameraTwo,
        &[surviving("hardware"), surviving("software")],
        WARMUP,
    )
    .await
    .unwrap();
    assert_eq!(process.label(), "hardware");
    supervisor.register(process).unwrap();

    // first monitoring sweep reports both streams running
    assert_eq!(supervisor.poll_once(), 2);
    assert_eq!(
        supervisor.roles(),
        vec![StreamRole::CameraOne, StreamRole::CameraTwo]
    );

    supervisor.shutdown().await;
    assert!(supervisor.is_empty());
}

#[tokio::test]
async fn test_one_stream_failing_does_not_abort_the_other() {
    let mut supervisor = StreamSupervisor::new(POLL, GRACE);

    let result = acquire_stream(
        StreamRole::CameraOne,
        &[failing("hardware"), failing("software")],
        WARMUP,
    )
    .await;
    match result {
        Err(AcquireError::AllCandidatesFailed { count, failures, .. }) => {
            assert_eq!(count, 2);
            assert_eq!(failures.len(), 2);
        }
        other => panic!("expected aggregate failure, got {:?}", other),
    }

    // the other logical stream proceeds regardless
    let process = acquire_stream(StreamRole::CameraTwo, &[surviving("software")], WARMUP)
        .await
        .unwrap();
    supervisor.register(process).unwrap();

    assert_eq!(supervisor.poll_once(), 1);
    supervisor.shutdown().await;
}

#[tokio::test]
async fn test_interrupt_shuts_both_streams_down() {
    let mut supervisor = StreamSupervisor::new(Duration::from_secs(30), GRACE);
    for role in StreamRole::ALL {
        let process = acquire_stream(role, &[surviving(role.label())], WARMUP)
            .await
            .unwrap();
        supervisor.register(process).unwrap();
    }
    assert_eq!(supervisor.len(), 2);

    let (shutdown_tx, shutdown_rx) = watch::channel(());
    shutdown_tx.send(()).unwrap();

    let outcome = supervisor.run(shutdown_rx).await;
    assert_eq!(outcome, RunOutcome::Interrupted);
    assert!(supervisor.is_empty());
    assert_eq!(supervisor.state(), PoolState::Terminated);
}

#[tokio::test]
async fn test_pool_exhaustion_ends_the_run() {
    let mut supervisor = StreamSupervisor::new(POLL, GRACE);
    for (role, secs) in [(StreamRole::CameraOne, "0.1"), (StreamRole::CameraTwo, "0.4")] {
        let candidate = Candidate::new(
            role.label(),
            LaunchCommand::new(role.label(), "sleep", vec![secs.to_string()]),
        );
        // warm-up shorter than the process lifetime so acquisition succeeds
        let process = acquire_stream(role, &[candidate], Duration::from_millis(50))
            .await
            .unwrap();
        supervisor.register(process).unwrap();
    }

    let (_shutdown_tx, shutdown_rx) = watch::channel(());
    let outcome = supervisor.run(shutdown_rx).await;
    assert_eq!(outcome, RunOutcome::Drained);
    assert!(supervisor.is_empty());
    assert_eq!(supervisor.state(), PoolState::Terminated);
}
