//! Process launch with warm-up classification
//!
//! Surviving warm-up means the process is still alive, not that the
//! pipeline is actually producing frames. No stronger guarantee exists.

use std::time::Duration;

use super::process::{Liveness, ManagedProcess};
use crate::pipeline::LaunchCommand;
use crate::stream::StreamRole;

/// A launch attempt that did not survive warm-up. Local to one candidate;
/// the fallback layer decides what happens next.
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("process exited during warm-up with code {code:?}")]
    EarlyExit {
        code: Option<i32>,
        diagnostic: String,
    },
}

/// Start `command`, wait `warmup`, then classify the outcome with a single
/// liveness poll. On success the process keeps running and ownership passes
/// to the caller.
pub async fn launch(
    role: StreamRole,
    command: &LaunchCommand,
    warmup: Duration,
) -> Result<ManagedProcess, LaunchError> {
    let mut process = ManagedProcess::spawn(role, command).map_err(|e| LaunchError::Spawn {
        program: command.program.clone(),
        source: e,
    })?;

    // Plain fixed delay; not interruptible.
    tokio::time::sleep(warmup).await;

    match process.poll() {
        Liveness::Running => {
            log::info!(
                "[{}] survived warm-up (pid {:?})",
                process.label(),
                process.pid()
            );
            Ok(process)
        }
        Liveness::ExitedCleanly(code) => Err(LaunchError::EarlyExit {
            code: Some(*code),
            diagnostic: process.captured_output(),
        }),
        Liveness::ExitedWithError { code, diagnostic } => Err(LaunchError::EarlyExit {
            code: *code,
            diagnostic: diagnostic.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WARMUP: Duration = Duration::from_millis(300);

    #[tokio::test]
    async fn test_surviving_process_is_returned() {
        let command = LaunchCommand::new("t", "sleep", vec!["5".to_string()]);
        let mut process = launch(StreamRole::CameraOne, &command, WARMUP)
            .await
            .unwrap();
        assert!(process.liveness().is_running());
        process.stop(Duration::from_secs(2)).await;
    }

    #[tokio::test]
    async fn test_early_exit_is_reported_with_code() {
        let command = LaunchCommand::new(
            "t",
            "sh",
            vec!["-c".to_string(), "exit 7".to_string()],
        );
        let result = launch(StreamRole::CameraOne, &command, WARMUP).await;
        match result {
            Err(LaunchError::EarlyExit { code, .. }) => assert_eq!(code, Some(7)),
            other => panic!("expected early exit, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_early_exit_drains_diagnostics() {
        let command = LaunchCommand::new(
            "t",
            "sh",
            vec![
                "-c".to_string(),
                "echo could not link elements >&2; exit 1".to_string(),
            ],
        );
        match launch(StreamRole::CameraOne, &command, WARMUP).await {
            Err(LaunchError::EarlyExit { diagnostic, .. }) => {
                assert!(diagnostic.contains("could not link elements"));
            }
            other => panic!("expected early exit, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_program_is_a_spawn_error() {
        let command = LaunchCommand::new("t", "/nonexistent/gst-launch-9.9", vec![]);
        let result = launch(StreamRole::CameraOne, &command, WARMUP).await;
        assert!(matches!(result, Err(LaunchError::Spawn { .. })));
    }
}
