//! Pool supervision loop
//!
//! Owns every stream process after acquisition. A single flow of control
//! mutates the pool; concurrency exists only in the supervised OS processes
//! themselves.

use indexmap::IndexMap;
use std::time::Duration;
use tokio::sync::watch;

use super::process::{Liveness, ManagedProcess};
use crate::stream::StreamRole;

/// Pool lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolState {
    /// No process has been registered yet
    Empty,
    /// At least one process is (believed) running
    Populated,
    /// Liveness polling drained the pool; total failure
    Draining,
    /// Shutdown ran; the pool is cleared for good
    Terminated,
}

/// Why the supervision loop returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every supervised process exited on its own
    Drained,
    /// An interrupt requested shutdown
    Interrupted,
}

#[derive(Debug, thiserror::Error)]
pub enum SupervisorError {
    #[error("stream '{0}' already has a supervised process")]
    RoleOccupied(&'static str),
}

/// Supervises the pool of running stream processes
pub struct StreamSupervisor {
    pool: IndexMap<StreamRole, ManagedProcess>,
    poll_interval: Duration,
    grace_period: Duration,
    state: PoolState,
}

impl StreamSupervisor {
    pub fn new(poll_interval: Duration, grace_period: Duration) -> Self {
        Self {
            pool: IndexMap::new(),
            poll_interval,
            grace_period,
            state: PoolState::Empty,
        }
    }

    /// Take ownership of a launched process. At most one process per role.
    pub fn register(&mut self, process: ManagedProcess) -> Result<(), SupervisorError> {
        let role = process.role;
        if self.pool.contains_key(&role) {
            return Err(SupervisorError::RoleOccupied(role.label()));
        }
        log::info!(
            "[{}] registered '{}' (pid {:?})",
            role,
            process.label(),
            process.pid()
        );
        self.pool.insert(role, process);
        self.state = PoolState::Populated;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    pub fn state(&self) -> PoolState {
        self.state
    }

    /// Roles currently supervised, in registration order
    pub fn roles(&self) -> Vec<StreamRole> {
        self.pool.keys().copied().collect()
    }

    /// One monitoring sweep: poll every entry, evict and log the dead.
    /// Returns the number of processes still running.
    pub fn poll_once(&mut self) -> usize {
        let mut dead = Vec::new();
        for (role, process) in self.pool.iter_mut() {
            match process.poll().clone() {
                Liveness::Running => {}
                Liveness::ExitedCleanly(code) => {
                    log::error!(
                        "[{}] '{}' exited unexpectedly (code {})",
                        role,
                        process.label(),
                        code
                    );
                    dead.push(*role);
                }
                Liveness::ExitedWithError { code, diagnostic } => {
                    log::error!(
                        "[{}] '{}' exited unexpectedly (code {:?})",
                        role,
                        process.label(),
                        code
                    );
                    if !diagnostic.is_empty() {
                        log::error!("[{}] output:\n{}", role, diagnostic);
                    }
                    dead.push(*role);
                }
            }
        }
        for role in dead {
            self.pool.shift_remove(&role);
        }
        if self.pool.is_empty() && self.state == PoolState::Populated {
            self.state = PoolState::Draining;
        }
        self.pool.len()
    }

    /// Supervise until the pool drains or an interrupt arrives. Every exit
    /// path runs [`StreamSupervisor::shutdown`] before returning.
    pub async fn run(&mut self, mut shutdown_rx: watch::Receiver<()>) -> RunOutcome {
        let outcome = loop {
            let live = self.poll_once();
            if live == 0 {
                log::error!("all streams stopped");
                break RunOutcome::Drained;
            }
            log::info!("status: {} stream(s) running", live);

            tokio::select! {
                _ = shutdown_rx.changed() => {
                    log::info!("shutdown requested");
                    break RunOutcome::Interrupted;
                }
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        };

        self.shutdown().await;
        outcome
    }

    /// Terminate every remaining process (graceful, then forced after the
    /// grace period) and clear the pool. Idempotent; runs at most once.
    pub async fn shutdown(&mut self) {
        if self.state == PoolState::Terminated {
            return;
        }
        if !self.pool.is_empty() {
            log::info!("stopping {} supervised process(es)", self.pool.len());
        }
        for (_, process) in self.pool.iter_mut() {
            process.stop(self.grace_period).await;
        }
        self.pool.clear();
        self.state = PoolState::Terminated;
        log::info!("supervision pool cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::LaunchCommand;

    const POLL: Duration = Duration::from_millis(200);
    const GRACE: Duration = Duration::from_secs(2);

    fn spawn(role: StreamRole, script: &str) -> ManagedProcess {
        let command = LaunchCommand::new(
            role.label(),
            "sh",
            vec!["-c".to_string(), script.to_string()],
        );
        ManagedProcess::spawn(role, &command).unwrap()
    }

    #[tokio::test]
    async fn test_register_enforces_one_process_per_role() {
        let mut supervisor = StreamSupervisor::new(POLL, GRACE);
        supervisor
            .register(spawn(StreamRole::CameraOne, "sleep 30"))
            .unwrap();
        let result = supervisor.register(spawn(StreamRole::CameraOne, "sleep 30"));
        assert!(matches!(result, Err(SupervisorError::RoleOccupied(_))));
        assert_eq!(supervisor.len(), 1);
        supervisor.shutdown().await;
    }

    #[tokio::test]
    async fn test_single_exit_leaves_one_live_entry() {
        let mut supervisor = StreamSupervisor::new(POLL, GRACE);
        supervisor
            .register(spawn(StreamRole::CameraOne, "exit 1"))
            .unwrap();
        supervisor
            .register(spawn(StreamRole::CameraTwo, "sleep 30"))
            .unwrap();
        assert_eq!(supervisor.state(), PoolState::Populated);

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(supervisor.poll_once(), 1);
        assert_eq!(supervisor.roles(), vec![StreamRole::CameraTwo]);
        assert_eq!(supervisor.state(), PoolState::Populated);
        supervisor.shutdown().await;
    }

    #[tokio::test]
    async fn test_full_drain_signals_once() {
        let mut supervisor = StreamSupervisor::new(POLL, GRACE);
        supervisor
            .register(spawn(StreamRole::CameraOne, "exit 1"))
            .unwrap();
        supervisor
            .register(spawn(StreamRole::CameraTwo, "exit 2"))
            .unwrap();

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(supervisor.poll_once(), 0);
        assert_eq!(supervisor.state(), PoolState::Draining);
        // a second sweep of the empty pool does not re-signal
        assert_eq!(supervisor.poll_once(), 0);
        assert_eq!(supervisor.state(), PoolState::Draining);
        supervisor.shutdown().await;
        assert_eq!(supervisor.state(), PoolState::Terminated);
    }

    #[tokio::test]
    async fn test_run_returns_drained_when_all_exit() {
        let mut supervisor = StreamSupervisor::new(POLL, GRACE);
        supervisor
            .register(spawn(StreamRole::CameraOne, "sleep 0.1"))
            .unwrap();
        let (_tx, rx) = watch::channel(());
        let outcome = supervisor.run(rx).await;
        assert_eq!(outcome, RunOutcome::Drained);
        assert!(supervisor.is_empty());
        assert_eq!(supervisor.state(), PoolState::Terminated);
    }

    #[tokio::test]
    async fn test_run_observes_interrupt_and_shuts_down() {
        let mut supervisor = StreamSupervisor::new(Duration::from_secs(30), GRACE);
        supervisor
            .register(spawn(StreamRole::CameraOne, "sleep 30"))
            .unwrap();
        supervisor
            .register(spawn(StreamRole::CameraTwo, "sleep 30"))
            .unwrap();

        let (tx, rx) = watch::channel(());
        tx.send(()).unwrap();
        let outcome = supervisor.run(rx).await;
        assert_eq!(outcome, RunOutcome::Interrupted);
        assert!(supervisor.is_empty());
        assert_eq!(supervisor.state(), PoolState::Terminated);
    }

    #[tokio::test]
    async fn test_shutdown_on_empty_pool_is_harmless() {
        let mut supervisor = StreamSupervisor::new(POLL, GRACE);
        supervisor.shutdown().await;
        assert_eq!(supervisor.state(), PoolState::Terminated);
        assert!(supervisor.is_empty());
    }
}
