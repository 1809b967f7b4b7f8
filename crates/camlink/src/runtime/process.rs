//! Managed external process abstraction

use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};

use crate::pipeline::LaunchCommand;
use crate::stream::StreamRole;

/// Upper bound on captured output lines kept per process
const CAPTURE_LIMIT: usize = 200;

/// Last-known liveness of a managed process
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Liveness {
    Running,
    /// The process exited successfully or was deliberately stopped
    ExitedCleanly(i32),
    /// The process died on its own; carries its captured output
    ExitedWithError {
        code: Option<i32>,
        diagnostic: String,
    },
}

impl Liveness {
    pub fn is_running(&self) -> bool {
        matches!(self, Liveness::Running)
    }
}

/// Bounded line buffer the output reader tasks append into
#[derive(Debug, Clone, Default)]
struct OutputCapture {
    lines: Arc<Mutex<Vec<String>>>,
}

impl OutputCapture {
    fn push(&self, line: String) {
        if let Ok(mut lines) = self.lines.lock() {
            if lines.len() < CAPTURE_LIMIT {
                lines.push(line);
            }
        }
    }

    fn snapshot(&self) -> String {
        match self.lines.lock() {
            Ok(lines) => lines.join("\n"),
            Err(_) => String::new(),
        }
    }

    fn spawn_reader(&self, stream: impl AsyncRead + Unpin + Send + 'static) {
        let capture = self.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stream).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                capture.push(line);
            }
        });
    }
}

/// One running external pipeline process
///
/// Owned by the launch path during the warm-up attempt, then by the pool
/// supervisor. Never cloned; the OS process is tied to this value through
/// `kill_on_drop`.
#[derive(Debug)]
pub struct ManagedProcess {
    pub role: StreamRole,
    label: String,
    child: Option<Child>,
    pid: Option<u32>,
    started_at: Instant,
    liveness: Liveness,
    capture: OutputCapture,
}

impl ManagedProcess {
    /// Spawn the command with both output streams captured in the background
    pub fn spawn(role: StreamRole, command: &LaunchCommand) -> std::io::Result<Self> {
        log::info!("[{}] starting: {}", command.label, command);

        let mut child = Command::new(&command.program)
            .args(&command.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let capture = OutputCapture::default();
        if let Some(stdout) = child.stdout.take() {
            capture.spawn_reader(stdout);
        }
        if let Some(stderr) = child.stderr.take() {
            capture.spawn_reader(stderr);
        }

        let pid = child.id();
        Ok(Self {
            role,
            label: command.label.clone(),
            child: Some(child),
            pid,
            started_at: Instant::now(),
            liveness: Liveness::Running,
            capture,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    pub fn liveness(&self) -> &Liveness {
        &self.liveness
    }

    /// Captured stdout/stderr so far
    pub fn captured_output(&self) -> String {
        self.capture.snapshot()
    }

    /// Non-blocking liveness poll; a status check, not a wait
    pub fn poll(&mut self) -> &Liveness {
        if let Some(child) = &mut self.child {
            match child.try_wait() {
                Ok(Some(status)) => {
                    let code = status.code();
                    self.child = None;
                    self.pid = None;
                    self.liveness = match code {
                        Some(0) => Liveness::ExitedCleanly(0),
                        code => Liveness::ExitedWithError {
                            code,
                            diagnostic: self.capture.snapshot(),
                        },
                    };
                }
                Ok(None) => {}
                Err(e) => {
                    log::error!("[{}] status check failed: {}", self.label, e);
                }
            }
        }
        &self.liveness
    }

    /// Request graceful termination, wait up to `grace`, then force-kill.
    ///
    /// Issues at most one terminate request and at most one kill per call;
    /// a no-op if the process has already exited.
    pub async fn stop(&mut self, grace: Duration) {
        let Some(mut child) = self.child.take() else {
            return;
        };
        log::info!("[{}] stopping", self.label);

        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            if let Some(pid) = self.pid {
                let _ = kill(Pid::from_raw(pid as i32), Signal::SIGTERM);
            }
        }

        #[cfg(not(unix))]
        {
            // No SIGTERM equivalent; kill immediately
            let _ = child.kill().await;
        }

        match tokio::time::timeout(grace, child.wait()).await {
            Ok(Ok(status)) => {
                let code = status.code().unwrap_or(0);
                log::info!("[{}] exited with code {}", self.label, code);
                self.liveness = Liveness::ExitedCleanly(code);
            }
            Ok(Err(e)) => {
                log::error!("[{}] error waiting for exit: {}", self.label, e);
                self.liveness = Liveness::ExitedCleanly(0);
            }
            Err(_) => {
                log::warn!(
                    "[{}] did not exit within {:?}, force killing",
                    self.label,
                    grace
                );
                if let Err(e) = child.kill().await {
                    log::error!("[{}] force kill failed: {}", self.label, e);
                }
                self.liveness = Liveness::ExitedCleanly(0);
            }
        }

        self.pid = None;
    }
}
