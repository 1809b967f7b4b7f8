//! Alternative-configuration fallback for stream acquisition
//!
//! Not a time-based retry: each candidate is attempted exactly once, in
//! order, and a failed candidate is never revisited.

use std::time::Duration;

use super::launcher::{launch, LaunchError};
use super::process::ManagedProcess;
use crate::pipeline::{LaunchCommand, PipelineSpec};
use crate::stream::StreamRole;

/// One alternative pipeline considered for a logical stream
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Short identifier, e.g. "hardware" or "software"
    pub name: String,
    pub command: LaunchCommand,
}

impl Candidate {
    pub fn new(name: impl Into<String>, command: LaunchCommand) -> Self {
        Self {
            name: name.into(),
            command,
        }
    }

    /// Serialize a spec at the launch boundary
    pub fn from_spec(name: impl Into<String>, spec: &PipelineSpec) -> Self {
        Self::new(name, spec.to_launch_command())
    }
}

/// Failure detail for one attempted candidate
#[derive(Debug)]
pub struct CandidateFailure {
    pub candidate: String,
    pub error: LaunchError,
}

/// Stream acquisition failure
#[derive(Debug, thiserror::Error)]
pub enum AcquireError {
    #[error("no candidates supplied for stream '{0}'")]
    NoCandidates(String),

    #[error("all {count} candidate(s) failed for stream '{role}'")]
    AllCandidatesFailed {
        role: String,
        count: usize,
        /// One entry per candidate, in attempt order
        failures: Vec<CandidateFailure>,
    },
}

/// Try `candidates` in order; the first process to survive warm-up wins and
/// later candidates are never attempted. Per-candidate failures are logged
/// and absorbed here; only total failure propagates.
pub async fn acquire_stream(
    role: StreamRole,
    candidates: &[Candidate],
    warmup: Duration,
) -> Result<ManagedProcess, AcquireError> {
    if candidates.is_empty() {
        return Err(AcquireError::NoCandidates(role.label().to_string()));
    }

    let mut failures = Vec::new();
    for candidate in candidates {
        log::info!("[{}] attempting '{}' pipeline", role, candidate.name);
        match launch(role, &candidate.command, warmup).await {
            Ok(process) => {
                log::info!("[{}] '{}' pipeline established", role, candidate.name);
                return Ok(process);
            }
            Err(error) => {
                log::warn!("[{}] '{}' pipeline failed: {}", role, candidate.name, error);
                if let LaunchError::EarlyExit { diagnostic, .. } = &error {
                    if !diagnostic.is_empty() {
                        log::debug!("[{}] '{}' output:\n{}", role, candidate.name, diagnostic);
                    }
                }
                failures.push(CandidateFailure {
                    candidate: candidate.name.clone(),
                    error,
                });
            }
        }
    }

    Err(AcquireError::AllCandidatesFailed {
        role: role.label().to_string(),
        count: failures.len(),
        failures,
    })
}
