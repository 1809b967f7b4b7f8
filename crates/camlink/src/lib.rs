//! Camlink
//!
//! Supervision layer for a two-camera UDP/H.264 streaming link between an
//! edge device and a receiving station.
//!
//! # Overview
//!
//! Camlink does not move video itself. It builds parameterized descriptions
//! of external media pipelines, launches them as OS processes, and watches
//! over them:
//!
//! - [`pipeline`] constructs validated pipeline descriptions for each
//!   operating mode and serializes them to an external launcher invocation
//!   only at the process boundary
//! - [`runtime`] launches a pipeline process, classifies early-exit failure
//!   after a fixed warm-up, falls back from hardware to software encoding,
//!   and supervises the pool of running streams until it drains or an
//!   interrupt arrives
//! - [`diagnostics`] runs advisory pre-flight probes (reachability, ports,
//!   media elements, camera devices) that never block stream acquisition
//!
//! Three binaries wire these together: `camlink-source` on the edge device,
//! `camlink-sink` on the receiving station, and `camlink-diagnose` for
//! troubleshooting the link.

pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod pipeline;
pub mod runtime;
pub mod stream;

pub use config::{ConfigError, LinkConfig};
pub use pipeline::{
    build, EncoderSettings, LaunchCommand, ParamValue, PipelineError, PipelineMode,
    PipelineParams, PipelineSpec, Stage, StageKind,
};
pub use runtime::{
    acquire_stream, launch, AcquireError, Candidate, CandidateFailure, LaunchError, Liveness,
    ManagedProcess, PoolState, RunOutcome, StreamSupervisor, SupervisorError,
};
pub use stream::StreamRole;
