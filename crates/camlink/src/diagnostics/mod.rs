//! Pre-flight network and capability probes
//!
//! Every probe is stateless and advisory: results inform the operator and
//! the exit code of `camlink-diagnose`, but never block stream acquisition.

pub mod preflight;
pub mod probes;
pub mod report;

pub use preflight::*;
pub use probes::*;
pub use report::*;
