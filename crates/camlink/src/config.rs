//! Link configuration

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Configuration for one streaming link between the edge device and the
/// receiving station. Every field has a default matching the reference
/// deployment, so an empty file (or no file at all) yields a working setup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkConfig {
    /// Address of the receiving station
    #[serde(default = "default_station_ip")]
    pub station_ip: String,

    /// Address of the edge device
    #[serde(default = "default_edge_ip")]
    pub edge_ip: String,

    /// Capture device for the first camera
    #[serde(default = "default_camera_one_device")]
    pub camera_one_device: String,

    /// Capture device for the second camera
    #[serde(default = "default_camera_two_device")]
    pub camera_two_device: String,

    /// UDP rendezvous port for the first camera stream
    #[serde(default = "default_camera_one_port")]
    pub camera_one_port: u16,

    /// UDP rendezvous port for the second camera stream
    #[serde(default = "default_camera_two_port")]
    pub camera_two_port: u16,

    /// Local relay port for the first stream in forward mode
    #[serde(default = "default_relay_one_port")]
    pub relay_one_port: u16,

    /// Local relay port for the second stream in forward mode
    #[serde(default = "default_relay_two_port")]
    pub relay_two_port: u16,

    /// Frame width in pixels
    #[serde(default = "default_width")]
    pub width: u32,

    /// Frame height in pixels
    #[serde(default = "default_height")]
    pub height: u32,

    /// Capture framerate in frames per second
    #[serde(default = "default_framerate")]
    pub framerate: u32,

    /// Seconds to wait after launching a pipeline before checking it is
    /// still alive
    #[serde(default = "default_warmup_secs")]
    pub warmup_secs: u64,

    /// Seconds between liveness sweeps of the supervised pool
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Seconds a process gets to exit after a terminate request before it
    /// is killed
    #[serde(default = "default_grace_period_secs")]
    pub grace_period_secs: u64,
}

fn default_station_ip() -> String {
    "192.168.1.10".to_string()
}

fn default_edge_ip() -> String {
    "192.168.1.100".to_string()
}

fn default_camera_one_device() -> String {
    "/dev/video0".to_string()
}

fn default_camera_two_device() -> String {
    "/dev/video2".to_string()
}

fn default_camera_one_port() -> u16 {
    5000
}

fn default_camera_two_port() -> u16 {
    5001
}

fn default_relay_one_port() -> u16 {
    8554
}

fn default_relay_two_port() -> u16 {
    8555
}

fn default_width() -> u32 {
    640
}

fn default_height() -> u32 {
    480
}

fn default_framerate() -> u32 {
    15
}

fn default_warmup_secs() -> u64 {
    2
}

fn default_poll_interval_secs() -> u64 {
    30
}

fn default_grace_period_secs() -> u64 {
    5
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            station_ip: default_station_ip(),
            edge_ip: default_edge_ip(),
            camera_one_device: default_camera_one_device(),
            camera_two_device: default_camera_two_device(),
            camera_one_port: default_camera_one_port(),
            camera_two_port: default_camera_two_port(),
            relay_one_port: default_relay_one_port(),
            relay_two_port: default_relay_two_port(),
            width: default_width(),
            height: default_height(),
            framerate: default_framerate(),
            warmup_secs: default_warmup_secs(),
            poll_interval_secs: default_poll_interval_secs(),
            grace_period_secs: default_grace_period_secs(),
        }
    }
}

impl LinkConfig {
    /// Load configuration from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Warm-up interval after launching a pipeline process
    pub fn warmup(&self) -> Duration {
        Duration::from_secs(self.warmup_secs)
    }

    /// Interval between supervision sweeps
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Grace period between terminate and kill
    pub fn grace_period(&self) -> Duration {
        Duration::from_secs(self.grace_period_secs)
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
}
