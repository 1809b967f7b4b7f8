//! Command-line interfaces for the camlink binaries

use argh::FromArgs;

use crate::config::{ConfigError, LinkConfig};

/// Receiving modes for camlink-sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiveMode {
    /// Show each stream in a local window
    Display,
    /// Write each stream to a timestamped MP4 file
    Record,
    /// Re-pay each stream toward a localhost relay port
    Forward,
}

impl ReceiveMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReceiveMode::Display => "display",
            ReceiveMode::Record => "record",
            ReceiveMode::Forward => "forward",
        }
    }
}

/// Parse a receiving mode name
fn parse_mode(s: &str) -> Result<ReceiveMode, String> {
    match s {
        "display" => Ok(ReceiveMode::Display),
        "record" => Ok(ReceiveMode::Record),
        "forward" => Ok(ReceiveMode::Forward),
        other => Err(format!(
            "unknown mode '{}', expected display, record, or forward",
            other
        )),
    }
}

/// Stream both cameras from the edge device to the receiving station
#[derive(FromArgs, Debug)]
pub struct SourceArgs {
    /// path to the link configuration file (YAML)
    #[argh(option, short = 'c')]
    pub config: Option<String>,

    /// receiving station address override
    #[argh(option)]
    pub station_ip: Option<String>,

    /// skip the advisory pre-flight diagnostics
    #[argh(switch)]
    pub skip_preflight: bool,

    /// log level (error, warn, info, debug, trace)
    #[argh(option, short = 'l', default = "String::from(\"info\")")]
    pub log_level: String,
}

/// Receive both camera streams and display, record, or forward them
#[derive(FromArgs, Debug)]
pub struct SinkArgs {
    /// receiving mode: display, record, or forward
    #[argh(option, short = 'm', default = "ReceiveMode::Display", from_str_fn(parse_mode))]
    pub mode: ReceiveMode,

    /// path to the link configuration file (YAML)
    #[argh(option, short = 'c')]
    pub config: Option<String>,

    /// edge device address override
    #[argh(option)]
    pub edge_ip: Option<String>,

    /// directory record-mode files are written to
    #[argh(option, default = "String::from(\".\")")]
    pub output_dir: String,

    /// skip the advisory pre-flight diagnostics
    #[argh(switch)]
    pub skip_preflight: bool,

    /// log level (error, warn, info, debug, trace)
    #[argh(option, short = 'l', default = "String::from(\"info\")")]
    pub log_level: String,
}

/// Network and capability diagnostics for the streaming link
#[derive(FromArgs, Debug)]
pub struct DiagnoseArgs {
    /// path to the link configuration file (YAML)
    #[argh(option, short = 'c')]
    pub config: Option<String>,

    /// edge device address override
    #[argh(option)]
    pub edge_ip: Option<String>,

    /// receiving station address override
    #[argh(option)]
    pub station_ip: Option<String>,

    /// skip the slow element availability sweep
    #[argh(switch)]
    pub quick: bool,

    /// log level (error, warn, info, debug, trace)
    #[argh(option, short = 'l', default = "String::from(\"info\")")]
    pub log_level: String,
}

/// Initialize logging from a CLI level string
pub fn init_logging(level: &str) {
    let level = match level.to_lowercase().as_str() {
        "error" => "error",
        "warn" => "warn",
        "info" => "info",
        "debug" => "debug",
        "trace" => "trace",
        _ => "info",
    };
    let env = env_logger::Env::default().default_filter_or(level);
    env_logger::init_from_env(env);
}

/// Load the link configuration, falling back to defaults when no file is
/// given
pub fn load_config(path: Option<&str>) -> Result<LinkConfig, ConfigError> {
    match path {
        Some(path) => LinkConfig::from_file(path),
        None => Ok(LinkConfig::default()),
    }
}
