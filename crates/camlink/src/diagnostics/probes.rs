//! Individual stateless probes
//!
//! Each probe is a one-shot check with no coordination with, or knowledge
//! of, any other probe.

use std::path::Path;
use std::time::Duration;
use tokio::net::{TcpStream, UdpSocket};
use tokio::process::Command;

use super::report::DiagnosticResult;
use crate::pipeline::LaunchCommand;
use crate::runtime::{launch, LaunchError};
use crate::stream::StreamRole;

const PROBE_TIMEOUT: Duration = Duration::from_secs(10);
const PING_TIMEOUT: Duration = Duration::from_secs(20);
const UDP_TEST_PAYLOAD: &[u8] = b"CAMLINK_STREAM_TEST_PACKET";

/// External elements every link deployment needs
pub const REQUIRED_ELEMENTS: [&str; 12] = [
    "v4l2src",
    "udpsrc",
    "udpsink",
    "rtph264pay",
    "rtph264depay",
    "h264parse",
    "jpegdec",
    "videoconvert",
    "omxh264enc",
    "x264enc",
    "avdec_h264",
    "autovideosink",
];

/// Best-effort reachability hint via a TCP connect to the peer's SSH port.
/// UDP transport does not require an established connection, so a refused
/// connect still passes with a warning detail.
pub async fn connectivity(host: &str) -> DiagnosticResult {
    let name = format!("connectivity {}", host);
    match tokio::time::timeout(Duration::from_secs(5), TcpStream::connect((host, 22))).await {
        Ok(Ok(_)) => DiagnosticResult::pass(name, "peer reachable"),
        Ok(Err(e)) => DiagnosticResult::pass(
            name,
            format!("direct TCP test failed ({}); UDP streaming may still work", e),
        ),
        Err(_) => DiagnosticResult::pass(
            name,
            "direct TCP test timed out; UDP streaming may still work",
        ),
    }
}

/// ICMP reachability via the system `ping`
pub async fn ping(host: &str) -> DiagnosticResult {
    let name = format!("ping {}", host);
    let output = tokio::time::timeout(
        PING_TIMEOUT,
        Command::new("ping").args(["-c", "3", "-W", "5", host]).output(),
    )
    .await;
    match output {
        Ok(Ok(output)) if output.status.success() => {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let detail = stdout
                .lines()
                .find(|line| line.contains("packet loss"))
                .map(|line| line.trim().to_string())
                .unwrap_or_else(|| "reachable".to_string());
            DiagnosticResult::pass(name, detail)
        }
        Ok(Ok(output)) => DiagnosticResult::fail(name, format!("ping exited with {}", output.status)),
        Ok(Err(e)) => DiagnosticResult::fail(name, format!("failed to run ping: {}", e)),
        Err(_) => DiagnosticResult::fail(name, "ping timed out"),
    }
}

/// TCP port reachability; informational for a UDP-only link
pub async fn tcp_connect(host: &str, port: u16) -> DiagnosticResult {
    let name = format!("tcp {}:{}", host, port);
    match tokio::time::timeout(PROBE_TIMEOUT, TcpStream::connect((host, port))).await {
        Ok(Ok(_)) => DiagnosticResult::pass(name, "port open"),
        Ok(Err(e)) => DiagnosticResult::fail(name, format!("closed or filtered ({})", e)),
        Err(_) => DiagnosticResult::fail(name, "connect timed out"),
    }
}

/// Loopback UDP round-trip through `port`
pub async fn udp_round_trip(port: u16) -> DiagnosticResult {
    let name = format!("udp round-trip :{}", port);
    match udp_round_trip_inner(port).await {
        Ok(detail) => DiagnosticResult::pass(name, detail),
        Err(detail) => DiagnosticResult::fail(name, detail),
    }
}

async fn udp_round_trip_inner(port: u16) -> Result<String, String> {
    let receiver = UdpSocket::bind(("0.0.0.0", port))
        .await
        .map_err(|e| format!("bind failed: {}", e))?;
    let sender = UdpSocket::bind(("0.0.0.0", 0))
        .await
        .map_err(|e| format!("sender bind failed: {}", e))?;
    sender
        .send_to(UDP_TEST_PAYLOAD, ("127.0.0.1", port))
        .await
        .map_err(|e| format!("send failed: {}", e))?;

    let mut buf = [0u8; 64];
    let (received, addr) = tokio::time::timeout(PROBE_TIMEOUT, receiver.recv_from(&mut buf))
        .await
        .map_err(|_| "receive timed out".to_string())?
        .map_err(|e| format!("receive failed: {}", e))?;

    if &buf[..received] == UDP_TEST_PAYLOAD {
        Ok(format!("{} bytes echoed from {}", received, addr))
    } else {
        Err(format!("received {} bytes but content differs", received))
    }
}

/// Whether `port` can currently be bound for UDP
pub async fn udp_port_available(port: u16) -> DiagnosticResult {
    let name = format!("udp port :{}", port);
    match UdpSocket::bind(("0.0.0.0", port)).await {
        Ok(_) => DiagnosticResult::pass(name, "available"),
        Err(e) => DiagnosticResult::fail(name, format!("not available: {}", e)),
    }
}

/// Non-loopback addresses from `ip addr show`, noting whether the expected
/// address is configured
pub async fn network_interfaces(expected_ip: &str) -> DiagnosticResult {
    let name = "network interfaces";
    let output = Command::new("ip").args(["addr", "show"]).output().await;
    match output {
        Ok(output) if output.status.success() => {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let addresses: Vec<String> = stdout
                .lines()
                .filter(|line| line.contains("inet ") && !line.contains("127.0.0.1"))
                .map(|line| line.trim().to_string())
                .collect();
            let detail = if stdout.contains(expected_ip) {
                format!("{} configured; {} address(es)", expected_ip, addresses.len())
            } else {
                format!(
                    "{} not found in interface configuration; {} address(es)",
                    expected_ip,
                    addresses.len()
                )
            };
            DiagnosticResult::pass(name, detail)
        }
        Ok(output) => DiagnosticResult::fail(name, format!("ip addr exited with {}", output.status)),
        Err(e) => DiagnosticResult::fail(name, format!("failed to run ip: {}", e)),
    }
}

/// Availability of every required media element
pub async fn media_elements() -> DiagnosticResult {
    let name = "media elements";
    let mut missing = Vec::new();
    for element in REQUIRED_ELEMENTS {
        let available = matches!(
            tokio::time::timeout(
                PROBE_TIMEOUT,
                Command::new("gst-inspect-1.0").arg(element).output(),
            )
            .await,
            Ok(Ok(output)) if output.status.success()
        );
        if !available {
            missing.push(element);
        }
    }
    if missing.is_empty() {
        DiagnosticResult::pass(name, format!("all {} elements available", REQUIRED_ELEMENTS.len()))
    } else {
        DiagnosticResult::fail(
            name,
            format!(
                "{} of {} missing: {}",
                missing.len(),
                REQUIRED_ELEMENTS.len(),
                missing.join(", ")
            ),
        )
    }
}

/// Camera device presence and basic format access
pub async fn camera_device(device: &str) -> DiagnosticResult {
    let name = format!("camera {}", device);
    if !Path::new(device).exists() {
        return DiagnosticResult::fail(name, "device does not exist");
    }
    let output = tokio::time::timeout(
        PROBE_TIMEOUT,
        Command::new("v4l2-ctl")
            .args(["--device", device, "--get-fmt-video"])
            .output(),
    )
    .await;
    match output {
        Ok(Ok(output)) if output.status.success() => DiagnosticResult::pass(name, "accessible"),
        Ok(Ok(output)) => DiagnosticResult::fail(
            name,
            format!(
                "not accessible: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        ),
        Ok(Err(e)) => DiagnosticResult::fail(name, format!("failed to run v4l2-ctl: {}", e)),
        Err(_) => DiagnosticResult::fail(name, "v4l2-ctl timed out"),
    }
}

/// Bandwidth guidance; automated measurement needs an iperf3 server peer,
/// so this only reports tooling presence
pub async fn bandwidth_advisory() -> DiagnosticResult {
    let name = "bandwidth";
    let iperf = Command::new("which").arg("iperf3").output().await;
    let tooling = matches!(iperf, Ok(output) if output.status.success());
    let detail = if tooling {
        "iperf3 available (server setup required); ~2-4 Mbps needed for dual streams"
    } else {
        "iperf3 not available; ~2-4 Mbps needed for dual streams"
    };
    DiagnosticResult::pass(name, detail)
}

/// Launch a short-lived pipeline and report whether it survives warm-up
pub async fn pipeline_smoke(
    role: StreamRole,
    command: &LaunchCommand,
    warmup: Duration,
) -> DiagnosticResult {
    let name = format!("pipeline {}", command.label);
    match launch(role, command, warmup).await {
        Ok(mut process) => {
            process.stop(Duration::from_secs(5)).await;
            DiagnosticResult::pass(name, format!("ran for {:?}", warmup))
        }
        Err(LaunchError::EarlyExit { code, diagnostic }) => {
            if !diagnostic.is_empty() {
                log::debug!("[{}] smoke-test output:\n{}", command.label, diagnostic);
            }
            DiagnosticResult::fail(name, format!("exited during warm-up (code {:?})", code))
        }
        Err(e) => DiagnosticResult::fail(name, e.to_string()),
    }
}
