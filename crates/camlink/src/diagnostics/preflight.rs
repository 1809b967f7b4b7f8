//! Pre-flight batteries for each side of the link
//!
//! These aggregate the individual probes into the checks each binary runs
//! before acquiring streams. All of it is advisory: acquisition proceeds
//! regardless of the outcome.

use super::probes;
use super::report::{DiagnosticReport, DiagnosticResult};
use crate::config::LinkConfig;
use crate::pipeline::{build, PipelineMode, PipelineParams};
use crate::stream::StreamRole;

/// Edge-side checks: station reachability, camera devices, and a short
/// capture-to-discard run per camera
pub async fn source_preflight(config: &LinkConfig) -> DiagnosticReport {
    log::info!("running pre-flight diagnostics");
    let mut report = DiagnosticReport::default();

    report.record(probes::connectivity(&config.station_ip).await);

    for role in StreamRole::ALL {
        report.record(probes::camera_device(role.device(config)).await);
    }

    for role in StreamRole::ALL {
        let params = PipelineParams::from_config(config).with_device(role.device(config));
        match build(PipelineMode::CaptureTest, role, &params) {
            Ok(spec) => {
                let command = spec.to_launch_command();
                report.record(probes::pipeline_smoke(role, &command, config.warmup()).await);
            }
            Err(e) => {
                report.record(DiagnosticResult::fail(
                    format!("pipeline {}/capture-test", role),
                    e.to_string(),
                ));
            }
        }
    }

    report.log_summary();
    report
}

/// Station-side checks: edge reachability, port availability, and a short
/// listen-to-discard run per stream port
pub async fn sink_preflight(config: &LinkConfig, include_relay_ports: bool) -> DiagnosticReport {
    log::info!("running pre-flight diagnostics");
    let mut report = DiagnosticReport::default();

    report.record(probes::connectivity(&config.edge_ip).await);

    for role in StreamRole::ALL {
        report.record(probes::udp_port_available(role.stream_port(config)).await);
    }
    if include_relay_ports {
        for role in StreamRole::ALL {
            report.record(probes::udp_port_available(role.relay_port(config)).await);
        }
    }

    for role in StreamRole::ALL {
        let params =
            PipelineParams::from_config(config).with_listen_port(role.stream_port(config));
        match build(PipelineMode::ListenTest, role, &params) {
            Ok(spec) => {
                let command = spec.to_launch_command();
                report.record(probes::pipeline_smoke(role, &command, config.warmup()).await);
            }
            Err(e) => {
                report.record(DiagnosticResult::fail(
                    format!("pipeline {}/listen-test", role),
                    e.to_string(),
                ));
            }
        }
    }

    report.log_summary();
    report
}

/// The full battery run by `camlink-diagnose`. With `quick` the slow
/// element-availability sweep is skipped.
pub async fn full_battery(config: &LinkConfig, quick: bool) -> DiagnosticReport {
    log::info!("running comprehensive link diagnostics");
    let mut report = DiagnosticReport::default();

    report.record(probes::network_interfaces(&config.station_ip).await);
    report.record(probes::ping(&config.edge_ip).await);
    report.record(probes::ping(&config.station_ip).await);

    // informational only: a UDP link does not need these ports open
    for host in [&config.edge_ip, &config.station_ip] {
        for port in [22u16, 80] {
            probes::tcp_connect(host, port).await.log();
        }
    }

    if quick {
        log::info!("skipping element availability sweep (--quick)");
    } else {
        report.record(probes::media_elements().await);
    }

    for role in StreamRole::ALL {
        report.record(probes::camera_device(role.device(config)).await);
    }

    for role in StreamRole::ALL {
        report.record(probes::udp_round_trip(role.stream_port(config)).await);
    }

    report.record(probes::bandwidth_advisory().await);

    report.log_summary();
    report
}
