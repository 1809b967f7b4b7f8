//! Station-side stream receiver
//!
//! Usage:
//!   camlink-sink
//!   camlink-sink -m record --output-dir /srv/recordings
//!   camlink-sink -m forward -c link.yaml

use std::path::Path;

use camlink::cli::{init_logging, load_config, ReceiveMode, SinkArgs};
use camlink::diagnostics::sink_preflight;
use camlink::pipeline::{build, PipelineError, PipelineMode, PipelineParams, PipelineSpec};
use camlink::runtime::{acquire_stream, Candidate, RunOutcome, StreamSupervisor};
use camlink::stream::StreamRole;
use camlink::LinkConfig;
use tokio::sync::watch;

#[tokio::main]
async fn main() {
    let args: SinkArgs = argh::from_env();
    init_logging(&args.log_level);

    let mut config = match load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            log::error!("failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(edge_ip) = args.edge_ip {
        config.edge_ip = edge_ip;
    }

    log::info!("receiving in {} mode", args.mode.as_str());

    if !args.skip_preflight {
        let report = sink_preflight(&config, args.mode == ReceiveMode::Forward).await;
        if !report.is_acceptable() {
            log::warn!("diagnostics revealed issues, attempting to start receiving anyway");
        }
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(());
    ctrlc::set_handler(move || {
        log::info!("received interrupt, initiating shutdown");
        let _ = shutdown_tx.send(());
    })
    .expect("Error setting Ctrl+C handler");

    let mut supervisor = StreamSupervisor::new(config.poll_interval(), config.grace_period());

    for role in StreamRole::ALL {
        let spec = match receiver_spec(args.mode, role, &config, &args.output_dir) {
            Ok(spec) => spec,
            Err(e) => {
                log::error!("invalid pipeline configuration: {}", e);
                std::process::exit(1);
            }
        };
        let candidates = [Candidate::from_spec(args.mode.as_str(), &spec)];
        match acquire_stream(role, &candidates, config.warmup()).await {
            Ok(process) => {
                if let Err(e) = supervisor.register(process) {
                    log::error!("{}", e);
                }
            }
            Err(e) => {
                log::error!("[{}] {}", role, e);
            }
        }
    }

    if supervisor.is_empty() {
        log::error!("failed to start any camera receivers");
        std::process::exit(1);
    }

    match args.mode {
        ReceiveMode::Display => {
            log::info!("camera streams should appear in separate windows");
        }
        ReceiveMode::Record => {
            log::info!("recording camera streams to {}", args.output_dir);
        }
        ReceiveMode::Forward => {
            for role in supervisor.roles() {
                log::info!(
                    "[{}] relaying to udp://127.0.0.1:{}",
                    role,
                    role.relay_port(&config)
                );
            }
        }
    }

    let outcome = supervisor.run(shutdown_rx).await;
    if outcome == RunOutcome::Drained {
        std::process::exit(1);
    }
    log::info!("camlink sink exiting");
}

/// The single receiver pipeline for one stream in the selected mode
fn receiver_spec(
    mode: ReceiveMode,
    role: StreamRole,
    config: &LinkConfig,
    output_dir: &str,
) -> Result<PipelineSpec, PipelineError> {
    let params =
        PipelineParams::from_config(config).with_listen_port(role.stream_port(config));
    match mode {
        ReceiveMode::Display => build(PipelineMode::SinkDisplay, role, &params),
        ReceiveMode::Record => {
            let filename = format!("{}_{}.mp4", role.label(), chrono::Utc::now().timestamp());
            let path = Path::new(output_dir).join(filename);
            build(
                PipelineMode::SinkRecord,
                role,
                &params.with_output_path(path.to_string_lossy()),
            )
        }
        ReceiveMode::Forward => build(
            PipelineMode::SinkForward,
            role,
            &params.with_forward_port(role.relay_port(config)),
        ),
    }
}
