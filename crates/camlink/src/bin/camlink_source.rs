//! Edge-side camera streamer
//!
//! Usage:
//!   camlink-source
//!   camlink-source -c link.yaml --station-ip 192.168.1.20
//!   camlink-source --skip-preflight -l debug

use camlink::cli::{init_logging, load_config, SourceArgs};
use camlink::diagnostics::source_preflight;
use camlink::pipeline::{build, EncoderSettings, PipelineError, PipelineMode, PipelineParams};
use camlink::runtime::{acquire_stream, Candidate, RunOutcome, StreamSupervisor};
use camlink::stream::StreamRole;
use camlink::LinkConfig;
use tokio::sync::watch;

#[tokio::main]
async fn main() {
    let args: SourceArgs = argh::from_env();
    init_logging(&args.log_level);

    let mut config = match load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            log::error!("failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(station_ip) = args.station_ip {
        config.station_ip = station_ip;
    }

    if !args.skip_preflight {
        let report = source_preflight(&config).await;
        if !report.is_acceptable() {
            log::warn!("diagnostics revealed issues, attempting to start streaming anyway");
        }
    }

    // Interrupt feeds the supervisor's shutdown channel
    let (shutdown_tx, shutdown_rx) = watch::channel(());
    ctrlc::set_handler(move || {
        log::info!("received interrupt, initiating shutdown");
        let _ = shutdown_tx.send(());
    })
    .expect("Error setting Ctrl+C handler");

    let mut supervisor = StreamSupervisor::new(config.poll_interval(), config.grace_period());

    for role in StreamRole::ALL {
        let candidates = match encoder_candidates(role, &config) {
            Ok(candidates) => candidates,
            Err(e) => {
                log::error!("invalid pipeline configuration: {}", e);
                std::process::exit(1);
            }
        };
        match acquire_stream(role, &candidates, config.warmup()).await {
            Ok(process) => {
                if let Err(e) = supervisor.register(process) {
                    log::error!("{}", e);
                }
            }
            Err(e) => {
                // one stream failing does not prevent the other from running
                log::error!("[{}] {}", role, e);
            }
        }
    }

    if supervisor.is_empty() {
        log::error!("failed to start any camera streams");
        std::process::exit(1);
    }

    for role in supervisor.roles() {
        log::info!(
            "[{}] streaming to udp://{}:{}",
            role,
            config.station_ip,
            role.stream_port(&config)
        );
    }

    let outcome = supervisor.run(shutdown_rx).await;
    if outcome == RunOutcome::Drained {
        std::process::exit(1);
    }
    log::info!("camlink source exiting");
}

/// Hardware-first candidate list for one camera stream
fn encoder_candidates(
    role: StreamRole,
    config: &LinkConfig,
) -> Result<Vec<Candidate>, PipelineError> {
    let base = PipelineParams::from_config(config)
        .with_device(role.device(config))
        .with_target(config.station_ip.clone(), role.stream_port(config));

    let mut candidates = Vec::new();
    for encoder in [EncoderSettings::hardware(), EncoderSettings::software()] {
        let name = encoder.name.clone();
        let spec = build(
            PipelineMode::RelaySource,
            role,
            &base.clone().with_encoder(encoder),
        )?;
        candidates.push(Candidate::from_spec(name, &spec));
    }
    Ok(candidates)
}
