//! Link diagnostics tool
//!
//! Usage:
//!   camlink-diagnose
//!   camlink-diagnose --edge-ip 192.168.1.100 --station-ip 192.168.1.10
//!   camlink-diagnose --quick

use camlink::cli::{init_logging, load_config, DiagnoseArgs};
use camlink::diagnostics::full_battery;

#[tokio::main]
async fn main() {
    let args: DiagnoseArgs = argh::from_env();
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
    if let Some(station_ip) = args.station_ip {
        config.station_ip = station_ip;
    }

    let report = full_battery(&config, args.quick).await;
    if report.is_acceptable() {
        log::info!("diagnostics completed successfully");
    } else {
        log::error!("diagnostics revealed issues");
        std::process::exit(1);
    }
}
