use anyhow::Result;
use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};
use smartpark_common::logging::init_logging;
use smartpark_ledger::server::ParkingServer;
use smartpark_ledger::SmartParkConfig;
use std::path::PathBuf;
use tokio::signal;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "smartpark")]
#[command(about = "SmartPark - parking slot allocation and fee ledger")]
struct Args {
    #[arg(short, long, help = "Path to configuration file")]
    config: Option<PathBuf>,

    #[arg(long, help = "Generate sample configuration file")]
    gen_config: bool,

    #[arg(long, help = "Dry run mode (validate config without starting)")]
    dry_run: bool,

    #[command(flatten)]
    verbosity: Verbosity<InfoLevel>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.verbosity, "smartpark_ledger=info,tower_http=info")?;

    if args.gen_config {
        println!("{}", SmartParkConfig::generate_example()?);
        return Ok(());
    }

    let config = SmartParkConfig::load(args.config)?;

    info!("Starting SmartPark ledger");
    info!(
        "Lot capacity: {}, tariff: {} first hour, {} per extra hour",
        config.lot.capacity, config.lot.base_rate, config.lot.extra_rate
    );
    info!("Storage backend: {:?}", config.storage.backend);

    let server = ParkingServer::new_with_config(config.clone()).await?;

    if args.dry_run {
        info!("Configuration validated successfully (dry-run mode)");
        return Ok(());
    }

    server.run_migrations().await?;

    info!(
        "Starting HTTP server on {}:{}",
        config.server.listen_address, config.server.port
    );

    if let Err(e) = server.serve(shutdown_signal()).await {
        error!("Server error: {}", e);
        return Err(e);
    }

    info!("SmartPark ledger stopped gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
