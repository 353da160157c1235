use dsp_monitor::cli::Args;
use dsp_monitor::error::MonitorError;
use dsp_monitor::logger::initialize as LoggerInitialize;
use dsp_monitor::monitor;

use dsp_client::{AppConfig, DspDevice};

use std::fs::create_dir_all;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), MonitorError> {
    let args = Args::parse();

    let log_dir = args.log_dir();
    create_dir_all(&log_dir).map_err(|e| {
        MonitorError::monitor(format!(
            "Failed to create log directory {}: {e}",
            log_dir.display()
        ))
    })?;

    // Logger first so config problems end up in the log
    LoggerInitialize(&log_dir)?;

    info!("dsp-monitor starting");
    info!("Log directory: {}", log_dir.display());

    let config_dir = args.config_dir();
    let mut config = AppConfig::load(&config_dir)?;
    args.apply_overrides(&mut config);
    config.validate()?;

    if args.save_config {
        config.save(&config_dir)?;
        info!("Config written to {}", config_dir.display());
        return Ok(());
    }

    let device = DspDevice::new(config.device.clone());
    monitor::run(&device, &config.monitor, shutdown_signal()).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Cannot listen for Ctrl-C, stop the process to exit: {e}");
        std::future::pending::<()>().await;
    }
    info!("Ctrl-C received");
}
