use crate::paths::{default_config_dir, default_log_dir};

use dsp_client::AppConfig;

use std::path::PathBuf;

use clap::Parser;

/// Connects to a DSP appliance, prints its identity and polls matrix parameters.
#[derive(Parser, Debug)]
#[command(name = "dsp-monitor")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Directory holding config.json.
    #[arg(long)]
    pub config_dir: Option<PathBuf>,

    /// Directory for dsp-monitor.log.
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Appliance host, overrides the config file.
    #[arg(long)]
    pub host: Option<String>,

    /// Appliance port, overrides the config file.
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Write the effective config to the config directory and exit.
    #[arg(long)]
    pub save_config: bool,
}

impl Args {
    pub fn config_dir(&self) -> PathBuf {
        self.config_dir.clone().unwrap_or_else(default_config_dir)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.log_dir.clone().unwrap_or_else(default_log_dir)
    }

    /// Apply command-line overrides on top of the loaded config.
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(host) = &self.host {
            config.device.host = host.clone();
        }
        if let Some(port) = self.port {
            config.device.port = port;
        }
    }
}
