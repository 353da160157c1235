pub mod device;
pub mod monitor;

pub use device::DeviceConfig;
pub use monitor::{MonitorConfig, WatchedParameter};

use crate::error::config::ConfigError;

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE_NAME: &str = "config.json";
pub const CONFIG_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub device: DeviceConfig,

    #[serde(default)]
    pub monitor: MonitorConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            device: DeviceConfig::default(),
            monitor: MonitorConfig::default(),
        }
    }
}

fn default_version() -> u32 {
    CONFIG_VERSION
}

/// Write to a sibling temp file, then rename over `path`. Readers see the old file or
/// the new one, never a partial write. The temp file is removed if the rename fails.
#[track_caller]
fn write_atomically(path: &Path, contents: &[u8]) -> Result<(), ConfigError> {
    let mut temp_name = path.as_os_str().to_owned();
    temp_name.push(".tmp");
    let temp_path = PathBuf::from(temp_name);

    std::fs::write(&temp_path, contents).map_err(|e| ConfigError::write(&temp_path, e))?;

    if let Err(e) = std::fs::rename(&temp_path, path) {
        if let Err(cleanup) = std::fs::remove_file(&temp_path) {
            debug!("Could not remove {}: {cleanup}", temp_path.display());
        }
        return Err(ConfigError::write(path, e));
    }

    Ok(())
}

impl AppConfig {
    /// Read `{config_dir}/config.json`.
    ///
    /// A missing file is not an error: the defaults are returned so a first run works
    /// without any setup. A file that exists must parse and validate.
    pub fn load(config_dir: &Path) -> Result<Self, ConfigError> {
        let path = config_dir.join(CONFIG_FILE_NAME);

        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No config at {}, starting from defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => {
                warn!("Cannot read {}: {e}", path.display());
                return Err(ConfigError::read(path, e));
            }
        };

        let config: AppConfig = match serde_json::from_str(&contents) {
            Ok(config) => config,
            Err(e) => {
                warn!("{} is not valid config JSON: {e}", path.display());
                return Err(ConfigError::parse(path, e.to_string()));
            }
        };
        config.validate()?;

        info!("Loaded config for {} from {}", config.device.address(), path.display());
        Ok(config)
    }

    /// Validate, then replace `{config_dir}/config.json` atomically.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::ValidationError`] before anything touches the disk
    /// - [`ConfigError::SerializeError`] if the config cannot be rendered
    /// - [`ConfigError::WriteError`] if the directory, temp file or rename fails
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        self.validate()?;

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::serialize(e.to_string()))?;

        std::fs::create_dir_all(config_dir).map_err(|e| ConfigError::write(config_dir, e))?;
        let path = config_dir.join(CONFIG_FILE_NAME);
        write_atomically(&path, json.as_bytes())?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if any value is invalid.
    #[track_caller]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version == 0 || self.version > CONFIG_VERSION {
            return Err(ConfigError::validation(format!(
                "Invalid version: {} (expected 1-{CONFIG_VERSION})",
                self.version
            )));
        }

        self.device.validate()?;
        self.monitor.validate()?;

        Ok(())
    }
}
