use std::path::PathBuf;

const APP_DIR_NAME: &str = "dsp-monitor";
const LOG_DIR_NAME: &str = "logs";

/// `<platform config dir>/dsp-monitor`, or the working directory if there is none.
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// `<platform local data dir>/dsp-monitor/logs`, or `./logs`.
pub fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(LOG_DIR_NAME)
}
