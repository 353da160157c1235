//! Logging for the monitor: colored stdout plus a plain log file.
//!
//! Initialization runs at most once per process.

use crate::error::MonitorError;

use std::fmt::{Arguments, Display};
use std::io::stdout;
use std::path::Path;
use std::sync::Once;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;

use fern::{Dispatch, FormatCallback};
use fern::colors::Color::{Blue, Green, Magenta, Red, Yellow};
use fern::colors::ColoredLevelConfig;
use humantime::format_rfc3339;
use log::{LevelFilter, info, warn};

static INIT_LOGGER_ONCE: Once = Once::new();

static LOGGER_ALREADY_CALLED: AtomicBool = AtomicBool::new(false);

pub const LOG_FILE_NAME: &str = "dsp-monitor.log";

/// Module whose trace output is the raw appliance traffic.
pub(crate) const WIRE_TRACE_TARGET: &str = "dsp_client::device::receiver";

#[cfg(debug_assertions)]
const LOG_LEVEL: LevelFilter = LevelFilter::Debug;

#[cfg(not(debug_assertions))]
const LOG_LEVEL: LevelFilter = LevelFilter::Info;

/// Install the process logger: colored console plus `{log_dir}/dsp-monitor.log`.
///
/// Later calls log a warning and return `Ok`.
///
/// # Errors
///
/// Returns [`MonitorError::Monitor`] if the log file cannot be created or another
/// logger is already installed.
pub fn initialize(log_dir: &Path) -> Result<(), MonitorError> {
    if LOGGER_ALREADY_CALLED.swap(true, Ordering::SeqCst) {
        warn!("Logger already initialized");
        return Ok(());
    }

    let mut result = Ok(());

    INIT_LOGGER_ONCE.call_once(|| {
        result = initialize_internal(log_dir);
        if result.is_ok() {
            info!("Logger initialized with level: {LOG_LEVEL:?}");
        }
    });

    result
}

fn initialize_internal(log_dir: &Path) -> Result<(), MonitorError> {
    build_dispatch(log_dir)?
        .apply()
        .map_err(|e| MonitorError::monitor(format!("Failed to initialize logger: {e}")))
}

/// Dispatch chain writing to stdout and the log file, not yet installed.
///
/// Both outputs use the build's level. The file additionally records every line read
/// from the appliance, which the console would drown in.
pub(crate) fn build_dispatch(log_dir: &Path) -> Result<Dispatch, MonitorError> {
    let log_file_path = log_dir.join(LOG_FILE_NAME);
    let log_file = fern::log_file(&log_file_path).map_err(|e| {
        MonitorError::monitor(format!(
            "Failed to create log file {}: {e}",
            log_file_path.display()
        ))
    })?;

    let colors = ColoredLevelConfig::new()
        .trace(Magenta)
        .debug(Blue)
        .info(Green)
        .warn(Yellow)
        .error(Red);

    let console = Dispatch::new()
        .level(LOG_LEVEL)
        .format(move |out, message, record| {
            finish_line(out, message, colors.color(record.level()), record.target())
        })
        .chain(stdout());

    let file = Dispatch::new()
        .level(LOG_LEVEL)
        .level_for(WIRE_TRACE_TARGET, LevelFilter::Trace)
        .format(|out, message, record| {
            let origin = format!(
                "{}:{}",
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0)
            );
            finish_line(out, message, record.level(), origin)
        })
        .chain(log_file);

    Ok(Dispatch::new().chain(console).chain(file))
}

/// `[timestamp - LEVEL] message [origin]`, shared by both outputs.
fn finish_line(out: FormatCallback, message: &Arguments, level: impl Display, origin: impl Display) {
    out.finish(format_args!(
        "[{} - {level}] {message} [{origin}]",
        format_rfc3339(SystemTime::now())
    ))
}
