//! The polling loop: connect, identify the appliance, then read the watched
//! parameters on a fixed interval until shutdown.

use crate::error::MonitorError;

use dsp_client::DspDevice;
use dsp_client::config::{MonitorConfig, WatchedParameter};
use dsp_client::error::DeviceError;
use dsp_client::protocol::ValueResponse;

use std::future::Future;
use std::time::Duration;

use backoff::{ExponentialBackoff, backoff::Backoff};
use log::{debug, info, warn};
use tokio::time::{MissedTickBehavior, interval, sleep as TokioSleep};

/// One watched parameter's outcome in a poll round.
#[derive(Debug)]
pub struct PollResult<'a> {
    pub parameter: &'a WatchedParameter,
    pub outcome: Result<ValueResponse, DeviceError>,
}

/// Connect, retrying with exponential backoff.
///
/// `max_elapsed` of `None` retries until the connection succeeds.
///
/// # Errors
///
/// Returns the last [`DeviceError`] once the retry budget is spent.
pub async fn connect_with_backoff(
    device: &DspDevice,
    max_elapsed: Option<Duration>,
) -> Result<(), MonitorError> {
    let mut backoff = ExponentialBackoff {
        max_elapsed_time: max_elapsed,
        ..Default::default()
    };

    let address = device.config().address();
    debug!("Connecting to {address}");

    loop {
        let error = match device.connect().await {
            Ok(()) => {
                info!("Connected to appliance at {address}");
                return Ok(());
            }
            Err(e) => e,
        };

        match backoff.next_backoff() {
            Some(duration) => {
                warn!("Connecting to {address} failed, retrying after {duration:?}: {error}");
                TokioSleep(duration).await;
            }
            None => {
                warn!("Giving up on {address}: {error}");
                return Err(error.into());
            }
        }
    }
}

/// Read every watched parameter once, in order.
pub async fn poll_once<'a>(
    device: &DspDevice,
    parameters: &'a [WatchedParameter],
) -> Vec<PollResult<'a>> {
    let mut results = Vec::with_capacity(parameters.len());

    for parameter in parameters {
        let outcome = device
            .query_parameter(parameter.value_type, &parameter.address())
            .await;
        log_poll_result(parameter, &outcome);
        results.push(PollResult { parameter, outcome });
    }

    results
}

fn log_poll_result(parameter: &WatchedParameter, outcome: &Result<ValueResponse, DeviceError>) {
    match outcome {
        Ok(value) => info!(
            "{} ({}) = {}",
            parameter.label,
            parameter.address(),
            value.value
        ),
        Err(e) => warn!(
            "Reading {} ({}) failed [{}]: {e}",
            parameter.label,
            parameter.address(),
            e.error_category()
        ),
    }
}

/// Run the monitor until `shutdown` resolves, then disconnect.
///
/// # Errors
///
/// Only the initial connection is fatal; everything after it is logged and retried
/// on the next round.
pub async fn run(
    device: &DspDevice,
    config: &MonitorConfig,
    shutdown: impl Future<Output = ()>,
) -> Result<(), MonitorError> {
    tokio::pin!(shutdown);

    tokio::select! {
        result = connect_with_backoff(device, config.connect_max_elapsed()) => result?,
        () = &mut shutdown => {
            info!("Shutdown requested before the appliance was reached");
            return Ok(());
        }
    }

    match device.query_product_information().await {
        Ok(product) => info!(
            "Appliance: {} \"{}\" serial {} firmware {} (protocol {}, parameter set {}, id {})",
            product.product_name,
            product.device_name,
            product.serial_number,
            product.firmware_version,
            product.protocol_version,
            product.parameter_set_version,
            product.device_id
        ),
        Err(e) => warn!("Reading product information failed: {e}"),
    }

    let mut ticker = interval(config.poll_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let round = async {
            ticker.tick().await;
            poll_once(device, &config.parameters).await;
        };

        tokio::select! {
            () = &mut shutdown => break,
            () = round => {}
        }
    }

    info!("Shutting down");
    device.disconnect().await;
    Ok(())
}
