//! Device client: command/response correlation over one stream connection.
//!
//! The wire protocol carries no request identifiers, so a reply can only be matched to
//! its command by position. This module keeps that sound:
//!
//! - One async mutex guards the session; holding it is the only way to put a command on
//!   the wire, so at most one command is ever in flight and callers queue FIFO
//! - A background receive loop owns the read half, completes the pending command with
//!   `OK`/`OKm`/`ERROR` replies and hands `NOTIFY` lines to a [`NotificationHandler`]
//! - Every write and every reply wait is bounded by the configured timeout
//!
//! # Connection lifecycle
//!
//! `connect()` opens the socket, then runs the after-connect step: start the receive
//! loop and perform the `devstatus runmode` handshake the appliance requires before it
//! accepts anything else. The session lock is held throughout, so commands issued
//! concurrently wait behind the handshake. `disconnect()` runs the before-disconnect
//! step (abort and await the receive loop) before the socket is closed.
//!
//! # Recovery
//!
//! When a command ends with the link down (reset on write, or the receive loop saw the
//! stream end) the client reconnects once before returning, so the *next* call finds a
//! working connection. Commands are never resent. A timeout alone leaves the connection
//! as it is.

mod notification;
pub(crate) mod pending;
mod product_info;
mod receiver;
mod state;

pub use notification::{NotificationHandler, log_notification};
pub use product_info::ProductInformation;
pub use state::ConnectionState;

use crate::LINE_TERMINATOR;
use crate::config::DeviceConfig;
use crate::device::pending::{PendingSlot, Reply};
use crate::device::receiver::receive_loop;
use crate::error::device::DeviceError;
use crate::protocol::{Command, DevInfoField, ParameterAddress, ParameterValueType, ValueResponse};
use crate::transport::StreamTransport;

use std::fmt::Display;
use std::sync::Arc;

use log::{debug, info, warn};
use tokio::spawn as TokioSpawn;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::timeout as TokioTimeout;

struct Session {
    transport: StreamTransport,
    receiver: Option<JoinHandle<()>>,
    /// Set by connect/reconnect, cleared by disconnect. Recovery only runs while set.
    wanted: bool,
}

/// Client for one DSP appliance.
///
/// All methods take `&self`; share the device between tasks with an `Arc`.
pub struct DspDevice {
    config: DeviceConfig,
    session: Mutex<Session>,
    pending: Arc<PendingSlot>,
    state: Arc<watch::Sender<ConnectionState>>,
    notification_handler: Arc<dyn NotificationHandler>,
}

impl DspDevice {
    /// Create a client that logs notifications. No connection is made yet.
    pub fn new(config: DeviceConfig) -> Self {
        Self::with_notification_handler(config, log_notification)
    }

    pub fn with_notification_handler(
        config: DeviceConfig,
        handler: impl NotificationHandler,
    ) -> Self {
        let transport = StreamTransport::new(config.host.clone(), config.port, config.timeout());
        let (state, _) = watch::channel(ConnectionState::Disconnected);

        Self {
            config,
            session: Mutex::new(Session {
                transport,
                receiver: None,
                wanted: false,
            }),
            pending: Arc::new(PendingSlot::default()),
            state: Arc::new(state),
            notification_handler: Arc::new(handler),
        }
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Watch connection state changes.
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Ready
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Connect and perform the handshake. Does nothing if already connected.
    ///
    /// # Errors
    ///
    /// - [`DeviceError::ConnectionFailure`] if the socket cannot be opened
    /// - [`DeviceError::Handshake`] if the appliance does not answer the handshake
    pub async fn connect(&self) -> Result<(), DeviceError> {
        let mut session = self.session.lock().await;

        if session.transport.is_connected() {
            debug!("Already connected to {}", self.config.address());
            return Ok(());
        }

        session.wanted = true;
        let result = self.establish(&mut session).await;
        if result.is_err() {
            // Caller owns retry policy for the initial connect
            session.wanted = false;
        }
        result
    }

    /// Close the connection. Commands fail with `NotConnected` until the next connect.
    pub async fn disconnect(&self) {
        let mut session = self.session.lock().await;
        session.wanted = false;
        self.teardown(&mut session).await;
    }

    /// Drop the current socket and connect again with the same configuration.
    pub async fn reconnect(&self) -> Result<(), DeviceError> {
        let mut session = self.session.lock().await;
        session.wanted = true;
        self.establish(&mut session).await
    }

    async fn establish(&self, session: &mut Session) -> Result<(), DeviceError> {
        // Clears whatever a dead link left behind
        self.before_disconnect(session).await;

        self.set_state(ConnectionState::Connecting);
        if let Err(e) = session.transport.reconnect().await {
            self.set_state(ConnectionState::Disconnected);
            return Err(DeviceError::connection_failure(self.config.address(), e));
        }

        if let Err(e) = self.after_connect(session).await {
            warn!("Handshake with {} failed: {e}", self.config.address());
            self.teardown(session).await;
            return Err(e);
        }

        self.set_state(ConnectionState::Ready);
        Ok(())
    }

    async fn after_connect(&self, session: &mut Session) -> Result<(), DeviceError> {
        let reader = session
            .transport
            .take_reader()
            .ok_or_else(DeviceError::not_connected)?;

        session.receiver = Some(TokioSpawn(receive_loop(
            reader,
            Arc::clone(&self.pending),
            session.transport.link_status(),
            Arc::clone(&self.state),
            Arc::clone(&self.notification_handler),
        )));

        // The appliance ignores every other command until this one is answered
        self.set_state(ConnectionState::Handshaking);
        let handshake = Command::RunMode.to_string();
        self.exchange(session, &handshake)
            .await
            .map_err(DeviceError::handshake)?;

        info!("Handshake with {} complete", self.config.address());
        Ok(())
    }

    async fn before_disconnect(&self, session: &mut Session) {
        if let Some(receiver) = session.receiver.take() {
            receiver.abort();
            if let Err(e) = receiver.await {
                if !e.is_cancelled() {
                    warn!("Receive loop ended abnormally: {e}");
                }
            }
        }

        self.pending.clear();
    }

    async fn teardown(&self, session: &mut Session) {
        self.before_disconnect(session).await;
        session.transport.disconnect().await;
        self.set_state(ConnectionState::Disconnected);
    }

    fn set_state(&self, next: ConnectionState) {
        let previous = self.state.send_replace(next);
        if previous != next {
            debug!("Connection state {previous} -> {next}");
        }
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    /// Send `command` and wait for its reply, queueing behind any command in flight.
    ///
    /// # Errors
    ///
    /// - [`DeviceError::NotConnected`] after `disconnect()` or before the first `connect()`
    /// - [`DeviceError::CommandTimeout`] if the write or the reply exceeds the timeout
    /// - [`DeviceError::ConnectionLost`] if the connection was reset mid-command
    /// - [`DeviceError::CommandRejected`] if the appliance answered `ERROR`
    pub async fn run_command(&self, command: &str) -> Result<ValueResponse, DeviceError> {
        let mut session = self.session.lock().await;
        self.run_locked(&mut session, command).await
    }

    /// Like [`run_command`](Self::run_command), but fails with [`DeviceError::Busy`]
    /// instead of waiting when another command is in flight.
    pub async fn try_run_command(&self, command: &str) -> Result<ValueResponse, DeviceError> {
        let mut session = self
            .session
            .try_lock()
            .map_err(|_| DeviceError::busy(command))?;
        self.run_locked(&mut session, command).await
    }

    pub async fn send(&self, command: &Command) -> Result<ValueResponse, DeviceError> {
        self.run_command(&command.to_string()).await
    }

    async fn run_locked(
        &self,
        session: &mut Session,
        command: &str,
    ) -> Result<ValueResponse, DeviceError> {
        if !session.wanted {
            return Err(DeviceError::not_connected());
        }

        if !session.transport.is_connected() {
            info!("Connection to {} is down, reconnecting", self.config.address());
            self.establish(session).await?;
        }

        let result = self.exchange(session, command).await;

        if !session.transport.is_connected() {
            warn!(
                "Connection to {} seems to be broken, attempting to reconnect",
                self.config.address()
            );
            if let Err(e) = self.establish(session).await {
                warn!("Reconnect to {} failed: {e}", self.config.address());
            }
        }

        result
    }

    /// One write + reply round trip. No recovery.
    async fn exchange(
        &self,
        session: &mut Session,
        command: &str,
    ) -> Result<ValueResponse, DeviceError> {
        if !session.transport.is_connected() {
            return Err(DeviceError::not_connected());
        }

        let timeout = self.config.timeout();
        let reply_rx = self.pending.arm(command);
        let payload = format!("{command}{LINE_TERMINATOR}");

        debug!("-> {command}");

        let written = TokioTimeout(timeout, session.transport.write(payload.as_bytes())).await;
        match written {
            Ok(Ok(())) => {}
            Ok(Err(e)) if e.is_connection_reset() => {
                self.pending.clear();
                warn!("Connection reset while sending '{command}': {e}");
                let message = e.to_string();
                self.teardown(session).await;
                return Err(DeviceError::connection_lost(command, message));
            }
            Ok(Err(e)) => {
                self.pending.clear();
                return Err(DeviceError::transport(command, e));
            }
            Err(_) => {
                self.pending.clear();
                warn!("Sending '{command}' did not finish within {timeout:?}");
                return Err(DeviceError::command_timeout(command, timeout));
            }
        }

        let reply = match TokioTimeout(timeout, reply_rx).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(_)) => {
                // Only the receive loop drops an armed slot, after a reset
                warn!("Connection reset while waiting for the reply to '{command}'");
                return Err(DeviceError::connection_lost(
                    command,
                    "connection reset while waiting for the reply",
                ));
            }
            Err(_) => {
                // A reply arriving from now on finds no pending command and is dropped
                self.pending.clear();
                warn!("No reply to '{command}' within {timeout:?}");
                return Err(DeviceError::command_timeout(command, timeout));
            }
        };

        match reply {
            Reply::Success(response) => Ok(response),
            Reply::Error(response) => Err(DeviceError::command_rejected(
                command,
                response.command_name,
                response.error_code,
            )),
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Read one `devinfo` field.
    pub async fn query_dev_info(&self, field: DevInfoField) -> Result<String, DeviceError> {
        Ok(self.send(&Command::DevInfo(field)).await?.value)
    }

    /// Read the seven identity fields, one command at a time in a fixed order.
    pub async fn query_product_information(&self) -> Result<ProductInformation, DeviceError> {
        Ok(ProductInformation {
            protocol_version: self.query_dev_info(DevInfoField::ProtocolVersion).await?,
            parameter_set_version: self
                .query_dev_info(DevInfoField::ParameterSetVersion)
                .await?,
            firmware_version: self.query_dev_info(DevInfoField::FirmwareVersion).await?,
            product_name: self.query_dev_info(DevInfoField::ProductName).await?,
            serial_number: self.query_dev_info(DevInfoField::SerialNumber).await?,
            device_id: self.query_dev_info(DevInfoField::DeviceId).await?,
            device_name: self.query_dev_info(DevInfoField::DeviceName).await?,
        })
    }

    pub async fn query_parameter(
        &self,
        value_type: ParameterValueType,
        address: &ParameterAddress,
    ) -> Result<ValueResponse, DeviceError> {
        self.send(&Command::query(value_type, address.clone())).await
    }

    pub async fn query_parameter_raw(
        &self,
        address: &ParameterAddress,
    ) -> Result<ValueResponse, DeviceError> {
        self.query_parameter(ParameterValueType::Raw, address).await
    }

    pub async fn query_parameter_normalized(
        &self,
        address: &ParameterAddress,
    ) -> Result<ValueResponse, DeviceError> {
        self.query_parameter(ParameterValueType::Normalized, address)
            .await
    }

    pub async fn set_parameter(
        &self,
        value_type: ParameterValueType,
        address: &ParameterAddress,
        value: impl Display,
    ) -> Result<ValueResponse, DeviceError> {
        self.send(&Command::set(value_type, address.clone(), value.to_string()))
            .await
    }

    pub async fn set_parameter_raw(
        &self,
        address: &ParameterAddress,
        value: impl Display,
    ) -> Result<ValueResponse, DeviceError> {
        self.set_parameter(ParameterValueType::Raw, address, value)
            .await
    }

    pub async fn set_parameter_normalized(
        &self,
        address: &ParameterAddress,
        value: impl Display,
    ) -> Result<ValueResponse, DeviceError> {
        self.set_parameter(ParameterValueType::Normalized, address, value)
            .await
    }
}

impl Drop for DspDevice {
    fn drop(&mut self) {
        if let Some(receiver) = self.session.get_mut().receiver.take() {
            receiver.abort();
        }
    }
}
