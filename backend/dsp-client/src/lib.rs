pub mod config;
pub mod device;
pub mod error;
pub mod protocol;
pub mod transport;

#[cfg(test)]
mod tests;

pub use config::{AppConfig, DeviceConfig, MonitorConfig, WatchedParameter};
pub use device::{ConnectionState, DspDevice, NotificationHandler, ProductInformation};
pub use protocol::{Command, DevInfoField, ParameterAddress, ParameterValueType, Response};

/// TCP port the appliance listens on for remote control.
pub const DSP_DEFAULT_PORT: u16 = 49280;
/// Every request and reply line ends with this sequence.
pub const LINE_TERMINATOR: &str = "\n";
