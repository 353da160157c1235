pub mod config;
pub mod device;
pub mod response;
pub mod transport;

pub use config::ConfigError;
pub use device::DeviceError;
pub use response::ResponseError;
pub use transport::TransportError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Transport(#[from] transport::TransportError),

    #[error(transparent)]
    Response(#[from] response::ResponseError),

    #[error(transparent)]
    Device(#[from] device::DeviceError),

    #[error(transparent)]
    Config(#[from] config::ConfigError),
}
