//! Wire grammar of the DSP remote-control protocol.
//!
//! Requests are single ASCII lines `<verb> <addr1> <addr2> <addr3> [value]`; replies and
//! unsolicited notifications come back on the same stream:
//!
//! - `OK` / `OKm` - successful reply carrying a trailing value
//! - `NOTIFY` - unsolicited change pushed by the appliance
//! - `ERROR <command> <code>` - the appliance refused a command
//!
//! Nothing in this module performs I/O.

mod command;
mod response;

pub(crate) use command::is_set_verb;
pub use command::{Command, DevInfoField, ParameterAddress, ParameterValueType};
pub(crate) use response::strip_quotes;
pub use response::{ErrorResponse, Response, ValueResponse, parse_response};
