use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FormatResult};

const VERB_GET: &str = "get";
const VERB_GET_NORMALIZED: &str = "getn";
const VERB_SET: &str = "set";
const VERB_SET_NORMALIZED: &str = "setn";
const VERB_DEVSTATUS: &str = "devstatus";
const VERB_DEVINFO: &str = "devinfo";
const DEVSTATUS_RUNMODE: &str = "runmode";
const DEFAULT_SUB_INDEX: &str = "0";
const MATRIX_INDEX_PREFIX: &str = "MTX:Index_";

/// Scale a parameter value is read or written in.
///
/// Only the verb changes; the client never converts between the two.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterValueType {
    /// Integer scale (`get` / `set`).
    #[default]
    Raw,
    /// Appliance-defined normalized scale (`getn` / `setn`).
    Normalized,
}

impl ParameterValueType {
    pub fn query_verb(self) -> &'static str {
        match self {
            ParameterValueType::Raw => VERB_GET,
            ParameterValueType::Normalized => VERB_GET_NORMALIZED,
        }
    }

    pub fn set_verb(self) -> &'static str {
        match self {
            ParameterValueType::Raw => VERB_SET,
            ParameterValueType::Normalized => VERB_SET_NORMALIZED,
        }
    }
}

/// Whether `verb` writes a value, so its reply echoes a value the appliance may have adjusted.
pub(crate) fn is_set_verb(verb: &str) -> bool {
    verb == VERB_SET || verb == VERB_SET_NORMALIZED
}

/// Three-component address of a control point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterAddress {
    pub name: String,
    pub x: String,
    pub y: String,
}

impl ParameterAddress {
    /// Address with both sub-indices set to `0`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            x: DEFAULT_SUB_INDEX.to_string(),
            y: DEFAULT_SUB_INDEX.to_string(),
        }
    }

    /// `MTX:Index_<index>`, the parameter naming used by the matrix processors.
    pub fn matrix_index(index: u32) -> Self {
        Self::new(format!("{MATRIX_INDEX_PREFIX}{index}"))
    }

    pub fn with_indices(mut self, x: impl Into<String>, y: impl Into<String>) -> Self {
        self.x = x.into();
        self.y = y.into();
        self
    }
}

impl Display for ParameterAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        write!(f, "{} {} {}", self.name, self.x, self.y)
    }
}

/// Fields readable through `devinfo`, in the order product information is assembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DevInfoField {
    ProtocolVersion,
    ParameterSetVersion,
    FirmwareVersion,
    ProductName,
    SerialNumber,
    DeviceId,
    DeviceName,
}

impl DevInfoField {
    pub const ALL: [DevInfoField; 7] = [
        DevInfoField::ProtocolVersion,
        DevInfoField::ParameterSetVersion,
        DevInfoField::FirmwareVersion,
        DevInfoField::ProductName,
        DevInfoField::SerialNumber,
        DevInfoField::DeviceId,
        DevInfoField::DeviceName,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DevInfoField::ProtocolVersion => "protocolver",
            DevInfoField::ParameterSetVersion => "paramsetver",
            DevInfoField::FirmwareVersion => "version",
            DevInfoField::ProductName => "productname",
            DevInfoField::SerialNumber => "serialno",
            DevInfoField::DeviceId => "deviceid",
            DevInfoField::DeviceName => "devicename",
        }
    }
}

/// A request line, without its terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `devstatus runmode`, also the connection handshake.
    RunMode,
    DevInfo(DevInfoField),
    Query {
        value_type: ParameterValueType,
        address: ParameterAddress,
    },
    Set {
        value_type: ParameterValueType,
        address: ParameterAddress,
        value: String,
    },
}

impl Command {
    pub fn query(value_type: ParameterValueType, address: ParameterAddress) -> Self {
        Command::Query {
            value_type,
            address,
        }
    }

    pub fn set(
        value_type: ParameterValueType,
        address: ParameterAddress,
        value: impl Into<String>,
    ) -> Self {
        Command::Set {
            value_type,
            address,
            value: value.into(),
        }
    }

    pub fn verb(&self) -> &'static str {
        match self {
            Command::RunMode => VERB_DEVSTATUS,
            Command::DevInfo(_) => VERB_DEVINFO,
            Command::Query { value_type, .. } => value_type.query_verb(),
            Command::Set { value_type, .. } => value_type.set_verb(),
        }
    }
}

impl Display for Command {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        match self {
            Command::RunMode => write!(f, "{VERB_DEVSTATUS} {DEVSTATUS_RUNMODE}"),
            Command::DevInfo(field) => write!(f, "{VERB_DEVINFO} {}", field.as_str()),
            Command::Query { address, .. } => write!(f, "{} {address}", self.verb()),
            Command::Set { address, value, .. } => {
                write!(f, "{} {address} {value}", self.verb())
            }
        }
    }
}
