use serde::Serialize;

/// Static identity of the appliance, read once per connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductInformation {
    pub protocol_version: String,
    pub parameter_set_version: String,
    pub firmware_version: String,
    pub product_name: String,
    pub serial_number: String,
    pub device_id: String,
    pub device_name: String,
}
