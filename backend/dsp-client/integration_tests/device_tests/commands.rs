use crate::device_tests::helpers::{FakeAppliance, Scripted, standard_reply};

use dsp_client::error::DeviceError;
use dsp_client::{Command, DevInfoField, DspDevice, ParameterAddress, ProductInformation};

async fn connected(appliance: &FakeAppliance) -> DspDevice {
    let device = DspDevice::new(appliance.device_config());
    device.connect().await.expect("connect");
    device
}

/// **VALUE**: Verifies product information is assembled field by field in a fixed order.
///
/// **BUG THIS CATCHES**: Would catch a field wired to the wrong `devinfo` name, which
/// silently swaps e.g. the serial number and the device id.
#[tokio::test]
async fn given_connected_device_when_query_product_information_then_all_fields_filled() {
    // GIVEN: A connected device
    let appliance = FakeAppliance::start().await;
    let device = connected(&appliance).await;

    // WHEN: Reading the identity
    let info = device
        .query_product_information()
        .await
        .expect("product information");

    // THEN: Every field holds its own value, queried one after another
    assert_eq!(
        info,
        ProductInformation {
            protocol_version: "3.0.0".to_string(),
            parameter_set_version: "1.2.0".to_string(),
            firmware_version: "V4.10".to_string(),
            product_name: "MRX7-D".to_string(),
            serial_number: "Y000001".to_string(),
            device_id: "0x0F".to_string(),
            device_name: "MainHall".to_string(),
        }
    );
    assert_eq!(
        appliance.received(),
        vec![
            "devstatus runmode",
            "devinfo protocolver",
            "devinfo paramsetver",
            "devinfo version",
            "devinfo productname",
            "devinfo serialno",
            "devinfo deviceid",
            "devinfo devicename",
        ]
    );
}

#[tokio::test]
async fn given_connected_device_when_query_dev_info_then_unquoted_value() {
    let appliance = FakeAppliance::start().await;
    let device = connected(&appliance).await;

    let serial = device
        .query_dev_info(DevInfoField::SerialNumber)
        .await
        .expect("serialno");

    assert_eq!(serial, "Y000001");
}

#[tokio::test]
async fn given_matrix_address_when_query_raw_and_normalized_then_sends_get_and_getn() {
    // GIVEN: An appliance reporting a level
    let appliance = FakeAppliance::start_with(|command| match command {
        "get MTX:Index_0 0 0" => Scripted::line("OK get MTX:Index_0 0 0 -1000"),
        "getn MTX:Index_0 0 0" => Scripted::line("OK getn MTX:Index_0 0 0 812"),
        other => standard_reply(other),
    })
    .await;
    let device = connected(&appliance).await;
    let address = ParameterAddress::matrix_index(0);

    // WHEN: Reading it on both scales
    let raw = device.query_parameter_raw(&address).await.expect("get");
    let normalized = device
        .query_parameter_normalized(&address)
        .await
        .expect("getn");

    // THEN: Each scale used its verb and returned its value
    assert_eq!(raw.int_value().expect("integer"), -1000);
    assert_eq!(normalized.value, "812");
    assert_eq!(
        &appliance.received()[1..],
        &["get MTX:Index_0 0 0", "getn MTX:Index_0 0 0"]
    );
}

#[tokio::test]
async fn given_matrix_address_when_set_then_value_is_sent_and_echo_returned() {
    let appliance = FakeAppliance::start().await;
    let device = connected(&appliance).await;
    let address = ParameterAddress::matrix_index(2);

    let set = device
        .set_parameter_raw(&address, 1)
        .await
        .expect("set");
    let setn = device
        .set_parameter_normalized(&address, 750)
        .await
        .expect("setn");

    assert!(set.bool_value().expect("flag"));
    assert_eq!(setn.value, "750");
    assert_eq!(
        &appliance.received()[1..],
        &["set MTX:Index_2 0 0 1", "setn MTX:Index_2 0 0 750"]
    );
}

#[tokio::test]
async fn given_typed_command_when_send_then_rendered_text_goes_on_the_wire() {
    let appliance = FakeAppliance::start().await;
    let device = connected(&appliance).await;

    let reply = device.send(&Command::RunMode).await.expect("runmode");

    assert_eq!(reply.value, "normal");
    assert_eq!(appliance.received(), vec!["devstatus runmode", "devstatus runmode"]);
}

/// **VALUE**: Verifies an `ERROR` reply surfaces as a rejection with its code.
///
/// **WHY THIS MATTERS**: An unknown address must not look like a transport fault;
/// callers log it and carry on instead of reconnecting.
#[tokio::test]
async fn given_unknown_parameter_when_query_then_command_rejected_with_code() {
    // GIVEN: An appliance that does not know the address
    let appliance = FakeAppliance::start_with(|command| {
        if command.starts_with("get MTX:Index_999") {
            return Scripted::line("ERROR get UnknownAddress");
        }
        standard_reply(command)
    })
    .await;
    let device = connected(&appliance).await;

    // WHEN: Querying it
    let err = device
        .query_parameter_raw(&ParameterAddress::matrix_index(999))
        .await
        .expect_err("unknown address");

    // THEN: Rejected, still connected
    let DeviceError::CommandRejected {
        command,
        command_name,
        error_code,
        ..
    } = &err
    else {
        panic!("expected CommandRejected, got {err:?}");
    };
    assert_eq!(command, "get MTX:Index_999 0 0");
    assert_eq!(command_name, "get");
    assert_eq!(error_code, "UnknownAddress");
    assert!(!err.is_transport_failure());
    assert!(device.is_connected());
}
