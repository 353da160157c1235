use crate::device_tests::helpers::{FakeAppliance, Scripted, standard_reply};

use dsp_client::error::DeviceError;
use dsp_client::{ConnectionState, DeviceConfig, DspDevice};

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::net::TcpListener;

/// **VALUE**: Verifies the handshake is the very first line on every connection.
///
/// **WHY THIS MATTERS**: The appliance ignores commands until `devstatus runmode` has
/// been answered.
#[tokio::test]
async fn given_listening_appliance_when_connect_then_handshake_is_first_and_state_ready() {
    // GIVEN: A fake appliance
    let appliance = FakeAppliance::start().await;
    let device = DspDevice::new(appliance.device_config());

    // WHEN: Connecting
    device.connect().await.expect("connect should succeed");

    // THEN: Exactly the handshake was sent and the device is ready
    assert_eq!(appliance.received(), vec!["devstatus runmode"]);
    assert_eq!(device.state(), ConnectionState::Ready);
    assert!(device.is_connected());
}

#[tokio::test]
async fn given_connected_device_when_connect_again_then_no_new_connection() {
    let appliance = FakeAppliance::start().await;
    let device = DspDevice::new(appliance.device_config());
    device.connect().await.expect("connect");

    device.connect().await.expect("second connect is a no-op");

    assert_eq!(appliance.connections(), 1);
    assert_eq!(appliance.received().len(), 1);
}

#[tokio::test]
async fn given_never_connected_device_when_run_command_then_not_connected() {
    let device = DspDevice::new(DeviceConfig::new("127.0.0.1"));

    let err = device
        .run_command("get MTX:Index_0 0 0")
        .await
        .expect_err("must not send without a connection");

    assert!(matches!(err, DeviceError::NotConnected { .. }));
}

/// **VALUE**: Verifies an explicit disconnect is final: no silent reconnect behind it.
///
/// **BUG THIS CATCHES**: Would catch the recovery path reconnecting a device the
/// caller deliberately closed.
#[tokio::test]
async fn given_disconnected_device_when_run_command_then_not_connected_without_reconnect() {
    // GIVEN: A device that connected and then disconnected
    let appliance = FakeAppliance::start().await;
    let device = DspDevice::new(appliance.device_config());
    device.connect().await.expect("connect");
    device.disconnect().await;

    // WHEN: Issuing a command
    let err = device
        .run_command("get MTX:Index_0 0 0")
        .await
        .expect_err("disconnected device must refuse");

    // THEN: Refused locally, nothing reached the appliance
    assert!(matches!(err, DeviceError::NotConnected { .. }));
    assert_eq!(device.state(), ConnectionState::Disconnected);
    assert_eq!(appliance.connections(), 1);
    assert_eq!(appliance.received(), vec!["devstatus runmode"]);
}

#[tokio::test]
async fn given_disconnected_device_when_connect_then_works_again() {
    let appliance = FakeAppliance::start().await;
    let device = DspDevice::new(appliance.device_config());
    device.connect().await.expect("connect");
    device.disconnect().await;

    device.connect().await.expect("reconnect after disconnect");
    let value = device
        .run_command("get MTX:Index_0 0 0")
        .await
        .expect("command after reconnect");

    assert_eq!(value.value, "0");
    assert_eq!(appliance.connections(), 2);
}

#[tokio::test]
async fn given_closed_port_when_connect_then_connection_failure() {
    // GIVEN: A port nobody listens on
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("addr").port();
    drop(listener);
    let device = DspDevice::new(DeviceConfig::new("127.0.0.1").with_port(port));

    // WHEN: Connecting
    let err = device.connect().await.expect_err("nobody is listening");

    // THEN: Connection failure, device stays disconnected and refuses commands
    assert!(matches!(err, DeviceError::ConnectionFailure { .. }));
    assert!(err.is_transport_failure());
    assert_eq!(device.state(), ConnectionState::Disconnected);
    assert!(matches!(
        device.run_command("devinfo version").await,
        Err(DeviceError::NotConnected { .. })
    ));
}

#[tokio::test]
async fn given_appliance_rejects_handshake_when_connect_then_handshake_error() {
    // GIVEN: An appliance that is not ready
    let appliance = FakeAppliance::start_with(|command| match command {
        "devstatus runmode" => Scripted::line("ERROR devstatus NotReady"),
        other => standard_reply(other),
    })
    .await;
    let device = DspDevice::new(appliance.device_config());

    // WHEN: Connecting
    let err = device.connect().await.expect_err("handshake must fail");

    // THEN: Handshake error carrying the appliance's code, connection closed
    assert!(matches!(err, DeviceError::Handshake { .. }));
    assert_eq!(err.error_code(), Some("NotReady"));
    assert_eq!(device.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn given_silent_appliance_when_connect_then_handshake_times_out() {
    let appliance = FakeAppliance::start_with(|_| Scripted::Silence).await;
    let device = DspDevice::new(appliance.device_config());

    let err = device.connect().await.expect_err("no handshake reply");

    let DeviceError::Handshake { source, .. } = &err else {
        panic!("expected Handshake, got {err:?}");
    };
    assert!(matches!(**source, DeviceError::CommandTimeout { .. }));
    assert!(!device.is_connected());
}

/// **VALUE**: Verifies a dropped connection is restored before the failing call returns.
///
/// **WHY THIS MATTERS**: The appliance may reboot between polls; the next command
/// must not pay for the outage.
///
/// **BUG THIS CATCHES**: Would catch the receive loop not reporting end-of-stream, or
/// the post-command recovery check being skipped on timeout.
#[tokio::test]
async fn given_appliance_hangs_up_mid_command_when_command_fails_then_next_command_succeeds() {
    // GIVEN: An appliance that drops the connection on the first get
    let hung_up = Arc::new(AtomicBool::new(false));
    let appliance = {
        let hung_up = Arc::clone(&hung_up);
        FakeAppliance::start_with(move |command| {
            if command.starts_with("get ") && !hung_up.swap(true, Ordering::SeqCst) {
                return Scripted::Hangup;
            }
            standard_reply(command)
        })
        .await
    };
    let device = DspDevice::new(appliance.device_config());
    device.connect().await.expect("connect");

    // WHEN: The command in flight loses its connection
    let err = device
        .run_command("get MTX:Index_9 0 0")
        .await
        .expect_err("connection dropped without a reply");

    // THEN: The caller sees a timeout, the device is already reconnected
    assert!(matches!(err, DeviceError::CommandTimeout { .. }));
    assert_eq!(appliance.connections(), 2);
    assert_eq!(device.state(), ConnectionState::Ready);

    let value = device
        .run_command("get MTX:Index_9 0 0")
        .await
        .expect("next command should succeed");
    assert_eq!(value.value, "0");

    // The failed command was not resent
    let gets = appliance
        .received()
        .iter()
        .filter(|line| line.starts_with("get "))
        .count();
    assert_eq!(gets, 2);
}

/// **VALUE**: Verifies a connection reset fails the waiting command with
/// `ConnectionLost` instead of leaving it to time out.
///
/// **WHY THIS MATTERS**: A reset is a definite link failure; callers deciding whether to
/// retry need to tell it apart from an appliance that is merely slow.
///
/// **BUG THIS CATCHES**: Would catch the receive loop swallowing reset errors, recovery
/// not reconnecting after one, or `reconnect()` leaving the device unusable.
#[tokio::test]
async fn given_appliance_resets_connection_when_command_runs_then_connection_lost_and_recovered() {
    // GIVEN: An appliance that aborts the connection on one address
    let appliance = FakeAppliance::start_with(|command| match command {
        "get MTX:Index_7 0 0" => Scripted::Reset,
        other => standard_reply(other),
    })
    .await;
    let device = DspDevice::new(appliance.device_config());
    device.connect().await.expect("connect");

    // WHEN: The command in flight hits the reset
    let err = device
        .run_command("get MTX:Index_7 0 0")
        .await
        .expect_err("connection was reset");

    // THEN: The caller sees the lost connection, the device is already reconnected
    assert!(
        matches!(err, DeviceError::ConnectionLost { ref command, .. } if command == "get MTX:Index_7 0 0"),
        "unexpected error: {err:?}"
    );
    assert!(err.is_transport_failure());
    assert_eq!(appliance.connections(), 2);
    assert_eq!(device.state(), ConnectionState::Ready);
    device
        .run_command("get MTX:Index_8 0 0")
        .await
        .expect("command after recovery");

    // AND: An explicit reconnect opens a fresh, handshaken connection
    device.reconnect().await.expect("reconnect");
    assert_eq!(appliance.connections(), 3);
    assert_eq!(device.state(), ConnectionState::Ready);
    let reply = device
        .run_command("get MTX:Index_8 0 0")
        .await
        .expect("command after reconnect");
    assert_eq!(reply.value, "0");

    let handshakes = appliance
        .received()
        .iter()
        .filter(|line| *line == "devstatus runmode")
        .count();
    assert_eq!(handshakes, 3);
}

#[tokio::test]
async fn given_state_subscriber_when_connect_and_disconnect_then_sees_changes() {
    let appliance = FakeAppliance::start().await;
    let device = DspDevice::new(appliance.device_config());
    let mut state_rx = device.subscribe_state();
    assert_eq!(*state_rx.borrow_and_update(), ConnectionState::Disconnected);

    device.connect().await.expect("connect");
    assert!(state_rx.has_changed().expect("sender alive"));
    assert_eq!(*state_rx.borrow_and_update(), ConnectionState::Ready);

    device.disconnect().await;
    tokio::time::timeout(Duration::from_secs(1), state_rx.changed())
        .await
        .expect("state change in time")
        .expect("sender alive");
    assert_eq!(*state_rx.borrow(), ConnectionState::Disconnected);
}
