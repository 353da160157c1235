use dsp_client::error::{DeviceError, TransportError};

use std::error::Error;
use std::io::{Error as IoError, ErrorKind};
use std::time::Duration;

/// **VALUE**: Verifies device errors carry the location they were created at.
///
/// **WHY THIS MATTERS**: The same timeout can come from the write or the reply wait;
/// the location tells them apart in a log.
///
/// **BUG THIS CATCHES**: Would catch a constructor losing `#[track_caller]`, which would
/// make every error point into the error module instead of at the caller.
#[test]
fn given_timeout_error_when_formatted_then_includes_command_and_caller_location() {
    // GIVEN: A timeout created here
    let err = DeviceError::command_timeout("get MTX:Index_0 0 0", Duration::from_millis(300));

    // WHEN: Formatting it
    let message = err.to_string();

    // THEN: Command, timeout and this file are named
    assert!(message.contains("Command Timeout"));
    assert!(message.contains("get MTX:Index_0 0 0"));
    assert!(message.contains("300ms"));
    assert!(message.contains("integration_tests"));
}

#[test]
fn given_each_variant_when_categorized_then_stable_names() {
    let reset = TransportError::from(IoError::new(ErrorKind::ConnectionReset, "reset"));

    let cases = [
        (DeviceError::not_connected(), "not_connected"),
        (DeviceError::busy("get a 0 0"), "busy"),
        (
            DeviceError::command_timeout("get a 0 0", Duration::from_secs(5)),
            "command_timeout",
        ),
        (DeviceError::connection_lost("get a 0 0", "reset"), "connection_lost"),
        (
            DeviceError::command_rejected("get a 0 0", "get", "UnknownAddress"),
            "command_rejected",
        ),
        (DeviceError::handshake(DeviceError::not_connected()), "handshake"),
        (DeviceError::transport("get a 0 0", reset), "transport"),
    ];

    for (err, category) in cases {
        assert_eq!(err.error_category(), category, "{err}");
    }
}

/// **VALUE**: Verifies only link faults are classified as transport failures.
///
/// **BUG THIS CATCHES**: Would catch a retry loop reconnecting on an appliance refusal
/// or on a plain timeout.
#[test]
fn given_errors_when_classified_then_only_link_faults_are_transport_failures() {
    let reset = TransportError::from(IoError::new(ErrorKind::BrokenPipe, "pipe"));
    let refused = TransportError::connect(
        "127.0.0.1:49280",
        IoError::new(ErrorKind::ConnectionRefused, "refused"),
    );

    assert!(DeviceError::connection_failure("127.0.0.1:49280", refused).is_transport_failure());
    assert!(DeviceError::connection_lost("get a 0 0", "reset").is_transport_failure());
    assert!(DeviceError::transport("get a 0 0", reset).is_transport_failure());
    assert!(
        DeviceError::handshake(DeviceError::connection_lost("devstatus runmode", "reset"))
            .is_transport_failure()
    );

    assert!(!DeviceError::busy("get a 0 0").is_transport_failure());
    assert!(
        !DeviceError::command_timeout("get a 0 0", Duration::from_secs(5)).is_transport_failure()
    );
    assert!(
        !DeviceError::command_rejected("get a 0 0", "get", "UnknownAddress")
            .is_transport_failure()
    );
}

#[test]
fn given_connection_failure_when_inspected_then_keeps_io_cause() {
    let refused = TransportError::connect(
        "10.0.0.5:49280",
        IoError::new(ErrorKind::ConnectionRefused, "connection refused"),
    );

    let err = DeviceError::connection_failure("10.0.0.5:49280", refused);

    let DeviceError::ConnectionFailure {
        address, message, ..
    } = &err
    else {
        panic!("expected ConnectionFailure");
    };
    assert_eq!(address, "10.0.0.5:49280");
    assert_eq!(message, "connection refused");
    assert!(err.source().is_some());
}

#[test]
fn given_rejected_handshake_when_error_code_then_reaches_through_wrapper() {
    let err = DeviceError::handshake(DeviceError::command_rejected(
        "devstatus runmode",
        "devstatus",
        "NotReady",
    ));

    assert_eq!(err.error_code(), Some("NotReady"));
    assert!(err.source().is_some());
    assert_eq!(DeviceError::not_connected().error_code(), None);
}
