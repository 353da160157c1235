use dsp_client::error::TransportError;

use std::io::{Error as IoError, ErrorKind};

#[test]
fn given_reset_class_io_errors_when_classified_then_connection_reset() {
    for kind in [
        ErrorKind::ConnectionReset,
        ErrorKind::ConnectionAborted,
        ErrorKind::BrokenPipe,
        ErrorKind::NotConnected,
        ErrorKind::UnexpectedEof,
    ] {
        let err = TransportError::from(IoError::new(kind, "gone"));
        assert!(err.is_connection_reset(), "{kind:?} should count as reset");
        assert!(!err.is_recoverable());
    }
}

#[test]
fn given_other_errors_when_classified_then_not_connection_reset() {
    let timed_out = TransportError::from(IoError::new(ErrorKind::TimedOut, "slow"));
    let refused = TransportError::connect(
        "127.0.0.1:1",
        IoError::new(ErrorKind::ConnectionRefused, "refused"),
    );

    assert!(!timed_out.is_connection_reset());
    assert!(!refused.is_connection_reset());
    assert!(TransportError::not_connected().is_connection_reset());
}

/// **VALUE**: Verifies `?` on an `io::Error` records where the conversion happened.
#[test]
fn given_io_error_when_converted_then_keeps_kind_and_location() {
    let err = TransportError::from(IoError::new(ErrorKind::BrokenPipe, "pipe closed"));

    let TransportError::Io { kind, message, .. } = &err else {
        panic!("expected Io");
    };
    assert_eq!(*kind, ErrorKind::BrokenPipe);
    assert_eq!(message, "pipe closed");
    assert!(err.to_string().contains("integration_tests"));
}
