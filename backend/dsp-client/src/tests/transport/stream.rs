// Unit tests for StreamTransport against a local listener

use crate::transport::StreamTransport;

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpListener;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(1);

/// **VALUE**: Verifies `reconnect()` replaces the socket and writes reach the new peer.
///
/// **BUG THIS CATCHES**: Would catch a reconnect that keeps the old write half, or one
/// that leaves the link marked down.
#[tokio::test]
async fn given_connected_transport_when_reconnecting_then_writes_go_to_new_connection() {
    // GIVEN: A connected transport
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("addr").port();
    let mut transport = StreamTransport::new("127.0.0.1", port, CONNECT_TIMEOUT);
    transport.connect().await.expect("connect");
    let (_first, _) = listener.accept().await.expect("first accept");

    // WHEN: Reconnecting and writing
    transport.reconnect().await.expect("reconnect");
    let (second, _) = listener.accept().await.expect("second accept");
    transport.write(b"devstatus runmode\n").await.expect("write");

    // THEN: The new connection carries the write and the link is up
    assert!(transport.is_connected());
    assert!(transport.take_reader().is_some());
    let mut lines = BufReader::new(second).lines();
    assert_eq!(
        lines.next_line().await.expect("read"),
        Some("devstatus runmode".to_string())
    );
}

#[tokio::test]
async fn given_never_connected_transport_when_reconnecting_then_connects() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("addr").port();
    let mut transport = StreamTransport::new("127.0.0.1", port, CONNECT_TIMEOUT);

    transport.reconnect().await.expect("reconnect");

    assert!(transport.is_connected());
}
