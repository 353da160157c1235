// Unit tests for LineReader

use crate::error::transport::TransportError;
use crate::transport::LineReader;

use tokio::io::AsyncWriteExt;

#[tokio::test]
async fn given_several_lines_when_reading_then_each_includes_delimiter() {
    // GIVEN: Two complete lines in one buffer
    let mut reader = LineReader::new(&b"OK get a 0 0 1\nNOTIFY set a 0 0 2\n"[..]);

    // WHEN/THEN: They come out one at a time, then end of stream
    assert_eq!(
        reader.read_line("\n").await.expect("read"),
        Some("OK get a 0 0 1\n".to_string())
    );
    assert_eq!(
        reader.read_line("\n").await.expect("read"),
        Some("NOTIFY set a 0 0 2\n".to_string())
    );
    assert_eq!(reader.read_line("\n").await.expect("read"), None);
}

/// **VALUE**: Verifies a multi-byte delimiter only ends a line when fully matched.
///
/// **BUG THIS CATCHES**: Would catch splitting on the delimiter's last byte alone,
/// which breaks lines containing a bare `\n` when the delimiter is `\r\n`.
#[tokio::test]
async fn given_multi_byte_delimiter_when_reading_then_bare_last_byte_does_not_split() {
    let mut reader = LineReader::new(&b"first\nstill first\r\nsecond\r\n"[..]);

    assert_eq!(
        reader.read_line("\r\n").await.expect("read"),
        Some("first\nstill first\r\n".to_string())
    );
    assert_eq!(
        reader.read_line("\r\n").await.expect("read"),
        Some("second\r\n".to_string())
    );
}

#[tokio::test]
async fn given_unterminated_tail_when_stream_ends_then_returns_none() {
    let mut reader = LineReader::new(&b"OK get a 0 0 1\nOK get a 0"[..]);

    assert!(reader.read_line("\n").await.expect("read").is_some());
    assert_eq!(reader.read_line("\n").await.expect("read"), None);
}

#[tokio::test]
async fn given_line_split_across_writes_when_reading_then_reassembled() {
    // GIVEN: A pipe fed in fragments
    let (client, mut server) = tokio::io::duplex(64);
    let mut reader = LineReader::new(client);

    let writer = tokio::spawn(async move {
        server.write_all(b"OK devinfo ").await.expect("write");
        tokio::task::yield_now().await;
        server.write_all(b"serialno \"Y123\"\n").await.expect("write");
    });

    // WHEN: Reading one line
    let line = reader.read_line("\n").await.expect("read");

    // THEN: The fragments form one line
    assert_eq!(line, Some("OK devinfo serialno \"Y123\"\n".to_string()));
    writer.await.expect("writer task");
}

#[tokio::test]
async fn given_invalid_utf8_when_reading_then_decode_error_and_next_line_still_readable() {
    let mut reader = LineReader::new(&b"\xff\xfe\nOK get a 0 0 1\n"[..]);

    let err = reader.read_line("\n").await.expect_err("invalid UTF-8");
    assert!(matches!(err, TransportError::Decode { .. }));
    assert!(err.is_recoverable());

    assert_eq!(
        reader.read_line("\n").await.expect("read"),
        Some("OK get a 0 0 1\n".to_string())
    );
}

#[tokio::test]
async fn given_empty_delimiter_when_reading_then_decode_error() {
    let mut reader = LineReader::new(&b"anything\n"[..]);

    let err = reader.read_line("").await.expect_err("empty delimiter");

    assert!(matches!(err, TransportError::Decode { .. }));
}

/// **VALUE**: Verifies a peer that never sends a delimiter cannot grow the buffer
/// without bound.
///
/// **BUG THIS CATCHES**: Would catch `read_line()` accumulating until the delimiter
/// arrives, or losing sync with the stream after an oversized line.
#[tokio::test]
async fn given_unterminated_flood_when_reading_then_decode_error_and_next_line_still_readable() {
    // GIVEN: A reader capped at 16 bytes and 40 bytes with no newline
    let (client, mut server) = tokio::io::duplex(64);
    let mut reader = LineReader::with_max_line_length(client, 16);
    server.write_all(&[b'x'; 40]).await.expect("write");

    // WHEN: Reading
    let err = reader.read_line("\n").await.expect_err("line too long");

    // THEN: The limit is reported without waiting for a newline
    assert!(matches!(err, TransportError::Decode { .. }));
    assert!(err.is_recoverable());

    // AND: The rest of the long line is skipped, the next line comes out whole
    server
        .write_all(b"more junk\nOK get a 0 0 1\n")
        .await
        .expect("write");
    assert_eq!(
        reader.read_line("\n").await.expect("read"),
        Some("OK get a 0 0 1\n".to_string())
    );
}

#[tokio::test]
async fn given_complete_line_over_limit_when_reading_then_decode_error_and_next_line_readable() {
    let mut reader = LineReader::with_max_line_length(&b"0123456789abcdefghij\nOK x\n"[..], 16);

    let err = reader.read_line("\n").await.expect_err("line too long");
    assert!(matches!(err, TransportError::Decode { .. }));

    assert_eq!(
        reader.read_line("\n").await.expect("read"),
        Some("OK x\n".to_string())
    );
}
