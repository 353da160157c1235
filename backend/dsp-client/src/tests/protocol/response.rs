// Unit tests for response line parsing
// Covers every response kind, quoting, whitespace and the malformed cases

use crate::error::response::ResponseError;
use crate::protocol::{Response, parse_response};

// ============================================
// SUCCESS AND NOTIFICATION LINES
// ============================================

/// **VALUE**: Verifies a plain `OK` reply yields its trailing token as the value.
///
/// **BUG THIS CATCHES**: Would catch if the value were taken from a fixed position
/// instead of the last token, which breaks replies with more address components.
#[test]
fn given_ok_line_when_parsed_then_success_with_last_token_value() {
    // GIVEN: A reply to `get MTX:Index_0 0 0`
    let line = "OK get MTX:Index_0 0 0 -1000\n";

    // WHEN: Parsing the line
    let response = parse_response(line).expect("OK line should parse");

    // THEN: It is a success carrying the last token
    let Response::Success(reply) = response else {
        panic!("expected Success, got {response:?}");
    };
    assert_eq!(reply.value, "-1000");
    assert_eq!(reply.command_name(), Some("get"));
    assert_eq!(reply.raw, "OK get MTX:Index_0 0 0 -1000");
    assert_eq!(reply.tokens.len(), 6);
}

#[test]
fn given_okm_line_when_parsed_then_success() {
    let response = parse_response("OKm getn MTX:Index_3 0 0 512").expect("OKm should parse");

    assert!(matches!(&response, Response::Success(r) if r.value == "512"));
}

/// **VALUE**: Verifies quoted values lose exactly one layer of quotes.
///
/// **WHY THIS MATTERS**: `devinfo` replies quote their strings; callers want the text.
#[test]
fn given_quoted_value_when_parsed_then_quotes_are_stripped() {
    // GIVEN: A devinfo reply with a quoted product name
    let line = "OK devinfo productname \"MRX7-D\"";

    // WHEN: Parsing
    let response = parse_response(line).expect("devinfo reply should parse");

    // THEN: The value is the bare text
    let Response::Success(reply) = response else {
        panic!("expected Success");
    };
    assert_eq!(reply.value, "MRX7-D");
    assert_eq!(reply.tokens[3], "MRX7-D");
}

#[test]
fn given_empty_quoted_value_when_parsed_then_value_is_empty_string() {
    let response = parse_response("OK devinfo devicename \"\"").expect("should parse");

    let Response::Success(reply) = response else {
        panic!("expected Success");
    };
    assert_eq!(reply.value, "");
}

/// **VALUE**: Documents that the tokenizer splits on every space, quotes included.
///
/// **BUG THIS CATCHES**: Would catch an accidental switch to a quote-aware tokenizer,
/// which would change the value of every reply containing a quoted space.
#[test]
fn given_quoted_value_with_space_when_parsed_then_only_last_fragment_is_value() {
    let response = parse_response("OK devinfo devicename \"Main Hall\"").expect("should parse");

    let Response::Success(reply) = response else {
        panic!("expected Success");
    };
    assert_eq!(reply.value, "Hall");
    assert_eq!(reply.tokens[3], "Main");
}

#[test]
fn given_notify_line_when_parsed_then_notification() {
    // GIVEN: An unsolicited push
    let line = "NOTIFY set MTX:Index_1 0 0 1";

    // WHEN: Parsing
    let response = parse_response(line).expect("NOTIFY should parse");

    // THEN: It is never classified as a reply
    let Response::Notification(notification) = response else {
        panic!("expected Notification");
    };
    assert_eq!(notification.value, "1");
    assert_eq!(notification.command_name(), Some("set"));
}

#[test]
fn given_surrounding_whitespace_when_parsed_then_trimmed() {
    let response = parse_response("  OK devstatus runmode \"normal\"\r\n").expect("should parse");

    assert_eq!(response.raw(), "OK devstatus runmode \"normal\"");
    assert!(matches!(&response, Response::Success(r) if r.value == "normal"));
}

// ============================================
// ERROR LINES
// ============================================

/// **VALUE**: Verifies the appliance's refusal is decoded into name and code.
///
/// **WHY THIS MATTERS**: Callers branch on the error code; it must survive verbatim.
#[test]
fn given_error_line_when_parsed_then_error_with_name_and_code() {
    // GIVEN: A refusal of an unknown parameter
    let line = "ERROR get UnknownAddress";

    // WHEN: Parsing
    let response = parse_response(line).expect("ERROR line should parse");

    // THEN: Command name and code are extracted
    let Response::Error(error) = response else {
        panic!("expected Error");
    };
    assert_eq!(error.command_name, "get");
    assert_eq!(error.error_code, "UnknownAddress");
    assert_eq!(error.tokens, vec!["ERROR", "get", "UnknownAddress"]);
}

#[test]
fn given_error_line_without_code_when_parsed_then_malformed() {
    let err = parse_response("ERROR get").expect_err("ERROR without code must fail");

    assert!(matches!(err, ResponseError::Malformed { .. }));
    assert!(err.to_string().contains("ERROR get"));
}

#[test]
fn given_bare_error_line_when_parsed_then_malformed() {
    let err = parse_response("ERROR").expect_err("bare ERROR must fail");

    assert!(matches!(err, ResponseError::Malformed { .. }));
}

// ============================================
// UNKNOWN LINES
// ============================================

/// **VALUE**: Verifies lines with an unknown first token are rejected with the token.
///
/// **BUG THIS CATCHES**: Would catch a parser that silently treated garbage as success,
/// which would complete the pending command with nonsense.
#[test]
fn given_unknown_kind_when_parsed_then_unknown_response_kind_error() {
    let err = parse_response("HELLO world").expect_err("unknown kind must fail");

    let ResponseError::UnknownResponseKind { kind, line, .. } = err else {
        panic!("expected UnknownResponseKind");
    };
    assert_eq!(kind, "HELLO");
    assert_eq!(line, "HELLO world");
}

#[test]
fn given_lowercase_kind_when_parsed_then_rejected() {
    // Kinds are case sensitive
    assert!(parse_response("ok get a 0 0 1").is_err());
    assert!(parse_response("notify set a 0 0 1").is_err());
}

#[test]
fn given_empty_line_when_parsed_then_unknown_response_kind_error() {
    let err = parse_response("\n").expect_err("empty line must fail");

    assert!(matches!(err, ResponseError::UnknownResponseKind { ref kind, .. } if kind.is_empty()));
}

// ============================================
// VALUE ACCESSORS
// ============================================

#[test]
fn given_integer_value_when_int_value_then_parsed() {
    let Ok(Response::Success(reply)) = parse_response("OK get MTX:Index_0 0 0 -32768") else {
        panic!("expected Success");
    };

    assert_eq!(reply.int_value().expect("integer"), -32768);
}

#[test]
fn given_non_integer_value_when_int_value_then_invalid_value() {
    let Ok(Response::Success(reply)) = parse_response("OK devinfo productname \"MRX7-D\"") else {
        panic!("expected Success");
    };

    let err = reply.int_value().expect_err("text is not an integer");
    assert!(matches!(err, ResponseError::InvalidValue { expected: "integer", .. }));
}

/// **VALUE**: Verifies flags follow the integer convention: zero is off, anything else on.
#[test]
fn given_flag_values_when_bool_value_then_non_zero_is_true() {
    let flag = |line: &str| match parse_response(line) {
        Ok(Response::Success(reply)) => reply.bool_value(),
        other => panic!("expected Success, got {other:?}"),
    };

    assert!(!flag("OK get MTX:Index_1 0 0 0").expect("0"));
    assert!(flag("OK get MTX:Index_1 0 0 1").expect("1"));
    assert!(flag("OK get MTX:Index_1 0 0 -1").expect("-1"));
    assert!(flag("OK get MTX:Index_1 0 0 on").is_err());
}

// ============================================
// TABLE: REFERENCE LINES
// ============================================

/// **VALUE**: Pins the parser to reference lines captured from a real appliance session.
#[test]
fn given_reference_lines_when_parsed_then_fields_match() {
    // OKm behaves like OK
    let Ok(Response::Success(reply)) = parse_response("OKm set MTX:Index_33 0 0 1 \"1\"") else {
        panic!("expected Success");
    };
    assert_eq!(reply.value, "1");

    // Empty quoted tokens survive as empty strings
    let Ok(Response::Success(reply)) = parse_response("OK ssinfo 0 \"\" reserve \"\" \"\"") else {
        panic!("expected Success");
    };
    assert_eq!(reply.tokens, vec!["OK", "ssinfo", "0", "", "reserve", "", ""]);
    assert_eq!(reply.value, "");

    let Ok(Response::Error(error)) = parse_response("ERROR event WrongFormat") else {
        panic!("expected Error");
    };
    assert_eq!(error.command_name, "event");
    assert_eq!(error.error_code, "WrongFormat");

    // Unquoted tokens pass through unchanged
    let Ok(Response::Success(reply)) = parse_response("OK get MTX:Index_2 0 0 42") else {
        panic!("expected Success");
    };
    assert_eq!(reply.tokens, vec!["OK", "get", "MTX:Index_2", "0", "0", "42"]);
}
