// Unit tests for the pending-command slot

use crate::device::pending::{Delivery, PendingSlot, Reply};
use crate::protocol::{ErrorResponse, Response, ValueResponse, parse_response};

fn success(line: &str) -> ValueResponse {
    match parse_response(line) {
        Ok(Response::Success(reply)) => reply,
        other => panic!("expected Success, got {other:?}"),
    }
}

fn error(line: &str) -> ErrorResponse {
    match parse_response(line) {
        Ok(Response::Error(reply)) => reply,
        other => panic!("expected Error, got {other:?}"),
    }
}

#[tokio::test]
async fn given_armed_slot_when_matching_reply_completes_then_caller_receives_it() {
    // GIVEN: A command in flight
    let slot = PendingSlot::default();
    let reply_rx = slot.arm("get MTX:Index_0 0 0");

    // WHEN: Its reply arrives
    let delivery = slot.complete(Reply::Success(success("OK get MTX:Index_0 0 0 12")));

    // THEN: The caller gets it and the slot is free again
    assert_eq!(delivery, Delivery::Delivered);
    assert!(!slot.is_armed());
    let reply = reply_rx.await.expect("reply should be delivered");
    assert!(matches!(reply, Reply::Success(r) if r.value == "12"));
}

#[test]
fn given_empty_slot_when_reply_arrives_then_unclaimed() {
    let slot = PendingSlot::default();

    let delivery = slot.complete(Reply::Success(success("OK get MTX:Index_0 0 0 12")));

    assert_eq!(delivery, Delivery::Unclaimed);
}

/// **VALUE**: Verifies a late reply to a timed-out command cannot satisfy the next one.
///
/// **WHY THIS MATTERS**: The protocol has no request ids. Without the echo check, a
/// `get` reply that arrives after its timeout would be handed to a following `set`.
///
/// **BUG THIS CATCHES**: Would catch dropping the echo comparison in `complete()`.
#[tokio::test]
async fn given_reply_for_other_verb_when_completing_then_stale_and_slot_stays_armed() {
    // GIVEN: A `set` in flight
    let slot = PendingSlot::default();
    let mut reply_rx = slot.arm("set MTX:Index_1 0 0 1");

    // WHEN: A late `get` reply shows up first
    let delivery = slot.complete(Reply::Success(success("OK get MTX:Index_0 0 0 12")));

    // THEN: It is dropped and the `set` still waits for its own reply
    assert_eq!(delivery, Delivery::Stale);
    assert!(slot.is_armed());
    assert!(reply_rx.try_recv().is_err());

    let delivery = slot.complete(Reply::Success(success("OK set MTX:Index_1 0 0 1")));
    assert_eq!(delivery, Delivery::Delivered);
    assert!(matches!(reply_rx.await, Ok(Reply::Success(r)) if r.command_name() == Some("set")));
}

/// **VALUE**: Verifies a late reply for another address of the same verb is not
/// accepted.
///
/// **BUG THIS CATCHES**: Would catch `complete()` comparing only the verb, which lets a
/// timed-out `get` on one index answer the next `get` on another.
#[test]
fn given_reply_for_other_address_when_completing_then_stale() {
    // GIVEN: A get on Index_4 in flight
    let slot = PendingSlot::default();
    let _reply_rx = slot.arm("get MTX:Index_4 0 0");

    // WHEN: A late reply to a get on Index_3 arrives
    let stale = slot.complete(Reply::Success(success("OK get MTX:Index_3 0 0 12")));
    let other_sub_index = slot.complete(Reply::Success(success("OK get MTX:Index_4 0 1 12")));

    // THEN: Neither completes the pending get
    assert_eq!(stale, Delivery::Stale);
    assert_eq!(other_sub_index, Delivery::Stale);
    assert!(slot.is_armed());
}

/// **VALUE**: Verifies a `set` reply is accepted when the appliance adjusted the value.
///
/// **WHY THIS MATTERS**: The appliance echoes the value it actually applied, which can
/// differ from the requested one after clamping.
#[tokio::test]
async fn given_set_reply_with_adjusted_value_when_completing_then_delivered() {
    // GIVEN: A set asking for a value out of range
    let slot = PendingSlot::default();
    let reply_rx = slot.arm("setn MTX:Index_2 0 0 1500");

    // WHEN: The appliance answers with the clamped value
    let delivery = slot.complete(Reply::Success(success("OK setn MTX:Index_2 0 0 1000")));

    // THEN: The caller gets the applied value
    assert_eq!(delivery, Delivery::Delivered);
    assert!(matches!(reply_rx.await, Ok(Reply::Success(r)) if r.value == "1000"));
}

#[test]
fn given_reply_shorter_than_command_when_completing_then_stale() {
    let slot = PendingSlot::default();
    let _reply_rx = slot.arm("get MTX:Index_4 0 0");

    let delivery = slot.complete(Reply::Success(success("OK get MTX:Index_4")));

    assert_eq!(delivery, Delivery::Stale);
}

#[tokio::test]
async fn given_error_reply_when_completing_then_always_delivered() {
    let slot = PendingSlot::default();
    let reply_rx = slot.arm("setn MTX:Index_9 0 0 5");

    let delivery = slot.complete(Reply::Error(error("ERROR setn InvalidArgument")));

    assert_eq!(delivery, Delivery::Delivered);
    assert!(matches!(reply_rx.await, Ok(Reply::Error(e)) if e.error_code == "InvalidArgument"));
}

#[test]
fn given_cleared_slot_when_late_reply_arrives_then_unclaimed() {
    // GIVEN: A command that gave up waiting
    let slot = PendingSlot::default();
    let _reply_rx = slot.arm("get MTX:Index_0 0 0");
    slot.clear();

    // WHEN: Its reply finally arrives
    let delivery = slot.complete(Reply::Success(success("OK get MTX:Index_0 0 0 12")));

    // THEN: Nobody claims it
    assert_eq!(delivery, Delivery::Unclaimed);
}

#[test]
fn given_dropped_receiver_when_reply_arrives_then_unclaimed() {
    let slot = PendingSlot::default();
    drop(slot.arm("get MTX:Index_0 0 0"));

    let delivery = slot.complete(Reply::Success(success("OK get MTX:Index_0 0 0 12")));

    assert_eq!(delivery, Delivery::Unclaimed);
    assert!(!slot.is_armed());
}
