use crate::device_tests::helpers::{FakeAppliance, Scripted, TEST_TIMEOUT, standard_reply};

use dsp_client::error::DeviceError;
use dsp_client::protocol::ValueResponse;
use dsp_client::{DspDevice, ParameterAddress};

use std::sync::{Arc, Mutex};
use std::time::Duration;

/// **VALUE**: Verifies a reply-less command times out without dropping the connection.
#[tokio::test]
async fn given_appliance_ignores_command_when_run_then_timeout_and_connection_kept() {
    // GIVEN: An appliance that never answers one address
    let appliance = FakeAppliance::start_with(|command| match command {
        "get MTX:Index_5 0 0" => Scripted::Silence,
        other => standard_reply(other),
    })
    .await;
    let device = DspDevice::new(appliance.device_config());
    device.connect().await.expect("connect");

    // WHEN: Querying that address
    let err = device
        .run_command("get MTX:Index_5 0 0")
        .await
        .expect_err("no reply");

    // THEN: Timeout, and the same connection keeps working
    assert!(matches!(
        err,
        DeviceError::CommandTimeout { timeout, .. } if timeout == TEST_TIMEOUT
    ));
    assert!(device.is_connected());
    device
        .run_command("get MTX:Index_6 0 0")
        .await
        .expect("next command on the same connection");
    assert_eq!(appliance.connections(), 1);
}

/// **VALUE**: Verifies a late reply cannot be mistaken for the next command's reply.
///
/// **WHY THIS MATTERS**: Without request ids, the only guard is the echoed command.
///
/// **BUG THIS CATCHES**: Would catch a `set` returning the value of an earlier `get`.
#[tokio::test]
async fn given_late_reply_to_timed_out_get_when_set_runs_then_set_gets_its_own_reply() {
    // GIVEN: An appliance that answers one get only after the client gave up
    let late = TEST_TIMEOUT + Duration::from_millis(150);
    let appliance = FakeAppliance::start_with(move |command| match command {
        "get MTX:Index_3 0 0" => {
            Scripted::Delayed(late, vec!["OK get MTX:Index_3 0 0 -999".to_string()])
        }
        other => standard_reply(other),
    })
    .await;
    let device = DspDevice::new(appliance.device_config());
    device.connect().await.expect("connect");

    let err = device
        .run_command("get MTX:Index_3 0 0")
        .await
        .expect_err("reply comes too late");
    assert!(matches!(err, DeviceError::CommandTimeout { .. }));

    // WHEN: A set is sent while the late get reply is still on its way
    let reply = device
        .run_command("set MTX:Index_3 0 0 5")
        .await
        .expect("set should get its own reply");

    // THEN: The set sees its echo, not the stale value
    assert_eq!(reply.command_name(), Some("set"));
    assert_eq!(reply.value, "5");
}

/// **VALUE**: Verifies a late reply for one index cannot answer a query on another.
///
/// **WHY THIS MATTERS**: Polling reads the same verb over many indices, so a verb match
/// alone would hand one parameter's value to the next.
///
/// **BUG THIS CATCHES**: Would catch reply matching that ignores the echoed address.
#[tokio::test]
async fn given_late_reply_to_timed_out_get_when_get_on_other_index_runs_then_own_reply() {
    // GIVEN: An appliance that answers Index_3 only after the client gave up
    let late = TEST_TIMEOUT + Duration::from_millis(150);
    let appliance = FakeAppliance::start_with(move |command| match command {
        "get MTX:Index_3 0 0" => {
            Scripted::Delayed(late, vec!["OK get MTX:Index_3 0 0 -999".to_string()])
        }
        "get MTX:Index_4 0 0" => Scripted::line("OK get MTX:Index_4 0 0 7"),
        other => standard_reply(other),
    })
    .await;
    let device = DspDevice::new(appliance.device_config());
    device.connect().await.expect("connect");

    let err = device
        .run_command("get MTX:Index_3 0 0")
        .await
        .expect_err("reply comes too late");
    assert!(matches!(err, DeviceError::CommandTimeout { .. }));

    // WHEN: A get on Index_4 is in flight when the Index_3 reply lands
    let reply = device
        .run_command("get MTX:Index_4 0 0")
        .await
        .expect("get should get its own reply");

    // THEN: It sees its own address and value
    assert_eq!(reply.tokens[2], "MTX:Index_4");
    assert_eq!(reply.value, "7");
}

/// **VALUE**: Verifies a notification arriving mid-command goes to the handler only.
///
/// **BUG THIS CATCHES**: Would catch `NOTIFY` lines completing the pending command.
#[tokio::test]
async fn given_notification_before_reply_when_command_runs_then_handler_gets_notification() {
    // GIVEN: An appliance that pushes a change right before answering
    let appliance = FakeAppliance::start_with(|command| match command {
        "get MTX:Index_0 0 0" => Scripted::Lines(vec![
            "NOTIFY set MTX:Index_1 0 0 1".to_string(),
            "OK get MTX:Index_0 0 0 42".to_string(),
        ]),
        other => standard_reply(other),
    })
    .await;
    let notifications = Arc::new(Mutex::new(Vec::<String>::new()));
    let device = {
        let notifications = Arc::clone(&notifications);
        DspDevice::with_notification_handler(
            appliance.device_config(),
            move |notification: &ValueResponse| {
                notifications
                    .lock()
                    .expect("notifications lock")
                    .push(notification.raw.clone());
            },
        )
    };
    device.connect().await.expect("connect");

    // WHEN: Running the command
    let reply = device
        .run_command("get MTX:Index_0 0 0")
        .await
        .expect("reply");

    // THEN: The command got its reply, the handler got the push
    assert_eq!(reply.value, "42");
    assert_eq!(
        *notifications.lock().expect("notifications lock"),
        vec!["NOTIFY set MTX:Index_1 0 0 1"]
    );
}

#[tokio::test]
async fn given_garbage_before_reply_when_command_runs_then_garbage_is_skipped() {
    let appliance = FakeAppliance::start_with(|command| match command {
        "get MTX:Index_0 0 0" => Scripted::Lines(vec![
            "this is not a response".to_string(),
            "ERROR".to_string(),
            String::new(),
            "OK get MTX:Index_0 0 0 7".to_string(),
        ]),
        other => standard_reply(other),
    })
    .await;
    let device = DspDevice::new(appliance.device_config());
    device.connect().await.expect("connect");

    let reply = device
        .run_command("get MTX:Index_0 0 0")
        .await
        .expect("reply after garbage");

    assert_eq!(reply.int_value().expect("integer"), 7);
}

/// **VALUE**: Verifies concurrent callers are serialized: one command on the wire at a
/// time, each caller getting the reply to its own command.
///
/// **WHY THIS MATTERS**: This is the core correctness property of the client. Replies
/// carry no ids, so a second command in flight would make the pairing ambiguous.
///
/// **BUG THIS CATCHES**: Would catch the session lock being released before the reply
/// arrives, or replies being routed to the wrong waiter.
#[tokio::test]
async fn given_concurrent_callers_when_running_commands_then_serialized_and_correctly_paired() {
    // GIVEN: An appliance that answers each index with the index itself, slowly
    let appliance = FakeAppliance::start_with(|command| {
        let mut words = command.split(' ');
        match (words.next(), words.next()) {
            (Some("get"), Some(name)) => {
                let index = name.trim_start_matches("MTX:Index_");
                Scripted::Delayed(
                    Duration::from_millis(20),
                    vec![format!("OK {command} {index}")],
                )
            }
            _ => standard_reply(command),
        }
    })
    .await;
    let device = Arc::new(DspDevice::new(appliance.device_config()));
    device.connect().await.expect("connect");

    // WHEN: Eight tasks query at once
    let tasks: Vec<_> = (0..8u32)
        .map(|index| {
            let device = Arc::clone(&device);
            tokio::spawn(async move {
                let reply = device
                    .query_parameter_raw(&ParameterAddress::matrix_index(index))
                    .await
                    .expect("query");
                (index, reply.int_value().expect("integer"))
            })
        })
        .collect();

    // THEN: Every caller got its own value and the wire never carried two commands
    for task in tasks {
        let (index, value) = task.await.expect("task");
        assert_eq!(value, i64::from(index));
    }
    assert_eq!(appliance.max_in_flight(), 1);
    assert_eq!(appliance.received().len(), 9);
}

#[tokio::test]
async fn given_command_in_flight_when_try_run_command_then_busy() {
    // GIVEN: A slow reply keeping one command in flight
    let appliance = FakeAppliance::start_with(|command| match command {
        "get MTX:Index_0 0 0" => Scripted::Delayed(
            Duration::from_millis(150),
            vec!["OK get MTX:Index_0 0 0 1".to_string()],
        ),
        other => standard_reply(other),
    })
    .await;
    let device = Arc::new(DspDevice::new(appliance.device_config()));
    device.connect().await.expect("connect");

    let slow = {
        let device = Arc::clone(&device);
        tokio::spawn(async move { device.run_command("get MTX:Index_0 0 0").await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    // WHEN: Another caller refuses to wait
    let err = device
        .try_run_command("get MTX:Index_1 0 0")
        .await
        .expect_err("line is busy");

    // THEN: Busy, and the first command still completes
    assert!(matches!(err, DeviceError::Busy { .. }));
    assert_eq!(err.error_category(), "busy");
    slow.await.expect("task").expect("slow command");
    assert!(!appliance.received().contains(&"get MTX:Index_1 0 0".to_string()));
}

#[tokio::test]
async fn given_idle_device_when_try_run_command_then_runs() {
    let appliance = FakeAppliance::start().await;
    let device = DspDevice::new(appliance.device_config());
    device.connect().await.expect("connect");

    let reply = device
        .try_run_command("get MTX:Index_4 0 0")
        .await
        .expect("idle device runs immediately");

    assert_eq!(reply.value, "0");
}
