// Unit tests for the polling loop against a minimal local appliance

use crate::monitor::{connect_with_backoff, poll_once, run};

use dsp_client::config::{MonitorConfig, WatchedParameter};
use dsp_client::error::DeviceError;
use dsp_client::{DeviceConfig, DspDevice, ParameterValueType};

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

/// Appliance answering the handshake, devinfo and get/getn; index 99 is unknown.
async fn start_appliance() -> (u16, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("addr").port();
    let received = Arc::new(Mutex::new(Vec::new()));

    let log = Arc::clone(&received);
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let log = Arc::clone(&log);
            tokio::spawn(async move {
                let (read_half, mut write_half) = stream.into_split();
                let mut lines = BufReader::new(read_half).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    log.lock().expect("log lock").push(line.clone());
                    let reply = if line.contains("MTX:Index_99 ") {
                        "ERROR get UnknownAddress".to_string()
                    } else if line.starts_with("devinfo ") {
                        format!("OK {line} \"x\"")
                    } else if line.starts_with("devstatus ") {
                        "OK devstatus runmode \"normal\"".to_string()
                    } else {
                        format!("OK {line} 3")
                    };
                    if write_half.write_all(format!("{reply}\n").as_bytes()).await.is_err() {
                        break;
                    }
                }
            });
        }
    });

    (port, received)
}

fn device_for(port: u16) -> DspDevice {
    DspDevice::new(
        DeviceConfig::new("127.0.0.1")
            .with_port(port)
            .with_timeout(Duration::from_millis(300)),
    )
}

/// **VALUE**: Verifies one failing parameter does not stop the round.
#[tokio::test]
async fn given_one_unknown_parameter_when_polled_then_others_still_read() {
    // GIVEN: Three watched parameters, the middle one unknown to the appliance
    let (port, received) = start_appliance().await;
    let device = device_for(port);
    device.connect().await.expect("connect");
    let parameters = vec![
        WatchedParameter::new("level", 0, ParameterValueType::Normalized),
        WatchedParameter::new("ghost", 99, ParameterValueType::Raw),
        WatchedParameter::new("mute", 1, ParameterValueType::Raw),
    ];

    // WHEN: Polling once
    let results = poll_once(&device, &parameters).await;

    // THEN: Every parameter has an outcome, in order
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].outcome.as_ref().expect("level").value, "3");
    assert!(matches!(
        results[1].outcome,
        Err(DeviceError::CommandRejected { .. })
    ));
    assert_eq!(results[2].parameter.label, "mute");
    assert!(results[2].outcome.is_ok());
    assert!(received
        .lock()
        .expect("log lock")
        .contains(&"getn MTX:Index_0 0 0".to_string()));
}

#[tokio::test]
async fn given_unreachable_appliance_when_connecting_with_budget_then_gives_up() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("addr").port();
    drop(listener);
    let device = device_for(port);

    let result = connect_with_backoff(&device, Some(Duration::from_millis(200))).await;

    assert!(result.is_err());
    assert!(!device.is_connected());
}

/// **VALUE**: Verifies the loop identifies the appliance, polls, and disconnects on
/// shutdown.
#[tokio::test]
async fn given_running_monitor_when_shutdown_then_polled_and_disconnected() {
    // GIVEN: A monitor polling every second
    let (port, received) = start_appliance().await;
    let device = device_for(port);
    let config = MonitorConfig {
        poll_interval_secs: 1,
        parameters: vec![WatchedParameter::new("level", 4, ParameterValueType::Raw)],
        ..MonitorConfig::default()
    };

    // WHEN: Shutting down shortly after the first round
    run(
        &device,
        &config,
        tokio::time::sleep(Duration::from_millis(300)),
    )
    .await
    .expect("monitor run");

    // THEN: Handshake, identity, one poll, then a clean disconnect
    let received = received.lock().expect("log lock").clone();
    assert_eq!(received[0], "devstatus runmode");
    assert_eq!(
        received.iter().filter(|l| l.starts_with("devinfo ")).count(),
        7
    );
    assert_eq!(received.last().map(String::as_str), Some("get MTX:Index_4 0 0"));
    assert!(!device.is_connected());
}
