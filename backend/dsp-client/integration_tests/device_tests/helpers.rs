//! Test helpers for device integration tests.
//!
//! This module provides an in-process fake appliance:
//! - Listens on an ephemeral localhost port
//! - Answers each received line through a script
//! - Records received commands and counts connections
//! - Tracks how many commands were in flight at once
//! - Can end a connection cleanly or with a TCP reset

use dsp_client::DeviceConfig;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// Timeout used by test clients unless a test needs something else.
pub const TEST_TIMEOUT: Duration = Duration::from_millis(300);

/// What the fake appliance does with one received line.
pub enum Scripted {
    /// Write these lines, each followed by `\n`.
    Lines(Vec<String>),
    /// Wait, then write these lines.
    Delayed(Duration, Vec<String>),
    /// Never answer.
    Silence,
    /// Close the connection without answering.
    Hangup,
    /// Abort the connection with a TCP reset instead of a clean close.
    Reset,
}

impl Scripted {
    pub fn line(line: impl Into<String>) -> Self {
        Scripted::Lines(vec![line.into()])
    }
}

type Script = Arc<dyn Fn(&str) -> Scripted + Send + Sync>;

/// The answers a well-behaved appliance gives.
pub fn standard_reply(command: &str) -> Scripted {
    let mut words = command.split(' ');
    match words.next() {
        Some("devstatus") => Scripted::line("OK devstatus runmode \"normal\""),
        Some("devinfo") => {
            let field = words.next().unwrap_or_default();
            let value = match field {
                "protocolver" => "3.0.0",
                "paramsetver" => "1.2.0",
                "version" => "V4.10",
                "productname" => "MRX7-D",
                "serialno" => "Y000001",
                "deviceid" => "0x0F",
                "devicename" => "MainHall",
                _ => return Scripted::line("ERROR devinfo UnknownAddress"),
            };
            Scripted::line(format!("OK devinfo {field} \"{value}\""))
        }
        Some("get") | Some("getn") => Scripted::line(format!("OK {command} 0")),
        Some("set") | Some("setn") => Scripted::line(format!("OK {command}")),
        Some(verb) => Scripted::line(format!("ERROR {verb} UnknownCommand")),
        None => Scripted::Silence,
    }
}

pub struct FakeAppliance {
    pub port: u16,
    received: Arc<Mutex<Vec<String>>>,
    connections: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    accept_task: JoinHandle<()>,
}

impl FakeAppliance {
    /// Start an appliance answering with [`standard_reply`].
    pub async fn start() -> Self {
        Self::start_with(standard_reply).await
    }

    /// Start an appliance answering through `script`.
    pub async fn start_with(script: impl Fn(&str) -> Scripted + Send + Sync + 'static) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake appliance");
        let port = listener.local_addr().expect("local addr").port();

        let script: Script = Arc::new(script);
        let received = Arc::new(Mutex::new(Vec::new()));
        let connections = Arc::new(AtomicUsize::new(0));
        let max_in_flight = Arc::new(AtomicUsize::new(0));

        let accept_task = {
            let received = Arc::clone(&received);
            let connections = Arc::clone(&connections);
            let max_in_flight = Arc::clone(&max_in_flight);

            tokio::spawn(async move {
                while let Ok((stream, _)) = listener.accept().await {
                    connections.fetch_add(1, Ordering::SeqCst);
                    tokio::spawn(serve(
                        stream,
                        Arc::clone(&script),
                        Arc::clone(&received),
                        Arc::clone(&max_in_flight),
                    ));
                }
            })
        };

        Self {
            port,
            received,
            connections,
            max_in_flight,
            accept_task,
        }
    }

    pub fn device_config(&self) -> DeviceConfig {
        DeviceConfig::new("127.0.0.1")
            .with_port(self.port)
            .with_timeout(TEST_TIMEOUT)
    }

    /// Every line received so far, across all connections.
    pub fn received(&self) -> Vec<String> {
        self.received.lock().expect("received lock").clone()
    }

    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl Drop for FakeAppliance {
    fn drop(&mut self) {
        self.accept_task.abort();
    }
}

async fn serve(
    stream: tokio::net::TcpStream,
    script: Script,
    received: Arc<Mutex<Vec<String>>>,
    max_in_flight: Arc<AtomicUsize>,
) {
    let (read_half, mut write_half) = stream.into_split();
    let in_flight = Arc::new(AtomicUsize::new(0));
    let (line_tx, mut line_rx) = mpsc::unbounded_channel::<String>();
    let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

    // Reads independently of replies so a client that pipelines is visible. Hands the
    // read half back when stopped so the socket can be reassembled for a reset.
    let reader = {
        let in_flight = Arc::clone(&in_flight);
        tokio::spawn(async move {
            let mut lines = BufReader::new(read_half).lines();
            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    line = lines.next_line() => {
                        let Ok(Some(line)) = line else { break };
                        received.lock().expect("received lock").push(line.clone());
                        let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                        max_in_flight.fetch_max(now, Ordering::SeqCst);
                        if line_tx.send(line).is_err() {
                            break;
                        }
                    }
                }
            }
            lines.into_inner().into_inner()
        })
    };

    let mut reset = false;
    while let Some(line) = line_rx.recv().await {
        let lines = match script(&line) {
            Scripted::Lines(lines) => lines,
            Scripted::Delayed(delay, lines) => {
                tokio::time::sleep(delay).await;
                lines
            }
            Scripted::Silence => Vec::new(),
            Scripted::Hangup => break,
            Scripted::Reset => {
                reset = true;
                break;
            }
        };
        in_flight.fetch_sub(1, Ordering::SeqCst);

        for reply in lines {
            if write_half
                .write_all(format!("{reply}\n").as_bytes())
                .await
                .is_err()
            {
                break;
            }
        }
    }

    let _ = stop_tx.send(());
    let Ok(read_half) = reader.await else {
        return;
    };

    if reset {
        if let Ok(stream) = read_half.reunite(write_half) {
            // Zero linger turns the close into an RST
            let _ = stream.set_zero_linger();
        }
    } else {
        drop(read_half);
        let _ = write_half.shutdown().await;
    }
}
