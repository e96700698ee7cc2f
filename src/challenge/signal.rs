//! Operator clearance signals

use async_trait::async_trait;
use std::io::BufRead;
use tokio::sync::{mpsc, Mutex};

/// Source of the "challenge solved" signal
#[async_trait]
pub trait ClearanceSignal: Send + Sync {
    /// Resolves once the operator reports the challenge at `url` solved
    async fn wait_for_clearance(&self, url: &str);
}

/// Prompts on the console and waits for Enter
///
/// Lines are read on a dedicated thread started on first use, so a pending
/// read never holds up runtime shutdown.
#[derive(Default)]
pub struct ConsoleSignal {
    presses: Mutex<Option<mpsc::UnboundedReceiver<()>>>,
}

impl ConsoleSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads presses from `input` instead of stdin
    pub fn from_reader<R: BufRead + Send + 'static>(input: R) -> Self {
        Self {
            presses: Mutex::new(spawn_reader(input)),
        }
    }
}

/// Forwards one unit per line of `input` until it ends or nobody listens
fn spawn_reader<R: BufRead + Send + 'static>(input: R) -> Option<mpsc::UnboundedReceiver<()>> {
    let (sender, receiver) = mpsc::unbounded_channel();
    let spawned = std::thread::Builder::new()
        .name("clearance-input".to_string())
        .spawn(move || {
            for line in input.lines() {
                if let Err(e) = line {
                    tracing::warn!(error = %e, "Failed to read clearance input");
                    break;
                }
                if sender.send(()).is_err() {
                    break;
                }
            }
        });

    match spawned {
        Ok(_) => Some(receiver),
        Err(e) => {
            tracing::error!(error = %e, "Failed to start clearance input reader");
            None
        }
    }
}

#[async_trait]
impl ClearanceSignal for ConsoleSignal {
    async fn wait_for_clearance(&self, url: &str) {
        println!("\n{}", "=".repeat(60));
        println!("HUMAN VERIFICATION DETECTED at {}", url);
        println!("Solve it in the browser session, then press Enter here to continue...");
        println!("{}", "=".repeat(60));

        let mut presses = self.presses.lock().await;
        if presses.is_none() {
            *presses = spawn_reader(std::io::BufReader::new(std::io::stdin()));
        }
        let Some(receiver) = presses.as_mut() else {
            return;
        };
        if receiver.recv().await.is_none() {
            tracing::warn!("stdin closed while waiting for clearance");
        }
    }
}

/// Clearance delivered through a channel, for embedding and tests
///
/// A closed channel never clears; pair it with a bounded wait.
pub struct ChannelSignal {
    receiver: Mutex<mpsc::Receiver<()>>,
}

impl ChannelSignal {
    /// Creates the signal and the sender that resolves it
    pub fn new() -> (mpsc::Sender<()>, Self) {
        let (sender, receiver) = mpsc::channel(8);
        (
            sender,
            Self {
                receiver: Mutex::new(receiver),
            },
        )
    }
}

#[async_trait]
impl ClearanceSignal for ChannelSignal {
    async fn wait_for_clearance(&self, url: &str) {
        tracing::info!(url = %url, "Waiting for clearance signal");
        let mut receiver = self.receiver.lock().await;
        if receiver.recv().await.is_none() {
            tracing::warn!("Clearance channel closed; waiting indefinitely");
            std::future::pending::<()>().await;
        }
    }
}
