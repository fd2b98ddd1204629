//! In-memory controller for tests.
//!
//! [`MockConnector`] stands in for the WebSocket connector: every accepted
//! attempt produces a [`ControllerEnd`] that the test drives as if it were the
//! controller process.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::time::{Instant, timeout};
use url::Url;

use crate::error::{Error, Result};
use crate::transport::{Connector, FrameChannel};

const WAIT: Duration = Duration::from_secs(5);

/// Connector that hands the far end of each connection to the test.
pub(crate) struct MockConnector {
    refuse: AtomicBool,
    attempts: Mutex<Vec<Instant>>,
    sessions: mpsc::UnboundedSender<ControllerEnd>,
}

impl MockConnector {
    pub(crate) fn new() -> (Arc<Self>, Sessions) {
        let (tx, rx) = mpsc::unbounded_channel();
        let connector = Arc::new(Self {
            refuse: AtomicBool::new(false),
            attempts: Mutex::new(Vec::new()),
            sessions: tx,
        });
        (connector, Sessions { rx })
    }

    /// Makes subsequent attempts fail.
    pub(crate) fn refuse(&self, refuse: bool) {
        self.refuse.store(refuse, Ordering::SeqCst);
    }

    /// Number of attempts seen so far.
    pub(crate) fn attempts(&self) -> usize {
        self.attempts.lock().len()
    }

    /// Gaps between consecutive attempts.
    pub(crate) fn attempt_gaps(&self) -> Vec<Duration> {
        self.attempts
            .lock()
            .windows(2)
            .map(|w| w[1].duration_since(w[0]))
            .collect()
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self, _endpoint: &Url) -> Result<FrameChannel> {
        self.attempts.lock().push(Instant::now());

        if self.refuse.load(Ordering::SeqCst) {
            return Err(Error::connection("connection refused"));
        }

        let (outgoing, frames) = mpsc::unbounded_channel();
        let (commands, incoming) = mpsc::unbounded_channel();
        let _ = self.sessions.send(ControllerEnd { frames, commands });

        Ok(FrameChannel { outgoing, incoming })
    }
}

/// Stream of accepted connections.
pub(crate) struct Sessions {
    rx: mpsc::UnboundedReceiver<ControllerEnd>,
}

impl Sessions {
    pub(crate) async fn accept(&mut self) -> ControllerEnd {
        timeout(WAIT, self.rx.recv())
            .await
            .expect("no connection within timeout")
            .expect("connector dropped")
    }

    pub(crate) fn try_accept(&mut self) -> Option<ControllerEnd> {
        self.rx.try_recv().ok()
    }
}

/// Controller side of one connection.
pub(crate) struct ControllerEnd {
    frames: mpsc::UnboundedReceiver<String>,
    commands: mpsc::UnboundedSender<String>,
}

impl ControllerEnd {
    /// Next envelope, `None` on close or timeout.
    pub(crate) async fn next_envelope(&mut self) -> Option<Value> {
        let frame = timeout(WAIT, self.frames.recv()).await.ok()??;
        Some(serde_json::from_str(&frame).expect("bridge sent invalid JSON"))
    }

    pub(crate) async fn expect_envelope(&mut self) -> Value {
        self.next_envelope().await.expect("expected an envelope")
    }

    /// Sends a raw frame to the bridge.
    pub(crate) fn send_raw(&self, frame: impl Into<String>) {
        self.commands.send(frame.into()).expect("bridge reader gone");
    }

    pub(crate) fn send_command(&self, command: Value) {
        self.send_raw(command.to_string());
    }

    /// Drops the connection from the controller side.
    pub(crate) fn hang_up(self) {}
}
