//! Bridge event loop and host handle.
//!
//! A spawned controller task owns the transport, the outbound queue and the
//! retry budget. Everything else talks to it through one input channel:
//! the host via [`BridgeHandle`], observers via
//! [`ChangeNotifier`](crate::page::ChangeNotifier), and page send tasks that
//! post their responses back.

// ============================================================================
// Imports
// ============================================================================

use std::mem;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::identifiers::ConnectionId;
use crate::page::{ChangeNotifier, PageObserver, PageStateProvider};
use crate::protocol::{Command, Envelope};
use crate::transport::{ConnectionState, OutboundQueue, TransportEvent, TransportManager};

use super::builder::BridgeBuilder;
use super::dispatcher::CommandDispatcher;

// ============================================================================
// Constants
// ============================================================================

/// Message carried by the `test` envelope of [`BridgeHandle::self_test`].
pub const SELF_TEST_MESSAGE: &str = "Bridge self-test";

// ============================================================================
// Types
// ============================================================================

/// Page visibility as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    /// Page is in the foreground.
    #[default]
    Visible,
    /// Page is in a background tab or minimized.
    Hidden,
}

/// Snapshot of the bridge, answered by the event loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BridgeStatus {
    /// Connection state.
    pub state: ConnectionState,
    /// Envelopes waiting in the outbound queue.
    pub queued: usize,
    /// Automatic reconnect attempts since the last success.
    pub attempts: u32,
    /// Id of the live connection.
    pub connection: Option<ConnectionId>,
}

/// Messages consumed by the event loop.
#[derive(Debug)]
pub(crate) enum Input {
    Connect,
    PageLoaded,
    Visibility(Visibility),
    PageChanged,
    Unload,
    Send(Envelope),
    Dispatch(Command),
    Status(oneshot::Sender<BridgeStatus>),
}

// ============================================================================
// BridgeHandle
// ============================================================================

/// Cloneable handle to a running bridge.
///
/// Every method fails with [`Error::BridgeStopped`] once the event loop has
/// ended. The loop also ends when the last handle is dropped.
#[derive(Debug, Clone)]
pub struct BridgeHandle {
    inputs: mpsc::UnboundedSender<Input>,
}

impl BridgeHandle {
    pub(crate) fn new(inputs: mpsc::UnboundedSender<Input>) -> Self {
        Self { inputs }
    }

    /// Starts a fresh connection attempt, replacing any current one.
    ///
    /// Also the way to resume after automatic retries ran out.
    pub fn connect(&self) -> Result<()> {
        self.post(Input::Connect)
    }

    /// Reports that the page finished loading.
    pub fn page_loaded(&self) -> Result<()> {
        self.post(Input::PageLoaded)
    }

    /// Reports a page visibility change.
    pub fn set_visibility(&self, visibility: Visibility) -> Result<()> {
        self.post(Input::Visibility(visibility))
    }

    /// Reports that the page is going away. Stops the bridge.
    pub fn unload(&self) -> Result<()> {
        self.post(Input::Unload)
    }

    /// Reports that the room may have changed.
    pub fn notify_page_changed(&self) -> Result<()> {
        self.post(Input::PageChanged)
    }

    /// Sends an envelope to the controller, queueing it while offline.
    pub fn send(&self, envelope: impl Into<Envelope>) -> Result<()> {
        self.post(Input::Send(envelope.into()))
    }

    /// Runs a command as if the controller had sent it.
    ///
    /// The response goes to the controller.
    pub fn dispatch(&self, command: Command) -> Result<()> {
        self.post(Input::Dispatch(command))
    }

    /// Sends a `test` envelope.
    pub fn self_test(&self) -> Result<()> {
        self.send(Envelope::test(SELF_TEST_MESSAGE))
    }

    /// Current bridge status.
    pub async fn status(&self) -> Result<BridgeStatus> {
        let (tx, rx) = oneshot::channel();
        self.post(Input::Status(tx))?;
        rx.await.map_err(|_| Error::BridgeStopped)
    }

    /// Returns `true` while the event loop is running.
    #[inline]
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.inputs.is_closed()
    }

    fn post(&self, input: Input) -> Result<()> {
        self.inputs.send(input).map_err(|_| Error::BridgeStopped)
    }
}

// ============================================================================
// Bridge
// ============================================================================

/// Running bridge: the event loop task plus a handle to it.
#[derive(Debug)]
pub struct Bridge {
    handle: BridgeHandle,
    task: JoinHandle<()>,
}

impl Bridge {
    /// Creates a configuration builder.
    #[inline]
    #[must_use]
    pub fn builder() -> BridgeBuilder {
        BridgeBuilder::new()
    }

    pub(crate) fn new(handle: BridgeHandle, task: JoinHandle<()>) -> Self {
        Self { handle, task }
    }

    /// Returns a new handle to the bridge.
    #[inline]
    #[must_use]
    pub fn handle(&self) -> BridgeHandle {
        self.handle.clone()
    }

    /// Unloads the bridge and waits for the event loop to finish.
    pub async fn shutdown(self) {
        let _ = self.handle.unload();
        if let Err(e) = self.task.await {
            warn!(error = %e, "Bridge task ended abnormally");
        }
    }
}

impl std::ops::Deref for Bridge {
    type Target = BridgeHandle;

    fn deref(&self) -> &BridgeHandle {
        &self.handle
    }
}

// ============================================================================
// Controller
// ============================================================================

/// Event loop state. Lives on the spawned task only.
pub(crate) struct Controller {
    pub(crate) transport: TransportManager,
    pub(crate) queue: OutboundQueue,
    pub(crate) dispatcher: Arc<CommandDispatcher>,
    pub(crate) state: Arc<dyn PageStateProvider>,
    pub(crate) observer: Option<Arc<dyn PageObserver>>,
    pub(crate) inputs: mpsc::UnboundedReceiver<Input>,
    pub(crate) loopback: mpsc::WeakUnboundedSender<Input>,
    pub(crate) events: mpsc::UnboundedReceiver<TransportEvent>,
    pub(crate) visibility: Visibility,
    pub(crate) started: bool,
}

impl Controller {
    /// Runs until unload or until every handle is gone.
    pub(crate) async fn run(mut self, page_loaded: bool) {
        if page_loaded {
            self.start();
        }

        loop {
            tokio::select! {
                input = self.inputs.recv() => match input {
                    Some(Input::Unload) => {
                        info!("Page unloading, stopping bridge");
                        break;
                    }
                    Some(input) => self.on_input(input).await,
                    None => {
                        debug!("All bridge handles dropped");
                        break;
                    }
                },

                Some(event) = self.events.recv() => self.on_transport(event).await,
            }
        }

        self.stop();
    }

    fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;

        self.transport.connect();

        if let Some(observer) = &self.observer {
            observer.observe(ChangeNotifier::new(self.loopback.clone()));
        }
    }

    fn stop(&mut self) {
        self.transport.close();

        let discarded = self.queue.drain().len();
        if discarded > 0 {
            warn!(discarded, "Discarding queued envelopes");
        }
        debug!("Bridge stopped");
    }

    async fn on_input(&mut self, input: Input) {
        match input {
            Input::Connect => self.transport.connect(),

            Input::PageLoaded => self.start(),

            Input::Visibility(visibility) => {
                let previous = mem::replace(&mut self.visibility, visibility);
                if previous == Visibility::Hidden
                    && visibility == Visibility::Visible
                    && self.transport.state() != ConnectionState::Connected
                {
                    debug!(state = ?self.transport.state(), "Page visible again, reconnecting");
                    self.transport.connect();
                }
            }

            Input::PageChanged => {
                let room = self.state.room_info().await;
                self.enqueue(Envelope::state_update(room));
            }

            Input::Send(envelope) => self.enqueue(envelope),

            Input::Dispatch(command) => self.run_command(command).await,

            Input::Status(reply) => {
                let _ = reply.send(BridgeStatus {
                    state: self.transport.state(),
                    queued: self.queue.len(),
                    attempts: self.transport.attempts(),
                    connection: self.transport.connection(),
                });
            }

            // Handled by the loop itself.
            Input::Unload => {}
        }
    }

    async fn on_transport(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Established { id, channel } => {
                if !self.transport.on_established(id, channel) {
                    return;
                }

                let user = self.state.user_info().await;
                let room = self.state.room_info().await;
                self.queue
                    .announce(&mut self.transport, Envelope::connected(user, room));
                self.queue.flush(&mut self.transport);
            }

            TransportEvent::Failed { id, error } => {
                debug!(%id, error = %error, "Connection attempt failed");
                self.transport.on_lost(id);
            }

            TransportEvent::Frame { id, text } => {
                if !self.transport.accepts(id) {
                    debug!(%id, "Ignoring frame from superseded connection");
                    return;
                }
                if let Some(command) = CommandDispatcher::parse(&text) {
                    self.run_command(command).await;
                }
            }

            TransportEvent::Closed { id } => self.transport.on_lost(id),

            TransportEvent::RetryDue { id } => self.transport.on_retry_due(id),
        }
    }

    fn enqueue(&mut self, envelope: Envelope) {
        self.queue.enqueue(&mut self.transport, envelope);
    }

    /// Answers a command.
    ///
    /// Snapshot, advisory and unknown commands are answered in place, so their
    /// replies leave in arrival order. Page sends run on their own task and
    /// post the envelope back.
    async fn run_command(&mut self, command: Command) {
        if !command.acts_on_page() {
            let reply = self.dispatcher.execute(command).await;
            self.enqueue(reply);
            return;
        }

        let dispatcher = Arc::clone(&self.dispatcher);
        let loopback = self.loopback.clone();
        tokio::spawn(async move {
            let reply = dispatcher.execute(command).await;
            if let Some(inputs) = loopback.upgrade() {
                let _ = inputs.send(Input::Send(reply));
            }
        });
    }
}

// ============================================================================
// Tests
// ============================================================================
