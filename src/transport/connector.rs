//! Controller connection establishment.
//!
//! A [`Connector`] turns an endpoint URL into a [`FrameChannel`]: a pair of
//! text-frame channels backed by a pump task that owns the socket. The
//! transport manager only ever sees the channels, which keeps the socket
//! library out of the state machine and lets tests swap in memory pipes.
//!
//! # Pump Task
//!
//! [`WsConnector`] spawns one task per connection that handles:
//!
//! - Outgoing text frames from the bridge
//! - Incoming text frames from the controller
//! - Close on either side

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, trace, warn};
use url::Url;

use crate::error::Result;

// ============================================================================
// Types
// ============================================================================

type ControllerStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

// ============================================================================
// FrameChannel
// ============================================================================

/// Text frame pipes of one established connection.
///
/// The link is considered ready while `outgoing` is open. Dropping the
/// channel releases the connection.
#[derive(Debug)]
pub struct FrameChannel {
    /// Frames to the controller.
    pub outgoing: mpsc::UnboundedSender<String>,
    /// Frames from the controller; ends when the connection closes.
    pub incoming: mpsc::UnboundedReceiver<String>,
}

// ============================================================================
// Connector
// ============================================================================

/// Establishes connections to the controller.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Opens a new connection to `endpoint`.
    ///
    /// # Errors
    ///
    /// Any error is treated as a failed attempt and goes down the reconnect
    /// path.
    async fn connect(&self, endpoint: &Url) -> Result<FrameChannel>;
}

// ============================================================================
// WsConnector
// ============================================================================

/// WebSocket client connector.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, endpoint: &Url) -> Result<FrameChannel> {
        let (ws_stream, _) = tokio_tungstenite::connect_async(endpoint.as_str()).await?;

        debug!(%endpoint, "WebSocket handshake completed");

        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
        let (incoming_tx, incoming_rx) = mpsc::unbounded_channel();

        tokio::spawn(run_pump(ws_stream, outgoing_rx, incoming_tx));

        Ok(FrameChannel {
            outgoing: outgoing_tx,
            incoming: incoming_rx,
        })
    }
}

/// Moves frames between the socket and the channel pair until either side
/// goes away.
async fn run_pump(
    ws_stream: ControllerStream,
    mut outgoing: mpsc::UnboundedReceiver<String>,
    incoming: mpsc::UnboundedSender<String>,
) {
    let (mut ws_write, mut ws_read) = ws_stream.split();

    loop {
        tokio::select! {
            message = ws_read.next() => {
                match message {
                    Some(Ok(Message::Text(text))) => {
                        if incoming.send(text.as_str().to_owned()).is_err() {
                            let _ = ws_write.close().await;
                            break;
                        }
                    }

                    Some(Ok(Message::Close(_))) => {
                        debug!("WebSocket closed by controller");
                        break;
                    }

                    Some(Err(e)) => {
                        warn!(error = %e, "WebSocket error");
                        break;
                    }

                    None => {
                        debug!("WebSocket stream ended");
                        break;
                    }

                    // Ignore Binary, Ping, Pong
                    _ => {}
                }
            }

            frame = outgoing.recv() => {
                match frame {
                    Some(text) => {
                        if let Err(e) = ws_write.send(Message::Text(text.into())).await {
                            warn!(error = %e, "Failed to write frame");
                            break;
                        }
                        trace!("Frame written");
                    }

                    None => {
                        debug!("Connection released by bridge");
                        let _ = ws_write.close().await;
                        break;
                    }
                }
            }

            () = incoming.closed() => {
                debug!("Frame reader gone");
                let _ = ws_write.close().await;
                break;
            }
        }
    }

    debug!("Pump terminated");
}

// ============================================================================
// Tests
// ============================================================================
