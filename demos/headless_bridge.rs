//! Headless bridge demonstration.
//!
//! Demonstrates:
//! - Spawning a bridge against a local controller
//! - A send capability chain with a primary control and a candidate
//! - Room updates pushed through the change notifier
//!
//! Without `--external` a small controller is started in-process on
//! `127.0.0.1:8765`; it sends a few commands and prints every envelope.
//!
//! Usage:
//!   cargo run --example headless_bridge
//!   cargo run --example headless_bridge -- --debug
//!   cargo run --example headless_bridge -- --external

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::time::sleep;
use tokio_tungstenite::tungstenite::Message;
use tracing_subscriber::EnvFilter;

use room_bridge::page::ChangeNotifier;
use room_bridge::{
    ActionExecutor, Bridge, Intent, PageObserver, Result, RoomInfo, SendCapability,
    SharedPageState, UserInfo,
};

// ============================================================================
// Constants
// ============================================================================

const LISTEN_ADDR: &str = "127.0.0.1:8765";

// ============================================================================
// Page Stand-ins
// ============================================================================

/// Primary control function that only handles plain messages.
struct ConsoleControl;

#[async_trait]
impl SendCapability for ConsoleControl {
    fn name(&self) -> &str {
        "ctrlRoom"
    }

    async fn try_invoke(&self, intent: &Intent) -> Option<Result<Value>> {
        match intent {
            Intent::Message { text, to, .. } => {
                println!("[Page] ctrlRoom message: {text} (to: {to:?})");
                Some(Ok(json!({ "echo": text })))
            }
            Intent::Music { .. } => None,
        }
    }
}

/// Alternate send function that accepts anything.
struct ConsoleCandidate;

#[async_trait]
impl SendCapability for ConsoleCandidate {
    fn name(&self) -> &str {
        "sendMusic"
    }

    async fn try_invoke(&self, intent: &Intent) -> Option<Result<Value>> {
        println!("[Page] sendMusic: {intent:?}");
        Some(Ok(Value::Null))
    }
}

/// Observer that reports one user joining.
struct OneJoin {
    state: Arc<SharedPageState>,
}

impl PageObserver for OneJoin {
    fn observe(&self, notifier: ChangeNotifier) {
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            sleep(Duration::from_millis(500)).await;
            state.update_room(|room| room.users.push("carol".into()));
            notifier.notify();
        });
    }
}

// ============================================================================
// Demo Controller
// ============================================================================

async fn run_controller(listener: TcpListener) {
    let Ok((stream, peer)) = listener.accept().await else {
        return;
    };
    println!("[Controller] Bridge connected from {peer}");

    let Ok(ws) = tokio_tungstenite::accept_async(stream).await else {
        return;
    };
    let (mut write, mut read) = ws.split();

    let commands = [
        json!({"action": "get_user_info"}),
        json!({"action": "send_message", "message": "hello room", "to": "bob"}),
        json!({"action": "send_music", "title": "song", "url": "https://example.com/a.mp3"}),
        json!({"action": "join_room", "roomId": "xyz"}),
        json!({"action": "frobnicate"}),
    ];
    for command in commands {
        let _ = write.send(Message::text(command.to_string())).await;
    }

    while let Some(Ok(message)) = read.next().await {
        if let Message::Text(text) = message {
            println!("[Controller] <- {text}");
        }
    }
    println!("[Controller] Bridge disconnected");
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let debug = args.iter().any(|a| a == "--debug");
    let external = args.iter().any(|a| a == "--external");

    let filter = if debug {
        "room_bridge=debug"
    } else {
        "room_bridge=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();

    if !external {
        let listener = TcpListener::bind(LISTEN_ADDR).await?;
        tokio::spawn(run_controller(listener));
    }

    let state = Arc::new(SharedPageState::with(
        UserInfo::named("alice"),
        RoomInfo {
            name: "lounge".into(),
            id: "r1".into(),
            users: vec!["alice".into(), "bob".into()],
            ..Default::default()
        },
    ));

    let executor = ActionExecutor::new()
        .control(Arc::new(ConsoleControl))
        .candidate(Arc::new(ConsoleCandidate));

    let bridge = Bridge::builder()
        .endpoint(format!("ws://{LISTEN_ADDR}"))
        .state_provider(state.clone())
        .executor(executor)
        .observer(Arc::new(OneJoin { state }))
        .spawn()?;

    bridge.self_test()?;

    sleep(Duration::from_secs(2)).await;
    let status = bridge.status().await?;
    println!("[Bridge] status: {status:?}");

    bridge.shutdown().await;
    Ok(())
}
