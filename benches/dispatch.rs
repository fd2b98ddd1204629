//! Command dispatch benchmark suite.
//!
//! Measures frame-to-envelope throughput of the dispatcher:
//! - Frame kinds: snapshot query, send with control, send with fallbacks
//! - Outbound queue flush at several backlog sizes
//!
//! Run with: cargo bench --bench dispatch
//! Results saved to: target/criterion/

use std::sync::Arc;

use async_trait::async_trait;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use serde_json::{Value, json};
use tokio::runtime::Runtime;
use url::Url;

use room_bridge::bridge::CommandDispatcher;
use room_bridge::transport::{OutboundQueue, Outlet};
use room_bridge::{
    ActionExecutor, Envelope, Error, Intent, Result, RoomInfo, SendCapability, SharedPageState,
    UserInfo,
};

// ============================================================================
// Benchmark Parameters
// ============================================================================

const BACKLOG_SIZES: &[usize] = &[10, 100, 1000];

// ============================================================================
// Fixtures
// ============================================================================

/// Capability that is always present.
struct Present;

#[async_trait]
impl SendCapability for Present {
    fn name(&self) -> &str {
        "ctrlRoom"
    }

    async fn try_invoke(&self, _intent: &Intent) -> Option<Result<Value>> {
        Some(Ok(Value::Null))
    }
}

/// Capability that always fails.
struct Broken;

#[async_trait]
impl SendCapability for Broken {
    fn name(&self) -> &str {
        "sendMsg"
    }

    async fn try_invoke(&self, _intent: &Intent) -> Option<Result<Value>> {
        Some(Err(Error::action("unavailable")))
    }
}

fn dispatcher(executor: ActionExecutor) -> CommandDispatcher {
    let users = (0..50).map(|i| format!("user{i}")).collect();
    let state = SharedPageState::with(
        UserInfo::named("alice"),
        RoomInfo {
            name: "lounge".into(),
            id: "r1".into(),
            users,
            ..Default::default()
        },
    );
    let room_url = Url::parse("https://drrr.com/room/").expect("url");
    CommandDispatcher::new(Arc::new(state), executor, room_url)
}

/// Outlet that accepts everything.
struct Sink(usize);

impl Outlet for Sink {
    fn is_ready(&self) -> bool {
        true
    }

    fn deliver(&mut self, _envelope: &Envelope) -> bool {
        self.0 += 1;
        true
    }
}

/// Outlet that is offline.
struct Offline;

impl Outlet for Offline {
    fn is_ready(&self) -> bool {
        false
    }

    fn deliver(&mut self, _envelope: &Envelope) -> bool {
        false
    }
}

// ============================================================================
// Benchmark: Dispatch
// ============================================================================

fn bench_dispatch(c: &mut Criterion) {
    let rt = Runtime::new().expect("runtime");

    let cases = [
        (
            "get_room_info",
            dispatcher(ActionExecutor::new()),
            json!({"action": "get_room_info"}),
        ),
        (
            "send_message_control",
            dispatcher(ActionExecutor::new().control(Arc::new(Present))),
            json!({"action": "send_message", "message": "hello"}),
        ),
        (
            "send_message_fallback",
            dispatcher(
                ActionExecutor::new()
                    .candidate(Arc::new(Broken))
                    .candidate(Arc::new(Present)),
            ),
            json!({"action": "send_message", "message": "hello"}),
        ),
        (
            "unknown",
            dispatcher(ActionExecutor::new()),
            json!({"action": "frobnicate"}),
        ),
    ];

    let mut group = c.benchmark_group("dispatch");
    group.throughput(Throughput::Elements(1));

    for (name, dispatcher, command) in &cases {
        let frame = command.to_string();
        group.bench_with_input(BenchmarkId::new("handle", name), &frame, |b, frame| {
            b.to_async(&rt).iter(|| async move {
                let reply = dispatcher.handle(frame).await;
                reply.and_then(|envelope| envelope.to_frame().ok())
            });
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark: Queue Flush
// ============================================================================

fn bench_queue_flush(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue_flush");

    for &size in BACKLOG_SIZES {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("flush", size), &size, |b, &size| {
            b.iter(|| {
                let mut queue = OutboundQueue::new();
                for i in 0..size {
                    queue.enqueue(&mut Offline, Envelope::test(i.to_string()));
                }
                let mut sink = Sink(0);
                queue.flush(&mut sink);
                sink.0
            });
        });
    }

    group.finish();
}

// ============================================================================
// Criterion Setup
// ============================================================================

criterion_group!(benches, bench_dispatch, bench_queue_flush);
criterion_main!(benches);
