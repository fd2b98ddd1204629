//! Page action execution with layered fallbacks.
//!
//! The page API used to post messages is not stable, so an
//! [`ActionExecutor`] holds a prioritized list of [`SendCapability`]
//! providers and walks it until one of them handles the [`Intent`].
//!
//! # Fallback Order
//!
//! | Step | Providers | Outcome |
//! |------|-----------|---------|
//! | 1 | [`Tier::Control`] in order | First present one decides success or failure |
//! | 2 | [`Tier::Candidate`] in order | First present one that does not fail wins |
//! | 3 | none present | [`Delivery::Unconfirmed`] |
//!
//! A provider that panics counts as a failure with the panic text.
//!
//! # Example
//!
//! ```ignore
//! let executor = ActionExecutor::new()
//!     .control(Arc::new(CtrlRoom))
//!     .candidate(Arc::new(SendMsgFn));
//!
//! match executor.execute(&Intent::message("hello")).await {
//!     Delivery::Confirmed(data) => println!("sent: {data}"),
//!     other => println!("{other:?}"),
//! }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::FutureExt;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Error, Result};

// ============================================================================
// Intent
// ============================================================================

/// Something the controller wants the page to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Post a chat message.
    Message {
        /// Message text.
        text: String,
        /// Attached link.
        url: Option<String>,
        /// Direct-message recipient.
        to: Option<String>,
    },

    /// Share a media reference.
    Music {
        /// Track title.
        title: String,
        /// Track URL.
        url: String,
    },
}

impl Intent {
    /// Creates a plain message intent.
    #[inline]
    #[must_use]
    pub fn message(text: impl Into<String>) -> Self {
        Self::Message {
            text: text.into(),
            url: None,
            to: None,
        }
    }

    /// Creates a media intent.
    #[inline]
    #[must_use]
    pub fn music(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self::Music {
            title: title.into(),
            url: url.into(),
        }
    }
}

// ============================================================================
// SendCapability
// ============================================================================

/// One page entry point that may be able to carry out an intent.
#[async_trait]
pub trait SendCapability: Send + Sync {
    /// Short name used in logs and advisory messages.
    fn name(&self) -> &str;

    /// Attempts the intent.
    ///
    /// Returns `None` when this entry point is not available on the page or
    /// does not handle this kind of intent. `Some(Err(_))` means it was
    /// invoked and failed.
    async fn try_invoke(&self, intent: &Intent) -> Option<Result<Value>>;
}

// ============================================================================
// Tier
// ============================================================================

/// How a provider's failure is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// Page control function: its result is final, success or failure.
    Control,
    /// Alternate send function: a failure falls through to the next one.
    Candidate,
}

// ============================================================================
// Delivery
// ============================================================================

/// Result of walking the fallback chain.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    /// A control function accepted the intent and returned data.
    Confirmed(Value),
    /// A candidate function accepted the intent.
    Via(String),
    /// A control function reported failure.
    Failed(String),
    /// No entry point was available; nothing is known to have been sent.
    Unconfirmed,
}

// ============================================================================
// ActionExecutor
// ============================================================================

/// Prioritized chain of page entry points.
#[derive(Clone, Default)]
pub struct ActionExecutor {
    chain: Vec<(Tier, Arc<dyn SendCapability>)>,
}

impl fmt::Debug for ActionExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.chain.iter().map(|(tier, cap)| (tier, cap.name())))
            .finish()
    }
}

impl ActionExecutor {
    /// Creates an executor with an empty chain.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a control provider.
    #[must_use]
    pub fn control(mut self, capability: Arc<dyn SendCapability>) -> Self {
        self.chain.push((Tier::Control, capability));
        self
    }

    /// Appends a candidate provider.
    #[must_use]
    pub fn candidate(mut self, capability: Arc<dyn SendCapability>) -> Self {
        self.chain.push((Tier::Candidate, capability));
        self
    }

    /// Number of registered providers.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.chain.len()
    }

    /// Returns `true` if no provider is registered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Walks the chain for `intent`.
    ///
    /// Control providers are consulted before candidates regardless of
    /// registration order between the two tiers.
    pub async fn execute(&self, intent: &Intent) -> Delivery {
        for capability in self.tier(Tier::Control) {
            let Some(outcome) = invoke(capability, intent).await else {
                continue;
            };

            debug!(provider = capability.name(), "Control function handled intent");

            return match outcome {
                Ok(data) => Delivery::Confirmed(data),
                Err(e) => Delivery::Failed(e.detail()),
            };
        }

        for capability in self.tier(Tier::Candidate) {
            match invoke(capability, intent).await {
                None => continue,
                Some(Ok(_)) => {
                    debug!(provider = capability.name(), "Candidate function handled intent");
                    return Delivery::Via(capability.name().to_string());
                }
                Some(Err(e)) => {
                    warn!(provider = capability.name(), error = %e, "Candidate function failed");
                }
            }
        }

        debug!("No page entry point available");
        Delivery::Unconfirmed
    }

    fn tier(&self, tier: Tier) -> impl Iterator<Item = &Arc<dyn SendCapability>> {
        self.chain
            .iter()
            .filter(move |(t, _)| *t == tier)
            .map(|(_, cap)| cap)
    }
}

async fn invoke(capability: &Arc<dyn SendCapability>, intent: &Intent) -> Option<Result<Value>> {
    match AssertUnwindSafe(capability.try_invoke(intent)).catch_unwind().await {
        Ok(outcome) => outcome,
        Err(payload) => {
            warn!(provider = capability.name(), "Page function panicked");
            Some(Err(Error::action(panic_text(payload.as_ref()))))
        }
    }
}

fn panic_text(payload: &(dyn Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "page function panicked".to_string()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    /// Provider with a fixed behaviour that counts invocations.
    struct Scripted {
        name: &'static str,
        outcome: Option<std::result::Result<Value, &'static str>>,
        music: bool,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn new(name: &'static str, outcome: Option<std::result::Result<Value, &'static str>>) -> Arc<Self> {
            Arc::new(Self {
                name,
                outcome,
                music: true,
                calls: AtomicUsize::new(0),
            })
        }

        fn message_only(name: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                outcome: Some(Ok(Value::Null)),
                music: false,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SendCapability for Scripted {
        fn name(&self) -> &str {
            self.name
        }

        async fn try_invoke(&self, intent: &Intent) -> Option<Result<Value>> {
            if !self.music && matches!(intent, Intent::Music { .. }) {
                return None;
            }
            let outcome = self.outcome.clone()?;
            self.calls.fetch_add(1, Ordering::SeqCst);
            Some(outcome.map_err(Error::action))
        }
    }

    /// Provider that throws from inside the page.
    struct Throwing;

    #[async_trait]
    impl SendCapability for Throwing {
        fn name(&self) -> &str {
            "ctrlRoom"
        }

        async fn try_invoke(&self, _intent: &Intent) -> Option<Result<Value>> {
            panic!("page threw");
        }
    }

    #[tokio::test]
    async fn test_empty_chain_is_unconfirmed() {
        let executor = ActionExecutor::new();
        assert_eq!(executor.execute(&Intent::message("hi")).await, Delivery::Unconfirmed);
    }

    #[tokio::test]
    async fn test_primary_control_decides() {
        let primary = Scripted::new("ctrlRoom", Some(Ok(json!({"ok": 1}))));
        let secondary = Scripted::new("window.ctrlRoom", Some(Ok(Value::Null)));
        let executor = ActionExecutor::new()
            .control(primary.clone())
            .control(secondary.clone());

        let delivery = executor.execute(&Intent::message("hi")).await;

        assert_eq!(delivery, Delivery::Confirmed(json!({"ok": 1})));
        assert_eq!(primary.calls(), 1);
        assert_eq!(secondary.calls(), 0);
    }

    #[tokio::test]
    async fn test_secondary_used_when_primary_absent() {
        let executor = ActionExecutor::new()
            .control(Scripted::new("ctrlRoom", None))
            .control(Scripted::new("window.ctrlRoom", Some(Ok(json!("done")))));

        let delivery = executor.execute(&Intent::music("song", "http://a/b.mp3")).await;
        assert_eq!(delivery, Delivery::Confirmed(json!("done")));
    }

    #[tokio::test]
    async fn test_control_failure_is_final() {
        let candidate = Scripted::new("sendMsg", Some(Ok(Value::Null)));
        let executor = ActionExecutor::new()
            .control(Scripted::new("ctrlRoom", Some(Err("flood limit"))))
            .candidate(candidate.clone());

        let delivery = executor.execute(&Intent::message("hi")).await;

        assert_eq!(delivery, Delivery::Failed("flood limit".into()));
        assert_eq!(candidate.calls(), 0);
    }

    #[tokio::test]
    async fn test_failing_candidate_falls_through() {
        let executor = ActionExecutor::new()
            .candidate(Scripted::new("sendMessage", None))
            .candidate(Scripted::new("sendMsg", Some(Err("boom"))))
            .candidate(Scripted::new("postMessage", Some(Ok(Value::Null))))
            .candidate(Scripted::new("submitMessage", Some(Ok(Value::Null))));

        let delivery = executor.execute(&Intent::message("hi")).await;
        assert_eq!(delivery, Delivery::Via("postMessage".into()));
    }

    #[tokio::test]
    async fn test_controls_run_before_candidates() {
        let control = Scripted::new("ctrlRoom", Some(Ok(Value::Null)));
        let candidate = Scripted::new("sendMsg", Some(Ok(Value::Null)));
        let executor = ActionExecutor::new()
            .candidate(candidate.clone())
            .control(control.clone());

        assert_eq!(
            executor.execute(&Intent::message("hi")).await,
            Delivery::Confirmed(Value::Null)
        );
        assert_eq!(candidate.calls(), 0);
    }

    #[tokio::test]
    async fn test_message_only_candidates_skip_music() {
        let executor = ActionExecutor::new().candidate(Scripted::message_only("sendMsg"));

        assert_eq!(
            executor.execute(&Intent::music("t", "u")).await,
            Delivery::Unconfirmed
        );
        assert_eq!(
            executor.execute(&Intent::message("m")).await,
            Delivery::Via("sendMsg".into())
        );
    }

    #[tokio::test]
    async fn test_panicking_control_fails_with_panic_text() {
        let candidate = Scripted::new("sendMsg", Some(Ok(Value::Null)));
        let executor = ActionExecutor::new()
            .control(Arc::new(Throwing))
            .candidate(candidate.clone());

        let delivery = executor.execute(&Intent::message("hi")).await;

        assert_eq!(delivery, Delivery::Failed("page threw".into()));
        assert_eq!(candidate.calls(), 0);
    }

    #[tokio::test]
    async fn test_panicking_candidate_falls_through() {
        let executor = ActionExecutor::new()
            .candidate(Arc::new(Throwing))
            .candidate(Scripted::new("postMessage", Some(Ok(Value::Null))));

        let delivery = executor.execute(&Intent::message("hi")).await;
        assert_eq!(delivery, Delivery::Via("postMessage".into()));
    }

    #[test]
    fn test_panic_text_formats() {
        assert_eq!(panic_text(&"static"), "static");
        assert_eq!(panic_text(&String::from("owned")), "owned");
        assert_eq!(panic_text(&42_u8), "page function panicked");
    }
}
