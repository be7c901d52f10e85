//! Event bus for organ notifications
//!
//! Topic-keyed fan-out with per-organ bulk teardown. Publishing is
//! fire-and-forget: there is no return value and no acknowledgement.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex as TokioMutex;
use tracing::{debug, warn};

use async_trait::async_trait;
use serde_json::Value;

/// Handler invoked for each published event on a subscribed topic
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, payload: &Value) -> anyhow::Result<()>;
}

/// Wrap an async closure as an [`EventHandler`]
pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn EventHandler>
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    struct FnHandler<F>(F);

    #[async_trait]
    impl<F, Fut> EventHandler for FnHandler<F>
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        async fn handle(&self, payload: &Value) -> anyhow::Result<()> {
            (self.0)(payload.clone()).await
        }
    }

    Arc::new(FnHandler(f))
}

/// One subscription: owned by exactly one organ, lifetime bounded by that
/// organ's enabled interval.
struct Subscription {
    owner: String,
    handler: Arc<dyn EventHandler>,
}

/// Topic-keyed event bus
pub struct EventBus {
    topics: TokioMutex<HashMap<String, Vec<Subscription>>>,
}

impl EventBus {
    /// Create a new event bus
    pub fn new() -> Self {
        Self {
            topics: TokioMutex::new(HashMap::new()),
        }
    }

    /// Append a subscription to a topic's handler list
    ///
    /// Duplicate subscriptions (same owner, topic, and handler) are
    /// permitted and all fire.
    pub async fn subscribe(&self, topic: &str, owner: &str, handler: Arc<dyn EventHandler>) {
        debug!("organ {} subscribing to topic {}", owner, topic);
        let mut topics = self.topics.lock().await;
        topics.entry(topic.to_string()).or_default().push(Subscription {
            owner: owner.to_string(),
            handler,
        });
    }

    /// Invoke every currently-subscribed handler for a topic, in
    /// subscription order, synchronously from the caller's point of view.
    ///
    /// A failing handler is logged with topic and owner and never prevents
    /// the remaining handlers from running, nor propagates to the publisher.
    pub async fn publish(&self, topic: &str, payload: &Value) {
        // Snapshot handlers and drop the lock before invoking, so handler
        // bodies can call back into the bus without deadlocking.
        let snapshot: Vec<(String, Arc<dyn EventHandler>)> = {
            let topics = self.topics.lock().await;
            topics
                .get(topic)
                .map(|subs| {
                    subs.iter()
                        .map(|s| (s.owner.clone(), Arc::clone(&s.handler)))
                        .collect()
                })
                .unwrap_or_default()
        };

        if snapshot.is_empty() {
            return;
        }

        debug!("publishing {} to {} subscriber(s)", topic, snapshot.len());

        for (owner, handler) in snapshot {
            if let Err(e) = handler.handle(payload).await {
                warn!(
                    "event handler of organ {} failed on topic {}: {}",
                    owner, topic, e
                );
            }
        }
    }

    /// Remove every subscription owned by an organ, across all topics
    ///
    /// This is what prevents stale callbacks into deactivated organs.
    pub async fn unsubscribe_all(&self, owner: &str) {
        debug!("purging subscriptions of organ {}", owner);
        let mut topics = self.topics.lock().await;
        for subs in topics.values_mut() {
            subs.retain(|s| s.owner != owner);
        }
        topics.retain(|_, subs| !subs.is_empty());
    }

    /// Number of live subscriptions on a topic (introspection)
    pub async fn subscriber_count(&self, topic: &str) -> usize {
        let topics = self.topics.lock().await;
        topics.get(topic).map(Vec::len).unwrap_or(0)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
