use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};

use futures_util::Stream;
use tokio::sync::{RwLock, mpsc};
use tracing::trace;

use riverlog_types::events::Topic;

/// Topic-keyed publish/subscribe bus.
///
/// Every subscriber owns an unbounded queue, so a slow consumer never drops
/// events and never blocks a publisher. Events on one topic reach each
/// subscriber in publish order; there is no ordering across topics.
pub struct EventBus<E> {
    inner: Arc<BusInner<E>>,
}

struct BusInner<E> {
    /// topic -> live subscribers
    topics: RwLock<HashMap<Topic, Vec<Subscriber<E>>>>,
    next_id: AtomicU64,
}

struct Subscriber<E> {
    id: u64,
    tx: mpsc::UnboundedSender<E>,
}

impl<E> Clone for EventBus<E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<E: Clone + Send + 'static> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Clone + Send + 'static> EventBus<E> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(BusInner {
                topics: RwLock::new(HashMap::new()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Subscribe to a topic. Only events published after this call are seen.
    pub async fn subscribe(&self, topic: Topic) -> Subscription<E> {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();

        self.inner
            .topics
            .write()
            .await
            .entry(topic)
            .or_default()
            .push(Subscriber { id, tx });

        trace!("subscriber {} attached to {}", id, topic);
        Subscription { id, topic, rx }
    }

    /// Deliver `event` to every current subscriber of `topic`. Subscribers
    /// whose stream has been dropped are removed. Returns how many received it.
    pub async fn publish(&self, topic: Topic, event: E) -> usize {
        let mut topics = self.inner.topics.write().await;
        let Some(subscribers) = topics.get_mut(&topic) else {
            return 0;
        };

        subscribers.retain(|sub| {
            let delivered = sub.tx.send(event.clone()).is_ok();
            if !delivered {
                trace!("subscriber {} left {}", sub.id, topic);
            }
            delivered
        });

        subscribers.len()
    }

    /// Number of live subscribers on a topic (dropped ones are counted until
    /// the next publish prunes them).
    #[cfg(test)]
    pub async fn subscriber_count(&self, topic: Topic) -> usize {
        self.inner
            .topics
            .read()
            .await
            .get(&topic)
            .map_or(0, |subs| subs.iter().filter(|s| !s.tx.is_closed()).count())
    }
}

/// Live event stream for one topic. Dropping it unsubscribes.
pub struct Subscription<E> {
    id: u64,
    topic: Topic,
    rx: mpsc::UnboundedReceiver<E>,
}

impl<E> Subscription<E> {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn topic(&self) -> Topic {
        self.topic
    }
}

impl<E> Unpin for Subscription<E> {}

impl<E> Stream for Subscription<E> {
    type Item = E;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<E>> {
        self.get_mut().rx.poll_recv(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    #[tokio::test]
    async fn delivers_in_publish_order() {
        let bus = EventBus::new();
        let mut sub = bus.subscribe(Topic::Fish).await;

        for n in 0..5 {
            assert_eq!(bus.publish(Topic::Fish, n).await, 1);
        }

        let got: Vec<i32> = (&mut sub).take(5).collect().await;
        assert_eq!(got, [0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn topics_are_isolated() {
        let bus = EventBus::new();
        let mut fish = bus.subscribe(Topic::Fish).await;
        let mut trips = bus.subscribe(Topic::Trip).await;

        bus.publish(Topic::Trip, "trip-1").await;
        bus.publish(Topic::Fish, "fish-1").await;

        assert_eq!(fish.next().await, Some("fish-1"));
        assert_eq!(trips.next().await, Some("trip-1"));
        assert_eq!(fish.topic(), Topic::Fish);
    }

    #[tokio::test]
    async fn every_subscriber_gets_a_copy() {
        let bus = EventBus::new();
        let mut a = bus.subscribe(Topic::River).await;
        let mut b = bus.subscribe(Topic::River).await;
        assert_ne!(a.id(), b.id());

        assert_eq!(bus.publish(Topic::River, 7u8).await, 2);
        assert_eq!(a.next().await, Some(7));
        assert_eq!(b.next().await, Some(7));
    }

    #[tokio::test]
    async fn no_replay_for_late_subscribers() {
        let bus = EventBus::new();
        assert_eq!(bus.publish(Topic::User, 1).await, 0);

        let mut sub = bus.subscribe(Topic::User).await;
        bus.publish(Topic::User, 2).await;
        assert_eq!(sub.next().await, Some(2));
    }

    #[tokio::test]
    async fn dropped_subscribers_are_pruned() {
        let bus = EventBus::new();
        let keep = bus.subscribe(Topic::Tackle).await;
        let gone = bus.subscribe(Topic::Tackle).await;
        drop(gone);

        assert_eq!(bus.subscriber_count(Topic::Tackle).await, 1);
        assert_eq!(bus.publish(Topic::Tackle, ()).await, 1);
        drop(keep);
        assert_eq!(bus.publish(Topic::Tackle, ()).await, 0);
    }
}
