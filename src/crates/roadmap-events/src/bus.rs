//! Topic-per-task publish/subscribe bus.
//!
//! Generalizes the teacher's single global `DashMap`-keyed connection
//! registry (`orchestrator::api::ws::pool::ConnectionPool`) to one
//! `broadcast::Sender` per `task_id` instead of one entry per client.

use crate::event::Event;
use dashmap::DashMap;
use futures::Stream;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::Sleep;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;

const DEFAULT_TOPIC_CAPACITY: usize = 256;

pub struct EventBus {
    topics: DashMap<String, broadcast::Sender<Event>>,
    capacity: usize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_TOPIC_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            topics: DashMap::new(),
            capacity,
        }
    }

    fn sender_for(&self, task_id: &str) -> broadcast::Sender<Event> {
        self.topics
            .entry(task_id.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }

    /// Fire-and-forget: a topic with no subscribers is not an error (spec
    /// §4.3 "publish failures are logged but never propagate").
    pub fn publish(&self, event: Event) {
        let sender = self.sender_for(event.task_id());
        if sender.send(event).is_err() {
            tracing::debug!("published event with no active subscribers");
        }
    }

    pub fn subscribe(&self, task_id: &str) -> EventStream {
        EventStream {
            inner: BroadcastStream::new(self.sender_for(task_id).subscribe()),
            done: false,
        }
    }

    pub fn subscribe_with_timeout(&self, task_id: &str, seconds: u64) -> TimedEventStream {
        TimedEventStream {
            inner: self.subscribe(task_id),
            deadline: Box::pin(tokio::time::sleep(Duration::from_secs(seconds))),
            task_id: task_id.to_string(),
            timed_out: false,
        }
    }

    /// Drops the topic's sender, releasing the channel once every
    /// subscriber's receiver has also been dropped. Call after a task
    /// reaches a terminal state and its subscribers have drained.
    pub fn remove_topic(&self, task_id: &str) {
        self.topics.remove(task_id);
    }
}

/// Drop-oldest semantics: a lagging subscriber's `Lagged(n)` is swallowed and
/// polling continues from the next available event (spec §4.3).
pub struct EventStream {
    inner: BroadcastStream<Event>,
    done: bool,
}

impl Stream for EventStream {
    type Item = Event;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Event>> {
        if self.done {
            return Poll::Ready(None);
        }
        loop {
            match Pin::new(&mut self.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(event))) => {
                    if event.is_terminal() {
                        self.done = true;
                    }
                    return Poll::Ready(Some(event));
                }
                Poll::Ready(Some(Err(BroadcastStreamRecvError::Lagged(_)))) => continue,
                Poll::Ready(None) => {
                    self.done = true;
                    return Poll::Ready(None);
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

pub struct TimedEventStream {
    inner: EventStream,
    deadline: Pin<Box<Sleep>>,
    task_id: String,
    timed_out: bool,
}

impl Stream for TimedEventStream {
    type Item = Event;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Event>> {
        if self.timed_out {
            return Poll::Ready(None);
        }

        if let Poll::Ready(item) = Pin::new(&mut self.inner).poll_next(cx) {
            return Poll::Ready(item);
        }

        if self.deadline.as_mut().poll(cx).is_ready() {
            self.timed_out = true;
            return Poll::Ready(Some(Event::Timeout {
                task_id: self.task_id.clone(),
            }));
        }

        Poll::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn subscriber_receives_published_events() {
        let bus = EventBus::new();
        let mut stream = bus.subscribe("t1");

        bus.publish(Event::Progress {
            task_id: "t1".into(),
            status: "processing".into(),
            current_step: "intent".into(),
        });

        let event = stream.next().await.unwrap();
        assert!(matches!(event, Event::Progress { .. }));
    }

    #[tokio::test]
    async fn stream_ends_after_terminal_event() {
        let bus = EventBus::new();
        let mut stream = bus.subscribe("t1");

        bus.publish(Event::Completed { task_id: "t1".into() });
        bus.publish(Event::Progress {
            task_id: "t1".into(),
            status: "processing".into(),
            current_step: "late".into(),
        });

        assert!(matches!(stream.next().await, Some(Event::Completed { .. })));
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn publish_with_no_subscribers_does_not_panic() {
        let bus = EventBus::new();
        bus.publish(Event::Completed { task_id: "lonely".into() });
    }

    #[tokio::test]
    async fn timeout_stream_emits_synthetic_timeout_event() {
        let bus = EventBus::new();
        let mut stream = bus.subscribe_with_timeout("t1", 0);

        tokio::time::sleep(Duration::from_millis(20)).await;
        let event = stream.next().await.unwrap();
        assert!(matches!(event, Event::Timeout { .. }));
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn topics_are_independent() {
        let bus = EventBus::new();
        let mut a = bus.subscribe("a");
        let mut b = bus.subscribe("b");

        bus.publish(Event::Completed { task_id: "a".into() });

        assert!(matches!(a.next().await, Some(Event::Completed { .. })));
        assert!(tokio::time::timeout(Duration::from_millis(20), b.next()).await.is_err());
    }
}
