//! Multi-subscriber broadcast channels
//!
//! A `BroadcastChannel` delivers every published value synchronously to all
//! subscribers registered at the time of publication. Nothing is buffered:
//! a subscriber never sees values published before it subscribed.

use parking_lot::Mutex;
use std::fmt;
use std::pin::Pin;
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_stream::Stream;

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Registry<T> {
    next_id: u64,
    subscribers: Vec<(u64, Callback<T>)>,
}

/// Publish/subscribe topic without replay
pub struct BroadcastChannel<T> {
    registry: Arc<Mutex<Registry<T>>>,
}

impl<T: 'static> BroadcastChannel<T> {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry {
                next_id: 0,
                subscribers: Vec::new(),
            })),
        }
    }

    /// Register a subscriber for all values published from now on
    pub fn subscribe<F>(&self, next: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = {
            let mut registry = self.registry.lock();
            let id = registry.next_id;
            registry.next_id += 1;
            registry.subscribers.push((id, Arc::new(next)));
            id
        };

        let registry: Weak<Mutex<Registry<T>>> = Arc::downgrade(&self.registry);
        Subscription {
            id,
            detach: Box::new(move |id| match registry.upgrade() {
                Some(registry) => {
                    let mut registry = registry.lock();
                    let before = registry.subscribers.len();
                    registry.subscribers.retain(|(sid, _)| *sid != id);
                    registry.subscribers.len() != before
                }
                None => false,
            }),
        }
    }

    /// Deliver a value to every current subscriber; returns the number of deliveries.
    ///
    /// Subscribers are invoked outside the registry lock, so they may
    /// subscribe or unsubscribe while being called.
    pub fn publish(&self, value: &T) -> usize {
        let callbacks: Vec<Callback<T>> = self
            .registry
            .lock()
            .subscribers
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();

        for callback in &callbacks {
            callback(value);
        }
        callbacks.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry.lock().subscribers.len()
    }
}

impl<T: Clone + Send + 'static> BroadcastChannel<T> {
    /// Subscribe as an async stream; dropping the stream unsubscribes
    pub fn stream(&self) -> ChannelStream<T> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let subscription = self.subscribe(move |value: &T| {
            // A closed receiver is detached when the stream drops
            let _ = sender.send(value.clone());
        });
        ChannelStream {
            receiver,
            subscription,
        }
    }
}

impl<T: 'static> Default for BroadcastChannel<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle for one registration on a channel.
///
/// Dropping the handle keeps the subscriber registered; call
/// [`Subscription::unsubscribe`] to stop deliveries. Unsubscribing never
/// affects requests that are already in flight.
pub struct Subscription {
    id: u64,
    detach: Box<dyn Fn(u64) -> bool + Send + Sync>,
}

impl Subscription {
    /// Stop future deliveries; returns false if already unsubscribed
    pub fn unsubscribe(&self) -> bool {
        (self.detach)(self.id)
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

/// Channel subscription consumed as a `Stream`
pub struct ChannelStream<T> {
    receiver: mpsc::UnboundedReceiver<T>,
    subscription: Subscription,
}

impl<T> ChannelStream<T> {
    /// Wait for the next published value
    pub async fn recv(&mut self) -> Option<T> {
        self.receiver.recv().await
    }

    /// Take an already delivered value without waiting
    pub fn try_next(&mut self) -> Option<T> {
        self.receiver.try_recv().ok()
    }
}

impl<T> Stream for ChannelStream<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        self.receiver.poll_recv(cx)
    }
}

impl<T> Drop for ChannelStream<T> {
    fn drop(&mut self) {
        self.subscription.unsubscribe();
    }
}
