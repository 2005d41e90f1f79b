//! Subscription that buffers payloads for a frame-driven consumer.
use std::{
    collections::VecDeque,
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use super::channel::{BusEvent, EventBus, SubscriptionHandle};

/// Collects every published `T` until the owner drains it on its next tick.
pub struct BusInbox<T> {
    queue: Arc<Mutex<VecDeque<T>>>,
    handle: SubscriptionHandle,
}

impl<T: BusEvent + Clone> BusInbox<T> {
    pub fn attach(bus: &EventBus) -> Self {
        let queue: Arc<Mutex<VecDeque<T>>> = Arc::default();
        let sink = queue.clone();
        let handle = bus.subscribe::<T, _>(move |event| {
            lock(&sink).push_back(event.clone());
            Ok(())
        });
        Self { queue, handle }
    }

    /// Takes everything received so far, oldest first.
    pub fn drain(&self) -> Vec<T> {
        lock(&self.queue).drain(..).collect()
    }

    pub fn len(&self) -> usize {
        lock(&self.queue).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.queue).is_empty()
    }

    pub fn handle(&self) -> SubscriptionHandle {
        self.handle
    }

    /// Unsubscribes and discards anything still buffered.
    pub fn detach(self, bus: &EventBus) {
        bus.unsubscribe(self.handle);
    }
}

impl<T> fmt::Debug for BusInbox<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BusInbox")
            .field("handle", &self.handle)
            .field("pending", &lock(&self.queue).len())
            .finish()
    }
}

fn lock<T>(queue: &Mutex<VecDeque<T>>) -> MutexGuard<'_, VecDeque<T>> {
    queue.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Tick(u8);

    #[test]
    fn buffers_until_drained() {
        let bus = EventBus::default();
        let inbox = BusInbox::<Tick>::attach(&bus);

        bus.publish(&Tick(1));
        bus.publish(&Tick(2));
        assert_eq!(inbox.len(), 2);

        assert_eq!(inbox.drain(), vec![Tick(1), Tick(2)]);
        assert!(inbox.is_empty());
    }

    #[test]
    fn detach_stops_collection() {
        let bus = EventBus::default();
        let inbox = BusInbox::<Tick>::attach(&bus);
        assert_eq!(bus.subscriber_count::<Tick>(), 1);

        inbox.detach(&bus);
        assert_eq!(bus.subscriber_count::<Tick>(), 0);
        assert_eq!(bus.publish(&Tick(3)).delivered, 0);
    }
}
