use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
};

use buswatch::fleet::PositionEvent;
use crossbeam_queue::ArrayQueue;
use tokio::sync::Notify;

/// Pending updates per observer. A connection that cannot keep up only ever
/// costs this much memory before old positions start rolling off.
pub const MAILBOX_CAPACITY: usize = 64;

pub type ObserverId = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    All,
    Route(Arc<str>),
}

/// Bounded outbound queue for one observer. Overflow displaces the oldest
/// pending update, fresher position data supersedes whatever was queued.
pub struct Mailbox {
    queue: ArrayQueue<PositionEvent>,
    notify: Notify,
    closed: AtomicBool,
    dropped: AtomicU64,
}

impl Mailbox {
    fn new() -> Self {
        Self {
            queue: ArrayQueue::new(MAILBOX_CAPACITY),
            notify: Notify::new(),
            closed: AtomicBool::new(false),
            dropped: AtomicU64::new(0),
        }
    }

    pub fn push(&self, event: PositionEvent) {
        if self.closed.load(Ordering::Acquire) {
            return;
        }
        if self.queue.force_push(event).is_some() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
        self.notify.notify_one();
    }

    pub fn pop(&self) -> Option<PositionEvent> {
        self.queue.pop()
    }

    pub async fn wait(&self) {
        self.notify.notified().await
    }

    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.notify.notify_one();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Subscriptions indexed two ways: the unfiltered set, and per-route
/// buckets. Lookup for an event touches the "all" set plus one bucket,
/// never the whole observer population.
#[derive(Default)]
struct Registry {
    observers: HashMap<ObserverId, (Filter, Arc<Mailbox>)>,
    all: HashMap<ObserverId, Arc<Mailbox>>,
    by_route: HashMap<Arc<str>, HashMap<ObserverId, Arc<Mailbox>>>,
}

impl Registry {
    fn subscribe(&mut self, id: ObserverId, filter: Filter, mailbox: Arc<Mailbox>) {
        if let Some((previous, _)) = self.observers.remove(&id) {
            self.detach(id, &previous);
        }
        match &filter {
            Filter::All => {
                self.all.insert(id, mailbox.clone());
            }
            Filter::Route(route) => {
                self.by_route
                    .entry(route.clone())
                    .or_default()
                    .insert(id, mailbox.clone());
            }
        }
        self.observers.insert(id, (filter, mailbox));
    }

    fn unsubscribe(&mut self, id: ObserverId) -> Option<Arc<Mailbox>> {
        let (filter, mailbox) = self.observers.remove(&id)?;
        self.detach(id, &filter);
        Some(mailbox)
    }

    fn detach(&mut self, id: ObserverId, filter: &Filter) {
        match filter {
            Filter::All => {
                self.all.remove(&id);
            }
            Filter::Route(route) => {
                if let Some(bucket) = self.by_route.get_mut(route) {
                    bucket.remove(&id);
                    if bucket.is_empty() {
                        self.by_route.remove(route);
                    }
                }
            }
        }
    }

    fn subscribers_for(&self, route: Option<&str>) -> Vec<Arc<Mailbox>> {
        let mut targets: Vec<Arc<Mailbox>> = self.all.values().cloned().collect();
        if let Some(route) = route
            && let Some(bucket) = self.by_route.get(route)
        {
            targets.extend(bucket.values().cloned());
        }
        targets
    }
}

/// Fan-out hub for live position events. Publish resolves the subscriber
/// set under a short registry lock, then force-pushes into each mailbox;
/// nothing on the publish path waits on an observer.
#[derive(Default)]
pub struct Hub {
    registry: Mutex<Registry>,
    next_id: AtomicU64,
    published: AtomicU64,
    delivered: AtomicU64,
}

impl Hub {
    pub fn new() -> Self {
        Default::default()
    }

    /// Registers a new observer. Connections start on the unfiltered feed;
    /// a subscribe message narrows it.
    pub fn connect(&self) -> (ObserverId, Arc<Mailbox>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mailbox = Arc::new(Mailbox::new());
        self.lock().subscribe(id, Filter::All, mailbox.clone());
        (id, mailbox)
    }

    /// Replaces the observer's filter, latest subscribe wins. Returns false
    /// for an observer that is already gone.
    pub fn subscribe(&self, id: ObserverId, filter: Filter) -> bool {
        let mut registry = self.lock();
        let Some((_, mailbox)) = registry.observers.get(&id) else {
            return false;
        };
        let mailbox = mailbox.clone();
        registry.subscribe(id, filter, mailbox);
        true
    }

    pub fn disconnect(&self, id: ObserverId) {
        if let Some(mailbox) = self.lock().unsubscribe(id) {
            mailbox.close();
        }
    }

    pub fn publish(&self, event: &PositionEvent) {
        let targets = self.lock().subscribers_for(event.route.as_deref());
        self.published.fetch_add(1, Ordering::Relaxed);
        self.delivered
            .fetch_add(targets.len() as u64, Ordering::Relaxed);
        for mailbox in targets {
            mailbox.push(event.clone());
        }
    }

    pub fn observers(&self) -> usize {
        self.lock().observers.len()
    }

    pub fn published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use buswatch::shared::geo::Coordinate;
    use chrono::Utc;

    fn event(vehicle: &str, route: Option<&str>) -> PositionEvent {
        PositionEvent {
            vehicle: vehicle.into(),
            position: Coordinate::new(26.8467, 80.9462),
            route: route.map(|r| r.into()),
            timestamp: Utc::now(),
        }
    }

    fn drain(mailbox: &Mailbox) -> Vec<PositionEvent> {
        let mut events = Vec::new();
        while let Some(event) = mailbox.pop() {
            events.push(event);
        }
        events
    }

    #[test]
    fn all_subscriber_sees_every_event() {
        let hub = Hub::new();
        let (_, mailbox) = hub.connect();

        hub.publish(&event("bus-1", Some("101")));
        hub.publish(&event("bus-2", Some("202")));
        hub.publish(&event("bus-3", None));

        assert_eq!(drain(&mailbox).len(), 3);
    }

    #[test]
    fn route_subscriber_sees_only_its_route() {
        let hub = Hub::new();
        let (id, mailbox) = hub.connect();
        assert!(hub.subscribe(id, Filter::Route("101".into())));

        hub.publish(&event("bus-1", Some("101")));
        hub.publish(&event("bus-2", Some("202")));
        hub.publish(&event("bus-3", None));

        let events = drain(&mailbox);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].vehicle.as_ref(), "bus-1");
    }

    #[test]
    fn resubscribe_replaces_previous_filter() {
        let hub = Hub::new();
        let (id, mailbox) = hub.connect();
        assert!(hub.subscribe(id, Filter::Route("101".into())));
        assert!(hub.subscribe(id, Filter::Route("202".into())));

        hub.publish(&event("bus-1", Some("101")));
        hub.publish(&event("bus-2", Some("202")));

        let events = drain(&mailbox);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].vehicle.as_ref(), "bus-2");
    }

    #[test]
    fn overflow_drops_oldest_first() {
        let hub = Hub::new();
        let (_, mailbox) = hub.connect();

        for i in 0..(MAILBOX_CAPACITY + 3) {
            hub.publish(&event(&format!("bus-{i}"), None));
        }

        assert_eq!(mailbox.dropped(), 3);
        let events = drain(&mailbox);
        assert_eq!(events.len(), MAILBOX_CAPACITY);
        // The three oldest rolled off, the queue starts at bus-3.
        assert_eq!(events[0].vehicle.as_ref(), "bus-3");
        assert_eq!(
            events.last().map(|event| event.vehicle.as_ref()),
            Some(format!("bus-{}", MAILBOX_CAPACITY + 2).as_str())
        );
    }

    #[test]
    fn publish_after_disconnect_is_a_noop() {
        let hub = Hub::new();
        let (id, mailbox) = hub.connect();
        hub.disconnect(id);

        hub.publish(&event("bus-1", None));

        assert!(mailbox.is_closed());
        assert!(mailbox.pop().is_none());
        assert_eq!(hub.observers(), 0);
    }

    #[test]
    fn subscribe_after_disconnect_is_rejected() {
        let hub = Hub::new();
        let (id, _) = hub.connect();
        hub.disconnect(id);
        assert!(!hub.subscribe(id, Filter::All));
    }

    #[tokio::test]
    async fn push_wakes_a_waiting_observer() {
        let hub = Hub::new();
        let (_, mailbox) = hub.connect();

        let waiter = {
            let mailbox = mailbox.clone();
            tokio::spawn(async move {
                mailbox.wait().await;
                mailbox.pop()
            })
        };
        // Give the waiter a chance to park before publishing.
        tokio::task::yield_now().await;
        hub.publish(&event("bus-1", None));

        let delivered = waiter.await.unwrap().unwrap();
        assert_eq!(delivered.vehicle.as_ref(), "bus-1");
    }
}
