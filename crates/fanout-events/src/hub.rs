//! The write side of a broadcast stream.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, trace};

use crate::relay::{RelayNode, RelaySlot};
use crate::subscription::Subscription;

/// Default number of values a walker may buffer ahead of its consumer.
pub const DEFAULT_OUTPUT_CAPACITY: usize = 1;

/// Default stream name used in log output.
pub const DEFAULT_HUB_NAME: &str = "events";

/// Settings for a [`Hub`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubConfig {
    /// Stream name attached to the hub's and its walkers' log output.
    pub name: String,
    /// Per-subscription output buffer size. Clamped to at least 1.
    pub output_capacity: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_HUB_NAME.to_string(),
            output_capacity: DEFAULT_OUTPUT_CAPACITY,
        }
    }
}

impl HubConfig {
    /// Config with the given stream name and default buffering.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the per-subscription output buffer size.
    #[must_use]
    pub fn with_output_capacity(mut self, capacity: usize) -> Self {
        self.output_capacity = capacity.max(1);
        self
    }
}

#[cfg(feature = "config")]
impl From<&fanout_config::HubSection> for HubConfig {
    fn from(section: &fanout_config::HubSection) -> Self {
        Self::new(section.name.clone()).with_output_capacity(section.output_capacity)
    }
}

/// Broadcast hub: the producer-facing end of an event stream.
///
/// Every [`Subscription`] receives each value published after it was
/// created, in publish order. Publishing costs the same no matter how many
/// subscriptions exist or how far behind they are: the hub appends one node
/// to a relay chain and never looks at its subscribers.
///
/// `Hub` is a cheap handle; clones share the same stream. Dropping the last
/// handle closes the stream.
///
/// # Example
///
/// ```rust
/// use fanout_events::Hub;
///
/// # async fn example() {
/// let hub = Hub::new();
/// let mut sub = hub.subscribe();
///
/// hub.publish("deployed");
/// hub.close();
///
/// assert_eq!(sub.recv().await, Some("deployed"));
/// assert_eq!(sub.recv().await, None);
/// # }
/// ```
pub struct Hub<T> {
    inner: Arc<HubInner<T>>,
}

struct HubInner<T> {
    state: Mutex<HubState<T>>,
    config: HubConfig,
    live: Arc<AtomicUsize>,
}

struct HubState<T> {
    /// Slot the next published value goes into. Created on first use.
    tail: Option<Arc<RelaySlot<T>>>,
    closed: bool,
    published: u64,
    next_subscription: u64,
}

impl<T> HubState<T> {
    fn tail(&mut self) -> &Arc<RelaySlot<T>> {
        self.tail.get_or_insert_with(|| Arc::new(RelaySlot::new()))
    }

    /// Seal the tail. Returns `false` if already closed.
    fn close(&mut self) -> bool {
        if self.closed {
            return false;
        }
        self.closed = true;
        // Materialize the tail so a subscribe after close still captures a
        // sealed slot.
        self.tail().seal();
        true
    }
}

impl<T> HubInner<T> {
    fn lock_state(&self) -> MutexGuard<'_, HubState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Drop for HubInner<T> {
    fn drop(&mut self) {
        let state = self
            .state
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if state.close() {
            debug!(hub = %self.config.name, "hub dropped; stream closed");
        }
    }
}

impl<T> Hub<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a hub with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(HubConfig::default())
    }

    /// Create a hub with the given settings.
    #[must_use]
    pub fn with_config(config: HubConfig) -> Self {
        debug!(
            hub = %config.name,
            output_capacity = config.output_capacity,
            "hub created"
        );
        Self {
            inner: Arc::new(HubInner {
                state: Mutex::new(HubState {
                    tail: None,
                    closed: false,
                    published: 0,
                    next_subscription: 0,
                }),
                config,
                live: Arc::new(AtomicUsize::new(0)),
            }),
        }
    }

    /// Publish a value to every current subscription.
    ///
    /// Never waits on subscribers. After [`close`](Self::close) this is a
    /// no-op that returns `false`; otherwise it returns `true`.
    pub fn publish(&self, value: T) -> bool {
        let next = Arc::new(RelaySlot::new());

        let mut state = self.inner.lock_state();
        if state.closed {
            trace!(hub = %self.inner.config.name, "publish after close ignored");
            return false;
        }

        let seq = state.published;
        let node = Arc::new(RelayNode {
            seq,
            value,
            next: Arc::clone(&next),
        });
        let placed = state.tail().fill(node);
        debug_assert!(placed, "relay slot settled twice");

        let filled = state.tail.replace(next);
        state.published = seq.saturating_add(1);
        drop(state);

        // With no subscriber holding it, releasing the old tail frees the
        // node right here; keep that off the lock.
        drop(filled);

        trace!(hub = %self.inner.config.name, seq, "value published");
        true
    }

    /// Open a new subscription.
    ///
    /// The subscription receives values published after this call returns
    /// and none from before. Subscribing to a closed hub is allowed and
    /// yields a subscription whose stream is already over.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime, since it spawns the
    /// subscription's walker task.
    #[must_use]
    pub fn subscribe(&self) -> Subscription<T> {
        let (cursor, id) = {
            let mut state = self.inner.lock_state();
            let id = state.next_subscription;
            state.next_subscription = id.saturating_add(1);
            (Arc::clone(state.tail()), id)
        };

        debug!(hub = %self.inner.config.name, subscription = id, "subscription opened");
        Subscription::spawn(
            id,
            cursor,
            &self.inner.config.name,
            self.inner.config.output_capacity,
            Arc::clone(&self.inner.live),
        )
    }
}

impl<T> Hub<T> {
    /// Close the stream. Idempotent.
    ///
    /// Values already published are still delivered; each subscription's
    /// stream ends once its walker reaches the close.
    pub fn close(&self) {
        let mut state = self.inner.lock_state();
        if state.close() {
            let published = state.published;
            drop(state);
            debug!(hub = %self.inner.config.name, published, "hub closed");
        }
    }

    /// Whether [`close`](Self::close) has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.lock_state().closed
    }

    /// Number of values accepted so far.
    #[must_use]
    pub fn published(&self) -> u64 {
        self.inner.lock_state().published
    }

    /// Number of subscriptions whose walker is still running.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.live.load(Ordering::Acquire)
    }

    /// The settings this hub was created with.
    #[must_use]
    pub fn config(&self) -> &HubConfig {
        &self.inner.config
    }
}

impl<T> Clone for Hub<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for Hub<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Hub<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.lock_state();
        f.debug_struct("Hub")
            .field("name", &self.inner.config.name)
            .field("closed", &state.closed)
            .field("published", &state.published)
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
