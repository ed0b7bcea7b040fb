//! Per-consumer views of a hub's stream.

use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, debug_span};

use crate::error::TryRecvError;
use crate::relay::RelaySlot;
use crate::walker::{LiveGuard, Termination, Walker};

/// One consumer's independent view of a [`Hub`](crate::Hub).
///
/// Receives every value published after the subscription was created, in
/// publish order, exactly once. A background walker task moves values from
/// the hub's relay chain into this subscription's own bounded buffer, so a
/// slow consumer only ever holds up its own walker.
///
/// The stream ends when the hub closes (after everything published before
/// the close has been delivered) or when the subscription is closed. After
/// [`close`](Self::close) every read reports end-of-stream, even if values
/// were still buffered.
///
/// Dropping a subscription closes it.
pub struct Subscription<T> {
    id: u64,
    output: mpsc::Receiver<T>,
    closed: CancellationToken,
    walker: JoinHandle<Termination>,
}

impl<T> Subscription<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Start a walker at `cursor` and wrap its output.
    pub(crate) fn spawn(
        id: u64,
        cursor: Arc<RelaySlot<T>>,
        hub_name: &str,
        output_capacity: usize,
        live: Arc<AtomicUsize>,
    ) -> Self {
        let (tx, rx) = mpsc::channel(output_capacity.max(1));
        let closed = CancellationToken::new();

        // The walker cancels its child token when it stops on its own; that
        // must not read as a consumer-side close.
        let walker = Walker::new(cursor, tx, closed.child_token(), LiveGuard::new(live));
        let span = debug_span!("walker", hub = %hub_name, subscription = id);
        let walker = tokio::spawn(walker.run().instrument(span));

        Self {
            id,
            output: rx,
            closed,
            walker,
        }
    }
}

impl<T> Subscription<T> {
    /// Identifier of this subscription, unique within its hub.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Receive the next value.
    ///
    /// Returns `None` once the stream has ended.
    pub async fn recv(&mut self) -> Option<T> {
        std::future::poll_fn(|cx| self.poll_recv(cx)).await
    }

    /// Poll for the next value.
    pub fn poll_recv(&mut self, cx: &mut Context<'_>) -> Poll<Option<T>> {
        if self.closed.is_cancelled() {
            return Poll::Ready(None);
        }
        self.output.poll_recv(cx)
    }

    /// Take the next value if one is ready.
    ///
    /// # Errors
    ///
    /// [`TryRecvError::Empty`] if nothing is ready yet,
    /// [`TryRecvError::Closed`] if the stream has ended.
    pub fn try_recv(&mut self) -> Result<T, TryRecvError> {
        if self.closed.is_cancelled() {
            return Err(TryRecvError::Closed);
        }
        self.output.try_recv().map_err(|e| match e {
            mpsc::error::TryRecvError::Empty => TryRecvError::Empty,
            mpsc::error::TryRecvError::Disconnected => TryRecvError::Closed,
        })
    }

    /// Receive the next value, blocking the current thread.
    ///
    /// # Panics
    ///
    /// Panics if called from within an asynchronous execution context. Use
    /// it from plain threads or `spawn_blocking`.
    pub fn blocking_recv(&mut self) -> Option<T> {
        if self.closed.is_cancelled() {
            return None;
        }
        self.output.blocking_recv()
    }

    /// The remaining values as a lazy, single-pass [`Stream`].
    ///
    /// Ends when the subscription's stream ends. Values consumed through it
    /// are gone; a fresh subscription does not replay them.
    pub fn values(&mut self) -> Values<'_, T> {
        Values { sub: self }
    }

    /// The remaining values as a blocking [`Iterator`].
    ///
    /// Each `next()` call has the same restrictions as
    /// [`blocking_recv`](Self::blocking_recv).
    pub fn blocking_values(&mut self) -> BlockingValues<'_, T> {
        BlockingValues { sub: self }
    }

    /// Stop receiving. Idempotent, and safe to call after the stream has
    /// already ended.
    pub fn close(&self) {
        if !self.closed.is_cancelled() {
            debug!(subscription = self.id, "subscription closed");
        }
        self.closed.cancel();
    }

    /// A cloneable handle that can close this subscription from another
    /// task or thread.
    #[must_use]
    pub fn closer(&self) -> SubscriptionCloser {
        SubscriptionCloser {
            id: self.id,
            token: self.closed.clone(),
        }
    }

    /// Whether [`close`](Self::close) has been called, directly or through a
    /// [`SubscriptionCloser`].
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Whether the background walker has exited. Values it delivered before
    /// exiting may still be buffered.
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.walker.is_finished()
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.closed.cancel();
    }
}

impl<T> Stream for Subscription<T> {
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        self.get_mut().poll_recv(cx)
    }
}

impl<T> fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("closed", &self.is_closed())
            .field("terminated", &self.is_terminated())
            .finish_non_exhaustive()
    }
}

/// Closes a [`Subscription`] from elsewhere.
#[derive(Debug, Clone)]
pub struct SubscriptionCloser {
    id: u64,
    token: CancellationToken,
}

impl SubscriptionCloser {
    /// Close the subscription. Idempotent.
    pub fn close(&self) {
        if !self.token.is_cancelled() {
            debug!(subscription = self.id, "subscription closed");
        }
        self.token.cancel();
    }

    /// Whether the subscription has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Stream returned by [`Subscription::values`].
#[derive(Debug)]
pub struct Values<'a, T> {
    sub: &'a mut Subscription<T>,
}

impl<T> Stream for Values<'_, T> {
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        self.get_mut().sub.poll_recv(cx)
    }
}

/// Iterator returned by [`Subscription::blocking_values`].
#[derive(Debug)]
pub struct BlockingValues<'a, T> {
    sub: &'a mut Subscription<T>,
}

impl<T> Iterator for BlockingValues<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.sub.blocking_recv()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use futures::StreamExt;

    use super::*;
    use crate::Hub;

    const WAIT: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn test_try_recv_states() {
        let hub = Hub::new();
        let mut sub = hub.subscribe();
        assert_eq!(sub.try_recv(), Err(TryRecvError::Empty));

        hub.publish(7_u32);
        let value = tokio::time::timeout(WAIT, sub.recv()).await.unwrap();
        assert_eq!(value, Some(7));

        hub.close();
        let end = tokio::time::timeout(WAIT, sub.recv()).await.unwrap();
        assert_eq!(end, None);
        assert_eq!(sub.try_recv(), Err(TryRecvError::Closed));
    }

    #[tokio::test]
    async fn test_close_hides_buffered_values() {
        let hub = Hub::with_config(crate::HubConfig::default().with_output_capacity(8));
        let mut sub = hub.subscribe();
        for i in 0..4_u32 {
            hub.publish(i);
        }

        // Let the walker fill the buffer.
        let first = tokio::time::timeout(WAIT, sub.recv()).await.unwrap();
        assert_eq!(first, Some(0));

        sub.close();
        assert!(sub.is_closed());
        assert_eq!(sub.recv().await, None);
        assert_eq!(sub.try_recv(), Err(TryRecvError::Closed));
    }

    #[tokio::test]
    async fn test_close_is_idempotent_after_termination() {
        let hub: Hub<u32> = Hub::new();
        let mut sub = hub.subscribe();
        hub.close();

        assert_eq!(tokio::time::timeout(WAIT, sub.recv()).await.unwrap(), None);
        sub.close();
        sub.close();
        sub.closer().close();
        assert!(sub.is_closed());
        assert_eq!(sub.recv().await, None);
    }

    #[tokio::test]
    async fn test_closer_unblocks_pending_recv() {
        let hub: Hub<u32> = Hub::new();
        let mut sub = hub.subscribe();
        let closer = sub.closer();

        let reader = tokio::spawn(async move { sub.recv().await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        closer.close();

        let value = tokio::time::timeout(WAIT, reader).await.unwrap().unwrap();
        assert_eq!(value, None);
        assert!(closer.is_closed());
    }

    #[tokio::test]
    async fn test_values_stream_collects_until_close() {
        let hub = Hub::new();
        let mut sub = hub.subscribe();
        for word in ["x", "y", "z"] {
            hub.publish(word.to_string());
        }
        hub.close();

        let collected: Vec<String> = tokio::time::timeout(WAIT, sub.values().collect())
            .await
            .unwrap();
        assert_eq!(collected, vec!["x", "y", "z"]);

        // Single pass: nothing is left afterwards.
        let again: Vec<String> = sub.values().collect().await;
        assert!(again.is_empty());
    }

    #[tokio::test]
    async fn test_subscription_is_a_stream() {
        let hub = Hub::new();
        let sub = hub.subscribe();
        hub.publish(1_u8);
        hub.publish(2_u8);
        hub.close();

        let collected: Vec<u8> = tokio::time::timeout(WAIT, sub.collect()).await.unwrap();
        assert_eq!(collected, vec![1, 2]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_blocking_values_from_blocking_thread() {
        let hub = Hub::new();
        let mut sub = hub.subscribe();
        for i in 0..10_u32 {
            hub.publish(i);
        }
        hub.close();

        let collected = tokio::task::spawn_blocking(move || sub.blocking_values().collect::<Vec<_>>())
            .await
            .unwrap();
        assert_eq!(collected, (0..10).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_walker_terminates_after_close() {
        let hub: Hub<u32> = Hub::new();
        let sub = hub.subscribe();
        sub.close();

        tokio::time::timeout(WAIT, async {
            while !sub.is_terminated() {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .unwrap();
    }
}
