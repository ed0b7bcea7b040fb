//! The relay chain.
//!
//! Every published value lives in a [`RelayNode`] that sits in exactly one
//! [`RelaySlot`]. The node also owns the slot the *next* value will land in,
//! so the chain is a singly linked list threaded through write-once slots.
//!
//! Reading a slot does not consume it: every cursor positioned at a slot
//! sees the same node, which is what lets any number of walkers share one
//! chain without the hub knowing they exist.

use std::sync::{Arc, OnceLock};

use tokio::sync::Notify;

/// One published value plus the slot where the following value will appear.
pub(crate) struct RelayNode<T> {
    /// Position in the hub's publish order, starting at 0.
    pub(crate) seq: u64,
    pub(crate) value: T,
    pub(crate) next: Arc<RelaySlot<T>>,
}

/// A write-once handoff point.
///
/// Settles exactly once, either to a node (`Some`) or to the closed marker
/// (`None`). Readers that arrive before it settles wait on `ready`.
pub(crate) struct RelaySlot<T> {
    state: OnceLock<Option<Arc<RelayNode<T>>>>,
    ready: Notify,
}

impl<T> RelaySlot<T> {
    pub(crate) fn new() -> Self {
        Self {
            state: OnceLock::new(),
            ready: Notify::new(),
        }
    }

    /// Place `node` in the slot. Returns `false` if the slot had already
    /// settled, in which case the node is dropped.
    pub(crate) fn fill(&self, node: Arc<RelayNode<T>>) -> bool {
        self.settle(Some(node))
    }

    /// Mark the slot as the end of the chain. Returns `false` if the slot had
    /// already settled.
    pub(crate) fn seal(&self) -> bool {
        self.settle(None)
    }

    fn settle(&self, state: Option<Arc<RelayNode<T>>>) -> bool {
        let settled = self.state.set(state).is_ok();
        if settled {
            self.ready.notify_waiters();
        }
        settled
    }

    /// Whether the slot holds a node or the closed marker.
    #[cfg(test)]
    pub(crate) fn is_settled(&self) -> bool {
        self.state.get().is_some()
    }

    /// Wait for the slot to settle.
    ///
    /// Yields the node (left in place for other readers) or `None` once the
    /// chain is closed at this point.
    pub(crate) async fn relay(&self) -> Option<Arc<RelayNode<T>>> {
        loop {
            let notified = self.ready.notified();
            tokio::pin!(notified);
            // Register before checking so a settle between the check and the
            // await still wakes us.
            notified.as_mut().enable();

            if let Some(state) = self.state.get() {
                return state.clone();
            }
            notified.await;
        }
    }
}

impl<T> Drop for RelaySlot<T> {
    // Unlink iteratively: a lagging cursor can be the last owner of a very
    // long chain, and the default recursive drop would overflow the stack.
    fn drop(&mut self) {
        let mut pending = self.state.take().flatten();
        while let Some(node) = pending.take() {
            let Some(node) = Arc::into_inner(node) else {
                break;
            };
            let RelayNode { next, .. } = node;
            let Some(mut slot) = Arc::into_inner(next) else {
                break;
            };
            pending = slot.state.take().flatten();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    type Link = (Arc<RelayNode<&'static str>>, Arc<RelaySlot<&'static str>>);

    fn node(seq: u64, value: &'static str) -> Link {
        let next = Arc::new(RelaySlot::new());
        let node = Arc::new(RelayNode {
            seq,
            value,
            next: Arc::clone(&next),
        });
        (node, next)
    }

    #[tokio::test]
    async fn test_relay_returns_filled_node() {
        let slot = RelaySlot::new();
        let (n, _next) = node(0, "a");
        assert!(slot.fill(n));

        let got = slot.relay().await.unwrap();
        assert_eq!(got.value, "a");
        assert_eq!(got.seq, 0);
    }

    #[tokio::test]
    async fn test_read_leaves_node_for_other_readers() {
        let slot = RelaySlot::new();
        let (n, _next) = node(0, "shared");
        slot.fill(n);

        let first = slot.relay().await.unwrap();
        let second = slot.relay().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_slot_settles_once() {
        let slot = RelaySlot::new();
        let (a, _na) = node(0, "a");
        let (b, _nb) = node(1, "b");

        assert!(!slot.is_settled());
        assert!(slot.fill(a));
        assert!(slot.is_settled());
        assert!(!slot.fill(b));
        assert!(!slot.seal());
        assert_eq!(slot.relay().await.unwrap().value, "a");
    }

    #[tokio::test]
    async fn test_sealed_slot_relays_none() {
        let slot: RelaySlot<&str> = RelaySlot::new();
        assert!(slot.seal());
        assert!(slot.relay().await.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_waiting_readers_wake_on_fill() {
        let slot = Arc::new(RelaySlot::new());
        let mut readers = Vec::new();
        for _ in 0..4 {
            let slot = Arc::clone(&slot);
            readers.push(tokio::spawn(async move {
                slot.relay().await.map(|n| n.value)
            }));
        }

        tokio::time::sleep(Duration::from_millis(20)).await;
        let (n, _next) = node(0, "late");
        slot.fill(n);

        for reader in readers {
            let value = tokio::time::timeout(Duration::from_secs(5), reader)
                .await
                .unwrap()
                .unwrap();
            assert_eq!(value, Some("late"));
        }
    }

    #[test]
    fn test_dropping_long_chain_does_not_recurse() {
        let head: Arc<RelaySlot<u64>> = Arc::new(RelaySlot::new());
        let mut tail = Arc::clone(&head);
        for seq in 0..500_000 {
            let next = Arc::new(RelaySlot::new());
            tail.fill(Arc::new(RelayNode {
                seq,
                value: seq,
                next: Arc::clone(&next),
            }));
            tail = next;
        }
        drop(tail);
        drop(head);
    }
}
