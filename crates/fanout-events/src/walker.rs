//! The per-subscription background task.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::relay::RelaySlot;

/// Why a walker stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Termination {
    /// The walker reached the sealed end of the chain.
    HubClosed,
    /// The subscription was closed or dropped.
    Cancelled,
    /// The output receiver went away while a value was being delivered.
    ConsumerDropped,
}

/// Counts one live walker for [`Hub::subscriber_count`](crate::Hub::subscriber_count).
pub(crate) struct LiveGuard(Arc<AtomicUsize>);

impl LiveGuard {
    pub(crate) fn new(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        Self(counter)
    }
}

impl Drop for LiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Walks the relay chain from `cursor`, pushing each value to `output`.
pub(crate) struct Walker<T> {
    cursor: Arc<RelaySlot<T>>,
    output: mpsc::Sender<T>,
    cancel: CancellationToken,
    _live: LiveGuard,
}

impl<T> Walker<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub(crate) fn new(
        cursor: Arc<RelaySlot<T>>,
        output: mpsc::Sender<T>,
        cancel: CancellationToken,
        live: LiveGuard,
    ) -> Self {
        Self {
            cursor,
            output,
            cancel,
            _live: live,
        }
    }

    /// Run until the chain closes, the subscription is cancelled, or the
    /// consumer goes away. Dropping `self` on return closes the output.
    pub(crate) async fn run(mut self) -> Termination {
        trace!("walker started");

        let reason = loop {
            let node = tokio::select! {
                biased;
                () = self.cancel.cancelled() => break Termination::Cancelled,
                next = self.cursor.relay() => match next {
                    Some(node) => node,
                    None => break Termination::HubClosed,
                },
            };
            self.cursor = Arc::clone(&node.next);

            tokio::select! {
                biased;
                () = self.cancel.cancelled() => break Termination::Cancelled,
                sent = self.output.send(node.value.clone()) => {
                    if sent.is_err() {
                        break Termination::ConsumerDropped;
                    }
                },
            }
            trace!(seq = node.seq, "value delivered");
        };

        self.cancel.cancel();
        debug!(?reason, "walker terminated");
        reason
    }
}
