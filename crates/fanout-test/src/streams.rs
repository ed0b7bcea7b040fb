//! Deadline-bounded reads from subscriptions.
//!
//! A broken bus shows up as a hang; these helpers turn that into a test
//! failure instead.

use std::future::Future;
use std::time::Duration;

use fanout_events::Subscription;

/// How long the helpers wait before failing a test.
pub const DEFAULT_WAIT: Duration = Duration::from_secs(5);

/// Receive the next value, failing if nothing (not even end-of-stream)
/// arrives within `wait`.
///
/// # Panics
///
/// Panics when `wait` elapses.
pub async fn next_within<T>(sub: &mut Subscription<T>, wait: Duration) -> Option<T> {
    tokio::time::timeout(wait, sub.recv())
        .await
        .unwrap_or_else(|_| panic!("subscription {} stalled for {wait:?}", sub.id()))
}

/// Drain a subscription until its stream ends.
///
/// # Panics
///
/// Panics if any single read stalls for longer than [`DEFAULT_WAIT`].
pub async fn collect<T>(sub: &mut Subscription<T>) -> Vec<T> {
    let mut out = Vec::new();
    while let Some(value) = next_within(sub, DEFAULT_WAIT).await {
        out.push(value);
    }
    out
}

/// Take exactly `n` values.
///
/// # Panics
///
/// Panics if the stream ends early or a read stalls.
pub async fn take<T>(sub: &mut Subscription<T>, n: usize) -> Vec<T> {
    let mut out = Vec::with_capacity(n);
    while out.len() < n {
        match next_within(sub, DEFAULT_WAIT).await {
            Some(value) => out.push(value),
            None => panic!("stream ended after {} of {n} values", out.len()),
        }
    }
    out
}

/// Poll `condition` until it holds.
///
/// # Panics
///
/// Panics if it still does not hold after [`DEFAULT_WAIT`].
pub async fn wait_until<F>(mut condition: F)
where
    F: FnMut() -> bool,
{
    let polled = tokio::time::timeout(DEFAULT_WAIT, async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    });
    if polled.await.is_err() {
        panic!("condition not met within {DEFAULT_WAIT:?}");
    }
}

/// Await `fut`, failing the test if it takes longer than [`DEFAULT_WAIT`].
///
/// # Panics
///
/// Panics when the deadline passes.
pub async fn within<F: Future>(fut: F) -> F::Output {
    tokio::time::timeout(DEFAULT_WAIT, fut)
        .await
        .unwrap_or_else(|_| panic!("future did not complete within {DEFAULT_WAIT:?}"))
}

#[cfg(test)]
mod tests {
    use fanout_events::Hub;

    use super::*;
    use crate::labels;

    #[tokio::test]
    async fn test_collect_until_close() {
        let hub = Hub::new();
        let mut sub = hub.subscribe();
        for label in labels("v", 3) {
            hub.publish(label);
        }
        hub.close();
        assert_eq!(collect(&mut sub).await, labels("v", 3));
    }

    #[tokio::test]
    async fn test_take_leaves_the_rest() {
        let hub = Hub::new();
        let mut sub = hub.subscribe();
        for i in 0..5_u32 {
            hub.publish(i);
        }
        hub.close();
        assert_eq!(take(&mut sub, 2).await, vec![0, 1]);
        assert_eq!(collect(&mut sub).await, vec![2, 3, 4]);
    }

    #[tokio::test]
    #[should_panic(expected = "stalled")]
    async fn test_next_within_fails_on_stall() {
        let hub: Hub<u32> = Hub::new();
        let mut sub = hub.subscribe();
        let _ = next_within(&mut sub, Duration::from_millis(20)).await;
    }

    #[tokio::test]
    async fn test_wait_until() {
        let hub: Hub<u32> = Hub::new();
        let sub = hub.subscribe();
        drop(sub);
        wait_until(|| hub.subscriber_count() == 0).await;
    }
}
