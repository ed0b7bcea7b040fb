//! Error types for non-blocking reads.
//!
//! Publishing, subscribing and closing never fail. The only fallible call is
//! [`Subscription::try_recv`](crate::Subscription::try_recv), which has to
//! tell "nothing yet" apart from "nothing ever again".

use thiserror::Error;

/// Why [`Subscription::try_recv`](crate::Subscription::try_recv) returned no
/// value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TryRecvError {
    /// No value is ready yet; the stream is still open.
    #[error("no value ready")]
    Empty,

    /// The stream has ended: the hub closed and everything published before
    /// that was delivered, or the subscription itself was closed.
    #[error("subscription closed")]
    Closed,
}
