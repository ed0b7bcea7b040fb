//! Fanout Events - in-process broadcast streams.
//!
//! This crate provides:
//! - A [`Hub`] that producers publish values into
//! - [`Subscription`]s that each receive every value published after they
//!   were created, in publish order
//!
//! # Architecture
//!
//! The hub appends each value to a chain of write-once relay slots and keeps
//! only the tail. Every subscription runs its own walker task that follows
//! the chain from where it subscribed and pushes values into a small bounded
//! buffer owned by that subscription. Publishing therefore never waits on
//! consumers, and a slow consumer never holds up anyone else.
//!
//! Nodes are freed once the slowest walker has moved past them.
//!
//! # Example
//!
//! ```rust
//! use fanout_events::{Hub, HubConfig};
//!
//! # async fn example() {
//! let hub = Hub::with_config(HubConfig::new("jobs"));
//! let mut first = hub.subscribe();
//! let mut second = hub.subscribe();
//!
//! hub.publish(1_u32);
//! hub.publish(2_u32);
//! hub.close();
//!
//! assert_eq!(first.recv().await, Some(1));
//! assert_eq!(second.recv().await, Some(1));
//! assert_eq!(first.recv().await, Some(2));
//! assert_eq!(first.recv().await, None);
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod hub;
mod relay;
mod subscription;
mod walker;

pub use error::TryRecvError;
pub use hub::{DEFAULT_HUB_NAME, DEFAULT_OUTPUT_CAPACITY, Hub, HubConfig};
pub use subscription::{BlockingValues, Subscription, SubscriptionCloser, Values};
