//! Fanout Test - Shared test utilities for the fanout event bus.
//!
//! Helpers for driving subscriptions under a deadline, building labelled
//! payloads, and wiring up test logging.
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! fanout-test.workspace = true
//! ```
//!
//! ```rust,ignore
//! use fanout_events::Hub;
//! use fanout_test::{collect, labels};
//!
//! #[tokio::test]
//! async fn test_replay() {
//!     let hub = Hub::new();
//!     let mut sub = hub.subscribe();
//!     for label in labels("job", 3) {
//!         hub.publish(label);
//!     }
//!     hub.close();
//!     assert_eq!(collect(&mut sub).await, labels("job", 3));
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

pub mod fixtures;
pub mod harness;
pub mod streams;

pub use fixtures::*;
pub use harness::*;
pub use streams::*;
