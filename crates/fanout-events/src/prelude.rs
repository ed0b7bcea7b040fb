//! Prelude module - commonly used types for convenient import.
//!
//! Use `use fanout_events::prelude::*;` to import all essential types.

// Hub
pub use crate::{DEFAULT_OUTPUT_CAPACITY, Hub, HubConfig};

// Subscriptions
pub use crate::{Subscription, SubscriptionCloser, TryRecvError};
