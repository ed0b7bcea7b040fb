//! Prelude module - commonly used test helpers.

pub use crate::{
    DEFAULT_WAIT, Tagged, collect, config_file, labels, next_within, sequence_of,
    setup_test_logging, take, wait_until, within,
};
