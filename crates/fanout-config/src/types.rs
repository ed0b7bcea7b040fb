//! Configuration types for the fanout bus.
//!
//! Every struct implements [`Default`] with the same values as the embedded
//! `defaults.toml`, so a bare `[section]` header produces a working
//! configuration.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Broadcast hub settings.
    pub hub: HubSection,
    /// Logging level, format, and per-crate directives.
    pub logging: LoggingSection,
}

// ---------------------------------------------------------------------------
// HubSection
// ---------------------------------------------------------------------------

/// Settings for one broadcast hub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubSection {
    /// Name of the event stream, attached to every log line the hub and its
    /// walkers emit.
    pub name: String,
    /// Number of values a subscription's walker may hold ready for its
    /// consumer before it waits. `1` keeps each walker at most one value
    /// ahead of the consumer.
    pub output_capacity: usize,
}

impl Default for HubSection {
    fn default() -> Self {
        Self {
            name: "events".to_owned(),
            output_capacity: 1,
        }
    }
}

// ---------------------------------------------------------------------------
// LoggingSection
// ---------------------------------------------------------------------------

/// Logging and tracing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Global log level filter (`"trace"`, `"debug"`, `"info"`, `"warn"`,
    /// `"error"`).
    pub level: String,
    /// Output format: `"pretty"`, `"compact"`, `"json"`, or `"full"`.
    pub format: String,
    /// Per-crate tracing directives (e.g. `["fanout_events=trace"]`).
    pub directives: Vec<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "compact".to_owned(),
            directives: Vec::new(),
        }
    }
}
