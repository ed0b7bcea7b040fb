//! Fanout Telemetry - logging setup for processes embedding the bus.
//!
//! The bus itself only emits `tracing` events; this crate installs the
//! global subscriber that renders them.
//!
//! # Example
//!
//! ```rust,no_run
//! use fanout_telemetry::{LogConfig, LogFormat, setup_logging};
//!
//! # fn main() -> Result<(), fanout_telemetry::TelemetryError> {
//! let config = LogConfig::new("info")
//!     .with_format(LogFormat::Json)
//!     .with_directive("fanout_events=trace");
//!
//! setup_logging(&config)?;
//! tracing::info!("logging ready");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{LogConfig, LogFormat, LogTarget, setup_default_logging, setup_logging};
