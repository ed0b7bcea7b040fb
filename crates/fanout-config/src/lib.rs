#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
//! Configuration for the fanout broadcast bus.
//!
//! A single [`Config`] type carries the hub settings and the logging
//! settings. It is resolved from three layers:
//!
//! 1. **Embedded defaults** (`defaults.toml` compiled into the crate)
//! 2. **Config file** (optional, passed to [`Config::load`])
//! 3. **Environment variables** (`FANOUT_*`), applied only to fields the
//!    file left unset
//!
//! # Usage
//!
//! ```rust,no_run
//! use fanout_config::Config;
//!
//! let resolved = Config::load(Some(std::path::Path::new("fanout.toml"))).unwrap();
//! println!("hub {} buffers {} value(s) per subscriber",
//!     resolved.config.hub.name,
//!     resolved.config.hub.output_capacity);
//! ```
//!
//! # Design
//!
//! This crate has **no dependencies on other internal fanout crates**.
//! Conversion into domain types (`HubConfig`, `LogConfig`) happens in the
//! consuming crates behind their `config` feature.

/// Environment variable fallback resolution.
pub mod env;
/// Configuration error types.
pub mod error;
/// Configuration file loading.
pub mod loader;
/// TOML tree merging with per-field source tracking.
pub mod merge;
/// Configuration struct definitions.
pub mod types;
/// Configuration validation rules.
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::ResolvedConfig;
pub use merge::{ConfigLayer, FieldSources};
pub use types::*;

impl Config {
    /// Load configuration: defaults, then `path` (if given and present),
    /// then `FANOUT_*` environment fallbacks.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file is malformed or the final
    /// configuration fails validation.
    pub fn load(path: Option<&std::path::Path>) -> ConfigResult<ResolvedConfig> {
        loader::load(path, &env::collect_env_vars())
    }

    /// Load configuration from an in-memory TOML document layered over the
    /// embedded defaults. Environment variables are not consulted.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the document is malformed or fails
    /// validation.
    pub fn from_toml_str(source: &str) -> ConfigResult<Self> {
        loader::load_str(source)
    }
}
