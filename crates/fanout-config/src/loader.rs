//! Config file loading.
//!
//! Implements the `Config::load()` algorithm:
//! 1. Parse `defaults.toml` → base
//! 2. Merge the config file, if one was given and exists
//! 3. Apply env var fallbacks for fields the file left unset
//! 4. Deserialize merged tree → `Config`
//! 5. Validate

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, info};

use crate::env::apply_env_fallbacks;
use crate::error::{ConfigError, ConfigResult};
use crate::merge::{ConfigLayer, FieldSources, deep_merge_tracking, record_leaves};
use crate::types::Config;
use crate::validate;

/// Embedded default configuration.
const DEFAULTS_TOML: &str = include_str!("defaults.toml");

/// Maximum config file size (1 MiB).
const MAX_CONFIG_FILE_SIZE: u64 = 1_048_576;

/// A validated configuration together with where each field came from.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// The final configuration.
    pub config: Config,
    /// Layer that set each leaf field, keyed by dotted path.
    pub field_sources: FieldSources,
    /// Files that contributed to the configuration.
    pub loaded_files: Vec<String>,
}

/// Load the configuration with file and environment layering.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file is malformed, an env var cannot be
/// applied, or the merged configuration fails validation.
pub fn load<S: ::std::hash::BuildHasher>(
    path: Option<&Path>,
    env_vars: &HashMap<String, String, S>,
) -> ConfigResult<ResolvedConfig> {
    let mut merged = parse_defaults()?;
    let mut field_sources = FieldSources::new();
    let mut loaded_files = Vec::new();

    record_leaves(&merged, "", &ConfigLayer::Defaults, &mut field_sources);

    if let Some(path) = path {
        if let Some(overlay) = try_load_file(path)? {
            deep_merge_tracking(
                &mut merged,
                &overlay,
                "",
                &ConfigLayer::File,
                &mut field_sources,
            );
            loaded_files.push(path.display().to_string());
            info!(path = %path.display(), "loaded config file");
        } else {
            debug!(path = %path.display(), "config file not found; using defaults");
        }
    }

    let env_count = apply_env_fallbacks(&mut merged, &mut field_sources, env_vars)?;
    if env_count > 0 {
        debug!(count = env_count, "applied environment variable fallbacks");
    }

    let config = finish(merged, "<merged config>")?;

    Ok(ResolvedConfig {
        config,
        field_sources,
        loaded_files,
    })
}

/// Layer an in-memory TOML document over the embedded defaults.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the document cannot be parsed or the result
/// fails validation.
pub fn load_str(source: &str) -> ConfigResult<Config> {
    let mut merged = parse_defaults()?;
    let overlay: toml::Value = toml::from_str(source).map_err(|e| ConfigError::ParseError {
        path: "<string>".to_owned(),
        source: e,
    })?;

    let mut sources = FieldSources::new();
    deep_merge_tracking(&mut merged, &overlay, "", &ConfigLayer::File, &mut sources);

    finish(merged, "<string>")
}

fn parse_defaults() -> ConfigResult<toml::Value> {
    toml::from_str(DEFAULTS_TOML).map_err(|e| ConfigError::ParseError {
        path: "<embedded defaults>".to_owned(),
        source: e,
    })
}

fn finish(merged: toml::Value, origin: &str) -> ConfigResult<Config> {
    let config: Config =
        merged
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::ParseError {
                path: origin.to_owned(),
                source: e,
            })?;

    validate::validate(&config)?;
    Ok(config)
}

/// Read and parse a TOML file. Returns `Ok(None)` if it does not exist.
fn try_load_file(path: &Path) -> ConfigResult<Option<toml::Value>> {
    let metadata = match std::fs::metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(ConfigError::ReadError {
                path: path.display().to_string(),
                source: e,
            });
        },
    };

    if metadata.len() > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::ValidationError {
            field: path.display().to_string(),
            message: format!(
                "config file is {} bytes, exceeding the {} byte limit",
                metadata.len(),
                MAX_CONFIG_FILE_SIZE
            ),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    let value: toml::Value = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(Some(value))
}
