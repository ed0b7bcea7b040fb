//! Environment variable fallbacks.
//!
//! Env vars are **fallback**, not override: they only apply to fields that
//! the config file did not set.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::merge::{ConfigLayer, FieldSources};

/// Mapping from environment variable name to config field path.
struct EnvMapping {
    var_name: &'static str,
    field_path: &'static str,
    kind: FieldKind,
}

#[derive(Clone, Copy)]
enum FieldKind {
    Text,
    Integer,
}

/// All supported `FANOUT_*` env var mappings.
const ENV_MAPPINGS: &[EnvMapping] = &[
    EnvMapping {
        var_name: "FANOUT_HUB_NAME",
        field_path: "hub.name",
        kind: FieldKind::Text,
    },
    EnvMapping {
        var_name: "FANOUT_HUB_OUTPUT_CAPACITY",
        field_path: "hub.output_capacity",
        kind: FieldKind::Integer,
    },
    EnvMapping {
        var_name: "FANOUT_LOG_LEVEL",
        field_path: "logging.level",
        kind: FieldKind::Text,
    },
    EnvMapping {
        var_name: "FANOUT_LOG_FORMAT",
        field_path: "logging.format",
        kind: FieldKind::Text,
    },
];

/// Apply environment variable fallbacks to fields that were **not** set by
/// the config file.
///
/// Returns the number of env vars applied.
///
/// # Errors
///
/// Returns [`ConfigError::EnvError`] if a numeric field's variable does not
/// parse as an integer.
pub fn apply_env_fallbacks<S: ::std::hash::BuildHasher>(
    merged: &mut toml::Value,
    sources: &mut FieldSources,
    env_vars: &HashMap<String, String, S>,
) -> ConfigResult<usize> {
    let mut count: usize = 0;

    for mapping in ENV_MAPPINGS {
        if sources
            .get(mapping.field_path)
            .is_some_and(|layer| *layer == ConfigLayer::File)
        {
            continue;
        }

        let Some(raw) = env_vars.get(mapping.var_name) else {
            continue;
        };

        debug!(
            var = mapping.var_name,
            field = mapping.field_path,
            "applying env var fallback"
        );

        let value = coerce(mapping, raw)?;
        set_field(merged, mapping.field_path, value);
        sources.insert(mapping.field_path.to_owned(), ConfigLayer::Environment);
        count = count.saturating_add(1);
    }

    Ok(count)
}

/// Snapshot the process environment.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars().collect()
}

fn coerce(mapping: &EnvMapping, raw: &str) -> ConfigResult<toml::Value> {
    match mapping.kind {
        FieldKind::Text => Ok(toml::Value::String(raw.to_owned())),
        FieldKind::Integer => raw
            .trim()
            .parse::<i64>()
            .map(toml::Value::Integer)
            .map_err(|e| ConfigError::EnvError {
                var_name: mapping.var_name.to_owned(),
                message: format!("expected an integer for {}: {e}", mapping.field_path),
            }),
    }
}

/// Set a dotted-path field in the TOML tree, creating intermediate tables.
fn set_field(root: &mut toml::Value, path: &str, value: toml::Value) {
    let mut current = root;
    let mut segments = path.split('.').peekable();

    while let Some(segment) = segments.next() {
        let Some(table) = current.as_table_mut() else {
            return;
        };
        if segments.peek().is_none() {
            table.insert(segment.to_owned(), value);
            return;
        }
        current = table
            .entry(segment)
            .or_insert(toml::Value::Table(toml::map::Map::new()));
    }
}
