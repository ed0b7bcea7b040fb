//! Deep merge of TOML values.
//!
//! The merge operates on raw [`toml::Value`] trees rather than deserialized
//! structs, so a key missing from the overlay never overrides the base.

use std::collections::HashMap;

/// Which configuration layer a value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigLayer {
    /// Compiled-in defaults (`defaults.toml`).
    Defaults,
    /// The config file passed to the loader.
    File,
    /// Environment variable fallback.
    Environment,
}

impl std::fmt::Display for ConfigLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Defaults => write!(f, "defaults"),
            Self::File => write!(f, "config file"),
            Self::Environment => write!(f, "environment variable"),
        }
    }
}

/// Tracks which layer set each field's value, keyed by dotted path.
pub type FieldSources = HashMap<String, ConfigLayer>;

/// Deep-merge `overlay` into `base`, recording which layer set each leaf.
///
/// Tables merge per key; scalars and arrays from the overlay replace the
/// base value.
pub fn deep_merge_tracking(
    base: &mut toml::Value,
    overlay: &toml::Value,
    prefix: &str,
    layer: &ConfigLayer,
    sources: &mut FieldSources,
) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let path = join_path(prefix, key);
                if let Some(base_val) = base_table.get_mut(key) {
                    deep_merge_tracking(base_val, overlay_val, &path, layer, sources);
                } else {
                    base_table.insert(key.clone(), overlay_val.clone());
                    record_leaves(overlay_val, &path, layer, sources);
                }
            }
        },
        (base, overlay) => {
            *base = overlay.clone();
            sources.insert(prefix.to_owned(), layer.clone());
        },
    }
}

/// Walk a value tree and record every leaf path with `layer`.
pub fn record_leaves(
    val: &toml::Value,
    prefix: &str,
    layer: &ConfigLayer,
    sources: &mut FieldSources,
) {
    if let toml::Value::Table(table) = val {
        for (key, child) in table {
            record_leaves(child, &join_path(prefix, key), layer, sources);
        }
    } else {
        sources.insert(prefix.to_owned(), layer.clone());
    }
}

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_owned()
    } else {
        format!("{prefix}.{key}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> toml::Value {
        toml::from_str(s).unwrap()
    }

    #[test]
    fn test_overlay_replaces_scalars_and_keeps_siblings() {
        let mut base = parse("[hub]\nname = \"events\"\noutput_capacity = 1\n");
        let overlay = parse("[hub]\noutput_capacity = 4\n");
        let mut sources = FieldSources::new();

        deep_merge_tracking(&mut base, &overlay, "", &ConfigLayer::File, &mut sources);

        assert_eq!(base["hub"]["output_capacity"].as_integer(), Some(4));
        assert_eq!(base["hub"]["name"].as_str(), Some("events"));
        assert_eq!(sources.get("hub.output_capacity"), Some(&ConfigLayer::File));
        assert!(!sources.contains_key("hub.name"));
    }

    #[test]
    fn test_new_tables_record_all_leaves() {
        let mut base = parse("[hub]\nname = \"events\"\n");
        let overlay = parse("[logging]\nlevel = \"debug\"\nformat = \"json\"\n");
        let mut sources = FieldSources::new();

        deep_merge_tracking(&mut base, &overlay, "", &ConfigLayer::File, &mut sources);

        assert_eq!(base["logging"]["level"].as_str(), Some("debug"));
        assert_eq!(sources.get("logging.level"), Some(&ConfigLayer::File));
        assert_eq!(sources.get("logging.format"), Some(&ConfigLayer::File));
    }

    #[test]
    fn test_arrays_are_replaced_not_appended() {
        let mut base = parse("[logging]\ndirectives = [\"a=info\"]\n");
        let overlay = parse("[logging]\ndirectives = [\"b=debug\"]\n");
        let mut sources = FieldSources::new();

        deep_merge_tracking(&mut base, &overlay, "", &ConfigLayer::File, &mut sources);

        let directives = base["logging"]["directives"].as_array().unwrap();
        assert_eq!(directives.len(), 1);
        assert_eq!(directives[0].as_str(), Some("b=debug"));
    }
}
