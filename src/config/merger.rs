//! Layering of configuration value trees.
//!
//! Later layers override earlier ones key by key.
//!
//! # Merge Rules
//!
//! - Mappings are merged recursively
//! - Sequences are replaced entirely (not merged)
//! - Null values in an overlay remove the key from the base
//! - Scalars in an overlay replace whatever the base holds
//! - A null overlay document leaves the base untouched

use serde_yaml::Value;

/// Merge `overlay` into `base` in place.
pub fn merge_into(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (_, Value::Null) => {}
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            for (key, value) in overlay_map {
                if value.is_null() {
                    base_map.remove(&key);
                    continue;
                }
                match base_map.get_mut(&key) {
                    Some(existing) => merge_into(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

/// Merge layers in order (later overrides earlier).
pub fn merge_layers(layers: impl IntoIterator<Item = Value>) -> Value {
    layers
        .into_iter()
        .fold(Value::Mapping(Default::default()), |mut acc, layer| {
            merge_into(&mut acc, layer);
            acc
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(s: &str) -> Value {
        serde_yaml::from_str(s).unwrap()
    }

    #[test]
    fn later_keys_override_earlier() {
        let merged = merge_layers([yaml("x: 1\ny: 2"), yaml("y: 3")]);
        assert_eq!(merged, yaml("x: 1\ny: 3"));
    }

    #[test]
    fn nested_mappings_merge_recursively() {
        let mut base = yaml(
            r#"
database:
  host: db.internal
  pool:
    size: 5
    timeout: 30
"#,
        );
        merge_into(
            &mut base,
            yaml(
                r#"
database:
  pool:
    size: 20
"#,
            ),
        );

        assert_eq!(base["database"]["host"], "db.internal");
        assert_eq!(base["database"]["pool"]["size"], 20);
        assert_eq!(base["database"]["pool"]["timeout"], 30);
    }

    #[test]
    fn sequences_are_replaced() {
        let merged = merge_layers([yaml("hosts: [a, b]"), yaml("hosts: [c]")]);
        let hosts = merged["hosts"].as_sequence().unwrap();
        assert_eq!(hosts.len(), 1);
        assert_eq!(hosts[0], "c");
    }

    #[test]
    fn null_removes_inherited_key() {
        let merged = merge_layers([yaml("a: 1\nb: 2"), yaml("a: null")]);
        assert!(merged.get("a").is_none());
        assert_eq!(merged["b"], 2);
    }

    #[test]
    fn empty_document_changes_nothing() {
        let mut base = yaml("name: app");
        merge_into(&mut base, Value::Null);
        assert_eq!(base["name"], "app");
    }

    #[test]
    fn scalar_overlay_replaces_mapping() {
        let merged = merge_layers([yaml("log:\n  level: debug"), yaml("log: off")]);
        assert_eq!(merged["log"], "off");
    }
}
