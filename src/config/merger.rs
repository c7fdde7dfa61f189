//! Deep merge for layered YAML configuration.
//!
//! `.baton/config.local.yml` is laid over `.baton/config.yml`.
//!
//! # Merge Rules
//!
//! - Mappings are merged recursively
//! - Sequences (including `steps`) are replaced entirely
//! - A null in the overlay deletes the key from the base
//! - Scalars in the overlay replace scalars in the base

use serde_yaml::Value;

/// Deep merge two YAML values; `overlay` wins at the point of conflict.
pub fn deep_merge(base: &Value, overlay: &Value) -> Value {
    let mut merged = base.clone();
    merge_into(&mut merged, overlay.clone());
    merged
}

/// Merge layers in order (later overrides earlier).
pub fn merge_configs(configs: &[Value]) -> Value {
    let mut merged = Value::Mapping(Default::default());
    for layer in configs {
        merge_into(&mut merged, layer.clone());
    }
    merged
}

fn merge_into(target: &mut Value, overlay: Value) {
    match (target, overlay) {
        (Value::Mapping(target_map), Value::Mapping(overlay_map)) => {
            for (key, value) in overlay_map {
                if value.is_null() {
                    target_map.remove(&key);
                } else if let Some(existing) = target_map.get_mut(&key) {
                    merge_into(existing, value);
                } else {
                    target_map.insert(key, value);
                }
            }
        }
        (target, overlay) => *target = overlay,
    }
}
