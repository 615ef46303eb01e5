use serde_json::Value;

/// Merge loaded configuration data over the default template
///
/// When both sides hold an object at the same key the two are merged
/// recursively. Otherwise the loaded value wins, and the default is only
/// used for keys the loaded data does not have. Keys that exist only in the
/// loaded data are kept.
pub fn deep_merge(defaults: &Value, loaded: &Value) -> Value {
    match (defaults, loaded) {
        (Value::Object(base), Value::Object(overlay)) => {
            let mut merged = base.clone();

            for (key, value) in overlay {
                let next = match base.get(key) {
                    Some(default) => deep_merge(default, value),
                    None => value.clone(),
                };
                merged.insert(key.clone(), next);
            }

            Value::Object(merged)
        }
        (_, loaded) => loaded.clone(),
    }
}
