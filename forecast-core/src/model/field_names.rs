//! Mechanical translation between the upstream camelCase field names and the
//! snake_case names used by the internal model.
//!
//! The translation is applied explicitly at the JSON boundary
//! ([`keys_to_snake`] before deserializing, [`keys_to_camel`] after
//! serializing) instead of through per-field rename attributes.

use serde_json::{Map, Value};

/// `probability_of_precipitation` -> `probabilityOfPrecipitation`.
pub fn snake_to_camel(name: &str) -> String {
    let mut parts = name.split('_');
    let mut out = String::with_capacity(name.len());

    if let Some(head) = parts.next() {
        out.push_str(head);
    }
    for word in parts {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.extend(chars.flat_map(char::to_lowercase));
        }
    }

    out
}

/// `probabilityOfPrecipitation` -> `probability_of_precipitation`.
pub fn camel_to_snake(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);

    for c in name.chars() {
        if c.is_uppercase() {
            out.push('_');
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }

    out
}

/// Rename every object key (recursively) with `rename`.
pub fn rename_keys(value: Value, rename: &impl Fn(&str) -> String) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (rename(&k), rename_keys(v, rename)))
                .collect::<Map<String, Value>>(),
        ),
        Value::Array(items) => {
            Value::Array(items.into_iter().map(|v| rename_keys(v, rename)).collect())
        }
        other => other,
    }
}

pub fn keys_to_snake(value: Value) -> Value {
    rename_keys(value, &camel_to_snake)
}

pub fn keys_to_camel(value: Value) -> Value {
    rename_keys(value, &snake_to_camel)
}
