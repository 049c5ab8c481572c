//! Operations on an in-memory copy of a JSON tree.
//!
//! Shared by [`super::MemoryDatabase`] (the whole database) and
//! [`super::RestDatabase`] subscriptions (the local mirror of a subscribed
//! path). Trees follow the database's storage rules: `null` means absent,
//! and objects left empty by a deletion disappear.

use serde_json::{Map, Value};

/// The value at `segments` below `root`, or `Null` if absent.
#[must_use]
pub fn value_at(root: &Value, segments: &[String]) -> Value {
    segments
        .iter()
        .try_fold(root, |node, segment| node.get(segment.as_str()))
        .cloned()
        .unwrap_or(Value::Null)
}

/// Replace the value at `segments` with `value`.
///
/// Missing (or non-object) ancestors are created as objects. Writing `null`
/// deletes the node and prunes ancestors that become empty.
pub fn set_at(root: &mut Value, segments: &[String], value: Value) {
    let value = normalize(value);

    let Some((last, parents)) = segments.split_last() else {
        *root = value;
        return;
    };

    if value.is_null() {
        remove_at(root, segments);
        return;
    }

    let mut node = root;
    for segment in parents {
        node = object_mut(node)
            .entry(segment.clone())
            .or_insert(Value::Null);
    }
    object_mut(node).insert(last.clone(), value);
}

/// Apply a multi-location update relative to `segments`.
///
/// Each key of `fields` may itself be a `/`-separated relative path.
pub fn merge_at(root: &mut Value, segments: &[String], fields: Map<String, Value>) {
    for (key, value) in fields {
        let mut target = segments.to_vec();
        target.extend(
            key.split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        );
        set_at(root, &target, value);
    }
}

/// Drop `null` members and empty objects, recursively.
#[must_use]
pub fn normalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let map: Map<String, Value> = map
                .into_iter()
                .map(|(k, v)| (k, normalize(v)))
                .filter(|(_, v)| !v.is_null())
                .collect();
            if map.is_empty() {
                Value::Null
            } else {
                Value::Object(map)
            }
        }
        Value::Array(items) => {
            let items: Vec<Value> = items.into_iter().map(normalize).collect();
            if items.is_empty() {
                Value::Null
            } else {
                Value::Array(items)
            }
        }
        other => other,
    }
}

/// Delete the node at `segments`, then prune empty ancestors.
/// Returns whether the subtree at this level became empty.
fn remove_at(node: &mut Value, segments: &[String]) -> bool {
    let Some((first, rest)) = segments.split_first() else {
        *node = Value::Null;
        return true;
    };

    let Value::Object(map) = node else {
        return node.is_null();
    };

    let child_emptied = match map.get_mut(first.as_str()) {
        Some(child) if !rest.is_empty() => remove_at(child, rest),
        Some(_) => true,
        None => false,
    };
    if child_emptied {
        map.remove(first.as_str());
    }

    if map.is_empty() {
        *node = Value::Null;
        true
    } else {
        false
    }
}

/// Coerce `node` into an object (replacing any scalar) and borrow its map.
fn object_mut(node: &mut Value) -> &mut Map<String, Value> {
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    match node {
        Value::Object(map) => map,
        _ => unreachable!("node was just made an object"),
    }
}
