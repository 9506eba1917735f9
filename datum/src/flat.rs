//! Conversion between nested value trees and flat path-keyed maps.

use indexmap::IndexMap;

use crate::path::FieldPath;
use crate::path::Segment;
use crate::path::is_same_or_descendant;
use crate::path::join_index;
use crate::path::join_key;
use crate::value::Map;
use crate::value::Value;

/// Flattened representation of a value tree, keyed by leaf path.
pub type FlatMap = IndexMap<String, Value>;

/// Flattens a value tree into a map of leaf paths.
///
/// Objects are descended into with `.`-joined keys. Non-empty arrays are
/// expanded into `[n]` keys unless `skip_array` is set, in which case they are
/// stored whole. Empty objects and arrays are kept as leaves so that
/// [`unflatten`] can restore them. A top-level value that is not a container
/// flattens to an empty map.
pub fn flatten(value: &Value, skip_array: bool) -> FlatMap {
    let mut result = FlatMap::new();
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                flatten_into(&mut result, key.clone(), child, skip_array);
            }
        }
        Value::Array(items) if !skip_array => {
            for (index, child) in items.iter().enumerate() {
                flatten_into(&mut result, join_index("", index), child, skip_array);
            }
        }
        _ => {}
    }
    result
}

fn flatten_into(result: &mut FlatMap, prop: String, value: &Value, skip_array: bool) {
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (key, child) in map {
                flatten_into(result, join_key(&prop, key), child, skip_array);
            }
        }
        Value::Array(items) if !items.is_empty() && !skip_array => {
            for (index, child) in items.iter().enumerate() {
                flatten_into(result, join_index(&prop, index), child, skip_array);
            }
        }
        _ => {
            result.insert(prop, value.clone());
        }
    }
}

/// Largest run of [`Value::Undefined`] an index may open past the end of an
/// array while unflattening.
pub const MAX_ARRAY_HOLE: usize = 1024;

/// Rebuilds a value tree from a flat map.
///
/// Keys that fail to parse as a [`FieldPath`] are treated as a single
/// member name, as are keys whose index would leave a hole longer than
/// [`MAX_ARRAY_HOLE`]. Array holes are filled with [`Value::Undefined`].
pub fn unflatten(flat: &FlatMap) -> Value {
    let mut root = Value::Object(Map::new());
    for (key, value) in flat {
        match FieldPath::parse(key) {
            Ok(path) if !path.is_root() && within_hole_limit(&root, path.segments()) => {
                insert(&mut root, path.segments(), value.clone())
            }
            _ => insert(&mut root, &[Segment::Key(key.clone())], value.clone()),
        }
    }
    root
}

fn within_hole_limit(root: &Value, segments: &[Segment]) -> bool {
    let mut node = Some(root);
    for segment in segments {
        match segment {
            Segment::Key(key) => {
                node = match node {
                    Some(Value::Object(map)) => map.get(key),
                    _ => None,
                };
            }
            Segment::Index(index) => {
                let len = match node {
                    Some(Value::Array(items)) => items.len(),
                    _ => 0,
                };
                if *index > len.saturating_add(MAX_ARRAY_HOLE) {
                    return false;
                }
                node = match node {
                    Some(Value::Array(items)) => items.get(*index),
                    _ => None,
                };
            }
        }
    }
    true
}

fn insert(node: &mut Value, segments: &[Segment], value: Value) {
    let Some((first, rest)) = segments.split_first() else {
        *node = value;
        return;
    };

    match first {
        Segment::Key(key) => {
            if !node.is_object() {
                *node = Value::Object(Map::new());
            }
            if let Value::Object(map) = node {
                let child = map.entry(key.clone()).or_insert(Value::Undefined);
                insert(child, rest, value);
            }
        }
        Segment::Index(index) => {
            if !node.is_array() {
                *node = Value::Array(Vec::new());
            }
            if let Value::Array(items) = node {
                if items.len() <= *index {
                    items.resize(index + 1, Value::Undefined);
                }
                insert(&mut items[*index], rest, value);
            }
        }
    }
}

/// Walks `path` into a value tree.
pub fn get_path<'a>(tree: &'a Value, path: &FieldPath) -> Option<&'a Value> {
    path.segments()
        .iter()
        .try_fold(tree, |node, segment| match (segment, node) {
            (Segment::Key(key), Value::Object(map)) => map.get(key),
            (Segment::Index(index), Value::Array(items)) => items.get(*index),
            _ => None,
        })
}

/// Compares two flat maps key by key without descending into leaves.
pub fn shallow_equal(a: &FlatMap, b: &FlatMap) -> bool {
    a.len() == b.len() && a.iter().all(|(key, value)| b.get(key) == Some(value))
}

/// Removes `name` and every path beneath it.
pub fn remove_path(flat: &mut FlatMap, name: &str) {
    flat.retain(|key, _| !is_same_or_descendant(key, name));
}

/// Reads `name` from a flat map, falling back to walking a tree rebuilt from
/// the keys at, above and below `name`.
pub(crate) fn lookup(flat: &FlatMap, name: &str) -> Option<Value> {
    if let Some(value) = flat.get(name)
        && !value.is_undefined()
    {
        return Some(value.clone());
    }

    let path = FieldPath::parse(name).ok()?;
    let related: FlatMap = flat
        .iter()
        .filter(|(key, _)| is_same_or_descendant(key, name) || is_same_or_descendant(name, key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    let tree = unflatten(&related);
    get_path(&tree, &path)
        .filter(|value| !value.is_undefined())
        .cloned()
}
