//! An in-process `Store` with Realtime Database path semantics.
//!
//! Nulls are never stored: writing `null` removes, and a parent whose last child
//! is removed disappears with it. Arrays are addressed by index, like the
//! server's own array handling.

use super::reference::{split_path, validate_key};
use super::snapshot::DataSnapshot;
use super::store::Store;
use super::DatabaseError;
use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct MemoryDatabase {
    root: RwLock<Value>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a database whose initial contents are `value`.
    pub fn with_contents(value: Value) -> Self {
        Self {
            root: RwLock::new(prune(value)),
        }
    }

    /// A copy of the whole tree.
    pub async fn contents(&self) -> Value {
        self.root.read().await.clone()
    }
}

fn keys(path: &str) -> Result<Vec<String>, DatabaseError> {
    let keys = split_path(path);
    for key in &keys {
        validate_key(key)?;
    }
    Ok(keys)
}

/// Drops nulls and empty containers, recursively.
///
/// Arrays keep interior nulls as holes so indices stay put, but lose trailing
/// ones; an array of nothing but nulls is dropped.
fn prune(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let map: Map<String, Value> = map
                .into_iter()
                .map(|(k, v)| (k, prune(v)))
                .filter(|(_, v)| !v.is_null())
                .collect();
            if map.is_empty() {
                Value::Null
            } else {
                Value::Object(map)
            }
        }
        Value::Array(items) => {
            let mut items: Vec<Value> = items.into_iter().map(prune).collect();
            trim_array(&mut items);
            if items.is_empty() {
                Value::Null
            } else {
                Value::Array(items)
            }
        }
        other => other,
    }
}

fn trim_array(items: &mut Vec<Value>) {
    while items.last().is_some_and(Value::is_null) {
        items.pop();
    }
}

/// Converts an array to the index-keyed object the server stores it as.
fn array_to_object(items: Vec<Value>) -> Map<String, Value> {
    items
        .into_iter()
        .enumerate()
        .filter(|(_, v)| !v.is_null())
        .map(|(i, v)| (i.to_string(), v))
        .collect()
}

fn lookup<'v>(root: &'v Value, keys: &[String]) -> Option<&'v Value> {
    keys.iter().try_fold(root, |node, key| match node {
        Value::Object(map) => map.get(key),
        Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

fn write(node: &mut Value, keys: &[String], value: Value) {
    let Some((first, rest)) = keys.split_first() else {
        *node = value;
        return;
    };

    if let Value::Array(items) = node {
        if let Ok(index) = first.parse::<usize>() {
            if value.is_null() && index >= items.len() {
                return;
            }
            if index >= items.len() {
                items.resize(index + 1, Value::Null);
            }
            write(&mut items[index], rest, value);
            trim_array(items);
            if items.is_empty() {
                *node = Value::Null;
            }
            return;
        }
        // A non-index key turns the array into an object, keeping its elements.
        let items = std::mem::take(items);
        *node = Value::Object(array_to_object(items));
    }

    if !node.is_object() {
        // Removing below a leaf or an empty node changes nothing.
        if value.is_null() {
            return;
        }
        *node = Value::Object(Map::new());
    }

    let now_empty = match node {
        Value::Object(map) => {
            let child = map.entry(first.clone()).or_insert(Value::Null);
            write(child, rest, value);
            if child.is_null() {
                map.remove(first);
            }
            map.is_empty()
        }
        _ => false,
    };
    if now_empty {
        *node = Value::Null;
    }
}

#[async_trait]
impl Store for MemoryDatabase {
    async fn set_value(&self, path: &str, value: Value) -> Result<(), DatabaseError> {
        let keys = keys(path)?;
        let mut root = self.root.write().await;
        write(&mut root, &keys, prune(value));
        Ok(())
    }

    async fn update_values(
        &self,
        path: &str,
        values: Map<String, Value>,
    ) -> Result<(), DatabaseError> {
        let base = keys(path)?;
        let mut writes = Vec::with_capacity(values.len());
        for (child, value) in values {
            let mut target = base.clone();
            target.extend(keys(&child)?);
            writes.push((target, prune(value)));
        }

        // Validate everything first so a bad key leaves the tree untouched.
        let mut root = self.root.write().await;
        for (target, value) in writes {
            write(&mut root, &target, value);
        }
        Ok(())
    }

    async fn remove_value(&self, path: &str) -> Result<(), DatabaseError> {
        self.set_value(path, Value::Null).await
    }

    async fn get_value(&self, path: &str) -> Result<DataSnapshot, DatabaseError> {
        let keys = keys(path)?;
        let root = self.root.read().await;
        let value = lookup(&root, &keys).cloned().unwrap_or(Value::Null);
        Ok(DataSnapshot::new(keys.last().cloned(), value))
    }
}
