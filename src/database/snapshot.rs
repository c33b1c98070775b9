use super::reference::split_path;
use super::DatabaseError;
use serde::de::DeserializeOwned;
use serde_json::Value as SerdeValue;

/// A snapshot of the data at a database location.
///
/// Missing data is represented by a `null` value; `exists()` reports whether
/// there is anything there.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSnapshot {
    pub(crate) key: Option<String>,
    pub(crate) value: SerdeValue,
}

impl DataSnapshot {
    pub fn new(key: Option<String>, value: SerdeValue) -> Self {
        Self { key, value }
    }

    /// The key of the location this snapshot was read from. `None` for the root.
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Returns `true` if the snapshot contains any data.
    pub fn exists(&self) -> bool {
        !self.value.is_null()
    }

    /// The raw JSON value.
    pub fn value(&self) -> &SerdeValue {
        &self.value
    }

    pub fn into_value(self) -> SerdeValue {
        self.value
    }

    /// Navigates to a descendant without another request.
    ///
    /// # Arguments
    ///
    /// * `path` - A relative slash-separated path (e.g., "alice/Email").
    pub fn child(&self, path: &str) -> DataSnapshot {
        let keys = split_path(path);
        let mut node = Some(&self.value);
        for key in &keys {
            node = node.and_then(|value| match value {
                SerdeValue::Object(map) => map.get(key),
                // Sequential numeric keys come back from the server as arrays.
                SerdeValue::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => None,
            });
        }

        DataSnapshot {
            key: keys.last().cloned().or_else(|| self.key.clone()),
            value: node.cloned().unwrap_or(SerdeValue::Null),
        }
    }

    pub fn has_child(&self, path: &str) -> bool {
        self.child(path).exists()
    }

    /// Number of direct children. Leaves have none.
    pub fn children_count(&self) -> usize {
        match &self.value {
            SerdeValue::Object(map) => map.len(),
            SerdeValue::Array(items) => items.iter().filter(|v| !v.is_null()).count(),
            _ => 0,
        }
    }

    /// Deserializes the value, or returns `Ok(None)` if there is no data.
    pub fn get<T: DeserializeOwned>(&self) -> Result<Option<T>, DatabaseError> {
        if !self.exists() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_value(self.value.clone())?))
    }
}
