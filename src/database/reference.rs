use super::snapshot::DataSnapshot;
use super::{DatabaseError, FirebaseDatabase};
use crate::core::parse_error_response;
use reqwest::header;
use serde::ser::Error as SerError;
use serde::{Deserialize, Serialize};
use serde_json::Value as SerdeValue;

// Characters the Realtime Database refuses in keys.
const FORBIDDEN_KEY_CHARS: &[char] = &['.', '#', '$', '[', ']', '/'];

/// Splits a slash-separated path into keys, ignoring empty segments.
pub(crate) fn split_path(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}

pub(crate) fn validate_key(key: &str) -> Result<(), DatabaseError> {
    if key.is_empty() {
        return Err(DatabaseError::InvalidPath("empty key".to_string()));
    }
    if let Some(c) = key
        .chars()
        .find(|c| FORBIDDEN_KEY_CHARS.contains(c) || c.is_ascii_control())
    {
        return Err(DatabaseError::InvalidPath(format!(
            "key {:?} contains forbidden character {:?}",
            key, c
        )));
    }
    Ok(())
}

#[derive(Deserialize)]
struct PushResponse {
    name: String,
}

/// A reference to a location in the database.
///
/// Creating a reference never touches the network; paths are validated when a
/// request is made.
#[derive(Clone)]
pub struct DatabaseReference<'a> {
    pub(crate) database: &'a FirebaseDatabase,
    pub(crate) path: Vec<String>,
}

impl std::fmt::Debug for DatabaseReference<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseReference")
            .field("path", &self.path())
            .finish()
    }
}

impl<'a> DatabaseReference<'a> {
    /// Gets a reference to the location at the relative `path`.
    pub fn child(&self, path: &str) -> DatabaseReference<'a> {
        let mut child_path = self.path.clone();
        child_path.extend(split_path(path));
        DatabaseReference {
            database: self.database,
            path: child_path,
        }
    }

    /// The parent location, or `None` for the root.
    pub fn parent(&self) -> Option<DatabaseReference<'a>> {
        let (_, parents) = self.path.split_last()?;
        Some(DatabaseReference {
            database: self.database,
            path: parents.to_vec(),
        })
    }

    /// The last key of the path, or `None` for the root.
    pub fn key(&self) -> Option<&str> {
        self.path.last().map(String::as_str)
    }

    /// The slash-separated path, `/` for the root.
    pub fn path(&self) -> String {
        format!("/{}", self.path.join("/"))
    }

    /// Reads the value at this location.
    ///
    /// A location with no data yields a snapshot whose value is `null`.
    pub async fn get(&self) -> Result<DataSnapshot, DatabaseError> {
        let url = self.database.node_url(&self.path)?;
        tracing::debug!(path = %self.path(), "get");

        let response = self.database.client().get(url).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            return Err(DatabaseError::Api {
                status,
                message: parse_error_response(response, "Get value failed").await,
            });
        }

        let value: SerdeValue = response.json().await?;
        Ok(DataSnapshot::new(self.key().map(str::to_string), value))
    }

    /// Replaces the data at this location with `value`.
    pub async fn set<T: Serialize>(&self, value: &T) -> Result<(), DatabaseError> {
        let body = serde_json::to_vec(value)?;
        self.put(body).await
    }

    /// Replaces the data at this location with an already-serialized JSON document.
    ///
    /// The document is checked locally and rejected if it is not valid JSON.
    pub async fn set_raw_json(&self, json: &str) -> Result<(), DatabaseError> {
        serde_json::from_str::<serde::de::IgnoredAny>(json)?;
        self.put(json.as_bytes().to_vec()).await
    }

    async fn put(&self, body: Vec<u8>) -> Result<(), DatabaseError> {
        let url = self.database.node_url(&self.path)?;
        tracing::debug!(path = %self.path(), "set");

        let response = self
            .database
            .client()
            .put(url)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            return Err(DatabaseError::Api {
                status,
                message: parse_error_response(response, "Set value failed").await,
            });
        }

        Ok(())
    }

    /// Writes the given children without touching any others.
    ///
    /// `values` must serialize to an object. Its keys may be multi-segment paths
    /// (e.g. `"alice/Email"`), each relative to this location.
    pub async fn update<T: Serialize>(&self, values: &T) -> Result<(), DatabaseError> {
        let SerdeValue::Object(map) = serde_json::to_value(values)? else {
            return Err(DatabaseError::SerializationError(SerError::custom(
                "Can only update with an object",
            )));
        };
        for key in map.keys() {
            for segment in split_path(key) {
                validate_key(&segment)?;
            }
        }

        let url = self.database.node_url(&self.path)?;
        tracing::debug!(path = %self.path(), children = map.len(), "update");

        let response = self
            .database
            .client()
            .patch(url)
            .header(header::CONTENT_TYPE, "application/json")
            .body(serde_json::to_vec(&map)?)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            return Err(DatabaseError::Api {
                status,
                message: parse_error_response(response, "Update children failed").await,
            });
        }

        Ok(())
    }

    /// Appends `value` under a server-generated, chronologically ordered key.
    ///
    /// Returns a reference to the new child.
    pub async fn push<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<DatabaseReference<'a>, DatabaseError> {
        let url = self.database.node_url(&self.path)?;
        tracing::debug!(path = %self.path(), "push");

        let response = self
            .database
            .client()
            .post(url)
            .header(header::CONTENT_TYPE, "application/json")
            .body(serde_json::to_vec(value)?)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            return Err(DatabaseError::Api {
                status,
                message: parse_error_response(response, "Push value failed").await,
            });
        }

        let pushed: PushResponse = response.json().await?;
        Ok(self.child(&pushed.name))
    }

    /// Removes the data at this location, including all children.
    pub async fn remove(&self) -> Result<(), DatabaseError> {
        let url = self.database.node_url(&self.path)?;
        tracing::debug!(path = %self.path(), "remove");

        let response = self.database.client().delete(url).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            return Err(DatabaseError::Api {
                status,
                message: parse_error_response(response, "Remove value failed").await,
            });
        }

        Ok(())
    }
}
