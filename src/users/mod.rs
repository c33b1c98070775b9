//! User records kept under `<collection>/<record id>`.
//!
//! `UserDirectory` is a thin layer over any `Store`: it builds the paths and
//! the document shape, nothing more. It does not retry, and it does not
//! validate field values.
//!
//! # Examples
//!
//! ```rust,no_run
//! # use firebase_rtdb_users::database::memory::MemoryDatabase;
//! # use firebase_rtdb_users::users::{UserDirectory, USERNAME_FIELD};
//! # async fn run() -> Result<(), firebase_rtdb_users::database::DatabaseError> {
//! let users = UserDirectory::new(MemoryDatabase::new());
//!
//! users.create_record("users", "alice", "alice", "alice@example.com").await?;
//! users.update_field("users", "alice", USERNAME_FIELD, "alice2").await?;
//! let username = users.read_field("users", "alice", USERNAME_FIELD).await;
//! # Ok(())
//! # }
//! ```

pub mod panel;


use crate::database::reference::validate_key;
use crate::database::snapshot::DataSnapshot;
use crate::database::store::Store;
use crate::database::DatabaseError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Field holding the user's name.
pub const USERNAME_FIELD: &str = "Username";
/// Field holding the user's email address.
pub const EMAIL_FIELD: &str = "Email";

/// The document stored for each user.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct User {
    pub username: String,
    pub email: String,
}

impl User {
    pub fn new(username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
        }
    }
}

/// How a field read ended.
#[derive(Debug)]
pub enum ReadOutcome {
    /// The store reported an error.
    Faulted(DatabaseError),
    /// The read went through. `None` when the record or field does not exist.
    Completed(Option<Value>),
}

impl ReadOutcome {
    pub fn is_faulted(&self) -> bool {
        matches!(self, ReadOutcome::Faulted(_))
    }
}

// Each part must be exactly one key. An empty or slash-bearing part would
// otherwise collapse the path onto a parent, e.g. `users/` onto the whole
// collection.
fn join_keys(keys: &[&str]) -> Result<String, DatabaseError> {
    for key in keys {
        validate_key(key)?;
    }
    Ok(keys.join("/"))
}

fn record_path(collection: &str, record_id: &str) -> Result<String, DatabaseError> {
    join_keys(&[collection, record_id])
}

fn field_path(collection: &str, record_id: &str, field: &str) -> Result<String, DatabaseError> {
    join_keys(&[collection, record_id, field])
}

/// CRUD operations on user records.
///
/// Cloning is cheap; clones share the store.
pub struct UserDirectory<S> {
    store: Arc<S>,
}

impl<S> Clone for UserDirectory<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: Store> UserDirectory<S> {
    pub fn new(store: S) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Writes `{Username, Email}` at `collection/record_id`, replacing whatever was there.
    pub async fn create_record(
        &self,
        collection: &str,
        record_id: &str,
        username: &str,
        email: &str,
    ) -> Result<(), DatabaseError> {
        let document = serde_json::to_value(User::new(username, email))?;
        let path = record_path(collection, record_id)?;
        self.store.set_value(&path, document).await?;
        tracing::debug!(collection, record_id, "record written");
        Ok(())
    }

    /// Replaces `collection/record_id/field` only; sibling fields are left alone.
    pub async fn update_field(
        &self,
        collection: &str,
        record_id: &str,
        field: &str,
        value: impl Into<Value>,
    ) -> Result<(), DatabaseError> {
        let path = field_path(collection, record_id, field)?;
        self.store.set_value(&path, value.into()).await?;
        tracing::debug!(collection, record_id, field, "field updated");
        Ok(())
    }

    /// Removes the record and all of its fields.
    pub async fn delete_record(
        &self,
        collection: &str,
        record_id: &str,
    ) -> Result<(), DatabaseError> {
        let path = record_path(collection, record_id)?;
        self.store.remove_value(&path).await?;
        tracing::debug!(collection, record_id, "record deleted");
        Ok(())
    }

    /// Reads a single field.
    ///
    /// Errors, including an invalid path, come back as `ReadOutcome::Faulted`;
    /// a missing record or field is `ReadOutcome::Completed(None)`.
    pub async fn read_field(&self, collection: &str, record_id: &str, field: &str) -> ReadOutcome {
        let path = match field_path(collection, record_id, field) {
            Ok(path) => path,
            Err(e) => return ReadOutcome::Faulted(e),
        };
        match self.store.get_value(&path).await {
            Ok(snapshot) if snapshot.exists() => {
                ReadOutcome::Completed(Some(snapshot.into_value()))
            }
            Ok(_) => ReadOutcome::Completed(None),
            Err(e) => ReadOutcome::Faulted(e),
        }
    }

    /// Reads the whole record, or `None` if it does not exist.
    pub async fn read_record(
        &self,
        collection: &str,
        record_id: &str,
    ) -> Result<Option<User>, DatabaseError> {
        let path = record_path(collection, record_id)?;
        self.store.get_value(&path).await?.get()
    }

    /// Reads every record in `collection` in one request.
    pub async fn read_collection(&self, collection: &str) -> Result<DataSnapshot, DatabaseError> {
        let path = join_keys(&[collection])?;
        self.store.get_value(&path).await
    }
}

impl<S: Store + 'static> UserDirectory<S> {
    /// Reads a field in the background and hands the outcome to `continuation`.
    ///
    /// `continuation` runs exactly once, on a runtime worker.
    pub fn read_field_then<F>(
        &self,
        collection: &str,
        record_id: &str,
        field: &str,
        continuation: F,
    ) -> JoinHandle<()>
    where
        F: FnOnce(ReadOutcome) + Send + 'static,
    {
        let directory = self.clone();
        let collection = collection.to_string();
        let record_id = record_id.to_string();
        let field = field.to_string();

        tokio::spawn(async move {
            let outcome = directory.read_field(&collection, &record_id, &field).await;
            continuation(outcome);
        })
    }
}
