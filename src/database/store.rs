use super::snapshot::DataSnapshot;
use super::{DatabaseError, FirebaseDatabase};
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Path-addressed access to a hierarchical JSON store.
///
/// `FirebaseDatabase` implements this against the REST API and
/// `MemoryDatabase` against an in-process tree. Setting `null` is the same as
/// removing.
#[async_trait]
pub trait Store: Send + Sync {
    /// Replaces everything at `path` with `value`.
    async fn set_value(&self, path: &str, value: Value) -> Result<(), DatabaseError>;

    /// Replaces each child of `path` named in `values`, leaving the rest alone.
    async fn update_values(
        &self,
        path: &str,
        values: Map<String, Value>,
    ) -> Result<(), DatabaseError>;

    /// Removes everything at `path`.
    async fn remove_value(&self, path: &str) -> Result<(), DatabaseError>;

    /// Reads `path`.
    async fn get_value(&self, path: &str) -> Result<DataSnapshot, DatabaseError>;
}

#[async_trait]
impl Store for FirebaseDatabase {
    async fn set_value(&self, path: &str, value: Value) -> Result<(), DatabaseError> {
        self.reference(path).set(&value).await
    }

    async fn update_values(
        &self,
        path: &str,
        values: Map<String, Value>,
    ) -> Result<(), DatabaseError> {
        self.reference(path).update(&values).await
    }

    async fn remove_value(&self, path: &str) -> Result<(), DatabaseError> {
        self.reference(path).remove().await
    }

    async fn get_value(&self, path: &str) -> Result<DataSnapshot, DatabaseError> {
        self.reference(path).get().await
    }
}
