//! State store trait definition.
//!
//! This module defines the common interface for state storage backends.

use async_trait::async_trait;

use super::types::StateSnapshot;
use crate::error::Result;

/// Trait for state storage backends, keyed by resource instance id.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Loads the snapshot of one instance.
    ///
    /// Returns `None` if no state exists yet.
    async fn load(&self, id: &str) -> Result<Option<StateSnapshot>>;

    /// Saves a snapshot under its id, replacing any previous one.
    async fn save(&self, snapshot: &StateSnapshot) -> Result<()>;

    /// Deletes the snapshot of one instance.
    ///
    /// Returns `false` if there was nothing to delete.
    async fn delete(&self, id: &str) -> Result<bool>;

    /// Checks if state exists for an instance.
    async fn exists(&self, id: &str) -> Result<bool>;

    /// Lists stored instance ids in lexical order.
    async fn list(&self) -> Result<Vec<String>>;

    /// Gets the backend type name.
    fn backend_type(&self) -> &'static str;
}

#[async_trait]
impl StateStore for Box<dyn StateStore> {
    async fn load(&self, id: &str) -> Result<Option<StateSnapshot>> {
        (**self).load(id).await
    }

    async fn save(&self, snapshot: &StateSnapshot) -> Result<()> {
        (**self).save(snapshot).await
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        (**self).delete(id).await
    }

    async fn exists(&self, id: &str) -> Result<bool> {
        (**self).exists(id).await
    }

    async fn list(&self) -> Result<Vec<String>> {
        (**self).list().await
    }

    fn backend_type(&self) -> &'static str {
        (**self).backend_type()
    }
}
