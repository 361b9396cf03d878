//! Named collections over one adapter. Collections are created lazily and
//! cached, so repeated lookups return the same handle.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::adapter::Adapter;
use crate::collection::Collection;
use crate::errors::DbError;
use crate::transform::{Identity, Transform};

pub struct Repository {
    adapter: Arc<dyn Adapter>,
    transform: Arc<dyn Transform>,
    collections: RwLock<HashMap<String, Arc<Collection>>>,
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository").field("collections", &self.collections.read().len()).finish_non_exhaustive()
    }
}

impl Repository {
    pub fn new(adapter: Arc<dyn Adapter>) -> Self {
        Self::with_transform(adapter, Arc::new(Identity))
    }

    pub fn with_transform(adapter: Arc<dyn Adapter>, transform: Arc<dyn Transform>) -> Self {
        Self { adapter, transform, collections: RwLock::new(HashMap::new()) }
    }

    /// Returns the cached handle for `name`, creating it on first use.
    pub fn collection(&self, name: &str) -> Arc<Collection> {
        if let Some(c) = self.collections.read().get(name) {
            return Arc::clone(c);
        }
        let mut map = self.collections.write();
        Arc::clone(map.entry(name.to_string()).or_insert_with(|| {
            Arc::new(Collection::with_transform(name, Arc::clone(&self.adapter), Arc::clone(&self.transform)))
        }))
    }

    /// Collection names known to the backend.
    ///
    /// # Errors
    /// Propagates backend failures.
    pub fn names(&self) -> Result<Vec<String>, DbError> {
        self.adapter.collection_names()
    }

    /// Drops the backend collection and forgets the cached handle.
    ///
    /// # Errors
    /// Returns `DbError::FeatureNotImplemented` when the backend cannot drop.
    pub fn drop_collection(&self, name: &str) -> Result<bool, DbError> {
        let dropped = self.adapter.drop_collection(name)?;
        self.collections.write().remove(name);
        Ok(dropped)
    }
}
