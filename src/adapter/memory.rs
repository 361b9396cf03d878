//! In-process backend: each collection is a shared, growable sequence of records.
//!
//! Queries hold a reference to the store, not a copy, and look their collection
//! up when they execute, so records written after a query is built are visible.
//! Reading a name never creates it; only inserts do. Results are cloned out of
//! the store.

use bson::{Bson, Document};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use super::{Adapter, OpResult, audit, validate_changes, validate_record, validate_selector};
use crate::errors::{DbError, Errors};
use crate::query::{Criterion, HashFilter, Plan, Query, QuerySource, RecordOrder, Selector};

pub type SharedRecords = Arc<RwLock<Vec<Document>>>;

/// Map from collection name to its record sequence.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, SharedRecords>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the named sequence, creating an empty one on first use.
    pub fn collection(&self, name: &str) -> SharedRecords {
        if let Some(c) = self.collections.read().get(name) {
            return Arc::clone(c);
        }
        Arc::clone(self.collections.write().entry(name.to_string()).or_default())
    }

    /// Returns the named sequence if it has been created.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<SharedRecords> {
        self.collections.read().get(name).map(Arc::clone)
    }

    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.collections.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn drop_collection(&self, name: &str) -> bool {
        self.collections.write().remove(name).is_some()
    }
}

/// In-memory reading of a criteria list: selectors merge, the last limit,
/// offset and order win.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryPlan {
    pub selector: Selector,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    pub order: Option<RecordOrder>,
}

impl Plan for MemoryPlan {
    fn apply(&mut self, criterion: &Criterion) {
        match criterion {
            Criterion::Match(s) => self.selector = self.selector.merge(s),
            Criterion::Limit(n) => self.limit = Some(*n),
            Criterion::Offset(n) => self.offset = Some(*n),
            Criterion::Order(o) => self.order = Some(o.clone()),
        }
    }
}

impl MemoryPlan {
    /// Filter, then order, then skip `offset`, then take `limit`.
    ///
    /// # Errors
    /// Returns `DbError::IncomparableValues` when ordering hits mixed types.
    pub fn execute(&self, records: &[Document]) -> Result<Vec<Document>, DbError> {
        if self.limit == Some(0) {
            return Ok(Vec::new());
        }
        let filter = HashFilter::new(&self.selector)?;
        let mut matched: Vec<&Document> = records.iter().filter(|r| filter.matches(r)).collect();
        if let Some(order) = &self.order {
            matched = order.sort(matched)?;
        }
        Ok(matched
            .into_iter()
            .skip(self.offset.unwrap_or(0))
            .take(self.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    /// Result cardinality without ordering or copying.
    ///
    /// # Errors
    /// Returns an error only if the selector fails to compile.
    pub fn count(&self, records: &[Document]) -> Result<usize, DbError> {
        if self.limit == Some(0) {
            return Ok(0);
        }
        let filter = HashFilter::new(&self.selector)?;
        let matched = records.iter().filter(|r| filter.matches(r)).count();
        let after_offset = matched.saturating_sub(self.offset.unwrap_or(0));
        Ok(after_offset.min(self.limit.unwrap_or(usize::MAX)))
    }

    /// Stops scanning as soon as one record past the offset matches.
    ///
    /// # Errors
    /// Returns an error only if the selector fails to compile.
    pub fn exists(&self, records: &[Document]) -> Result<bool, DbError> {
        if self.limit == Some(0) {
            return Ok(false);
        }
        let filter = HashFilter::new(&self.selector)?;
        let needed = self.offset.unwrap_or(0).saturating_add(1);
        Ok(records.iter().filter(|r| filter.matches(r)).take(needed).count() == needed)
    }
}

struct MemorySource {
    name: String,
    store: Arc<MemoryStore>,
}

impl MemorySource {
    fn with_records<T>(&self, f: impl FnOnce(&[Document]) -> T) -> T {
        match self.store.get(&self.name) {
            Some(records) => f(&records.read()),
            None => f(&[]),
        }
    }
}

impl QuerySource for MemorySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch(&self, criteria: &[Criterion]) -> Result<Vec<Document>, DbError> {
        let plan = MemoryPlan::compile(criteria);
        self.with_records(|records| plan.execute(records))
    }

    fn count(&self, criteria: &[Criterion]) -> Result<usize, DbError> {
        let plan = MemoryPlan::compile(criteria);
        self.with_records(|records| plan.count(records))
    }

    fn exists(&self, criteria: &[Criterion]) -> Result<bool, DbError> {
        let plan = MemoryPlan::compile(criteria);
        self.with_records(|records| plan.exists(records))
    }
}

/// Adapter over a `MemoryStore`. Cloning shares the store.
#[derive(Debug, Clone, Default)]
pub struct MemoryAdapter {
    store: Arc<MemoryStore>,
}

impl MemoryAdapter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_store(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<MemoryStore> {
        &self.store
    }
}

impl Adapter for MemoryAdapter {
    fn insert_one(&self, collection: &str, record: Bson) -> Result<OpResult, DbError> {
        let mut errors = Errors::new();
        let result = match validate_record(record, &mut errors) {
            Some(record) => {
                self.store.collection(collection).write().push(record.clone());
                OpResult::ok(1, vec![record])
            }
            None => OpResult::invalid(errors),
        };
        audit("insert", collection, &result);
        Ok(result)
    }

    fn delete_matching(&self, collection: &str, selector: Bson) -> Result<OpResult, DbError> {
        let mut errors = Errors::new();
        let Some(selector) = validate_selector(selector, &mut errors) else {
            let result = OpResult::invalid(errors);
            audit("delete", collection, &result);
            return Ok(result);
        };
        let filter = HashFilter::new(&selector)?;
        let Some(shared) = self.store.get(collection) else {
            let result = OpResult::ok(0, Vec::new());
            audit("delete", collection, &result);
            return Ok(result);
        };
        let mut records = shared.write();
        let (removed, kept): (Vec<Document>, Vec<Document>) =
            std::mem::take(&mut *records).into_iter().partition(|r| filter.matches(r));
        *records = kept;
        drop(records);
        let result = OpResult::ok(removed.len(), removed);
        audit("delete", collection, &result);
        Ok(result)
    }

    fn update_matching(&self, collection: &str, selector: Bson, changes: Bson) -> Result<OpResult, DbError> {
        let mut errors = Errors::new();
        let selector = validate_selector(selector, &mut errors);
        let changes = validate_changes(changes, &mut errors);
        let (Some(selector), Some(changes)) = (selector, changes) else {
            let result = OpResult::invalid(errors);
            audit("update", collection, &result);
            return Ok(result);
        };
        let filter = HashFilter::new(&selector)?;
        let mut updated = Vec::new();
        if let Some(shared) = self.store.get(collection) {
            for record in shared.write().iter_mut().filter(|r| filter.matches(r)) {
                for (k, v) in &changes {
                    record.insert(k.clone(), v.clone());
                }
                updated.push(record.clone());
            }
        }
        let result = OpResult::ok(updated.len(), updated);
        audit("update", collection, &result);
        Ok(result)
    }

    fn query(&self, collection: &str) -> Query {
        Query::new(Arc::new(MemorySource { name: collection.to_string(), store: Arc::clone(&self.store) }))
    }

    fn collection_names(&self) -> Result<Vec<String>, DbError> {
        Ok(self.store.names())
    }

    fn drop_collection(&self, collection: &str) -> Result<bool, DbError> {
        Ok(self.store.drop_collection(collection))
    }
}
