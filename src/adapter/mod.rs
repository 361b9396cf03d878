//! Backend capability providers: persistence operations plus backend-specific queries.

pub mod memory;
pub mod remote;

use bson::{Bson, Document};
use serde::Serialize;

use crate::errors::{DbError, Errors};
use crate::query::{Operator, Query, Selector};
use crate::types::{canonicalize, type_name};

pub use memory::{MemoryAdapter, MemoryPlan, MemoryStore};
pub use remote::{DocumentStoreClient, RemoteAdapter, RemoteFindOptions, RemotePlan, translate_selector};

/// Outcome of a mutating adapter operation. On validation failure `errors` is
/// non-empty, `count` is zero and the backend was never called.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OpResult {
    pub count: usize,
    pub data: Vec<Document>,
    pub errors: Errors,
}

impl OpResult {
    #[must_use]
    pub fn ok(count: usize, data: Vec<Document>) -> Self {
        Self { count, data, errors: Errors::new() }
    }

    #[must_use]
    pub fn invalid(errors: Errors) -> Self {
        Self { count: 0, data: Vec::new(), errors }
    }

    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

pub trait Adapter: Send + Sync {
    /// # Errors
    /// Propagates backend failures; validation failures are reported in the result.
    fn insert_one(&self, collection: &str, record: Bson) -> Result<OpResult, DbError>;

    /// # Errors
    /// Propagates backend failures; validation failures are reported in the result.
    fn delete_matching(&self, collection: &str, selector: Bson) -> Result<OpResult, DbError>;

    /// Sets every top-level key of `changes` on each record matching `selector`.
    ///
    /// # Errors
    /// Propagates backend failures; validation failures are reported in the result.
    fn update_matching(&self, collection: &str, selector: Bson, changes: Bson) -> Result<OpResult, DbError>;

    fn query(&self, collection: &str) -> Query;

    /// # Errors
    /// Propagates backend failures.
    fn collection_names(&self) -> Result<Vec<String>, DbError>;

    /// # Errors
    /// Returns `DbError::FeatureNotImplemented` unless the backend supports it.
    fn drop_collection(&self, collection: &str) -> Result<bool, DbError> {
        Err(DbError::FeatureNotImplemented(format!("drop_collection({collection})")))
    }
}

fn no_params() -> [(&'static str, &'static str); 0] {
    []
}

fn expect_document(value: Bson, field: &str, errors: &mut Errors) -> Option<Document> {
    match value {
        Bson::Document(d) => Some(d),
        Bson::Null | Bson::Undefined => {
            errors.child(field).add("presence", no_params());
            None
        }
        other => {
            errors.child(field).add("type", [("expected", "document"), ("actual", type_name(&other))]);
            None
        }
    }
}

/// Checks a record for insertion and returns it with canonical keys.
pub(crate) fn validate_record(value: Bson, errors: &mut Errors) -> Option<Document> {
    expect_document(value, "record", errors).map(canonicalize)
}

pub(crate) fn validate_selector(value: Bson, errors: &mut Errors) -> Option<Selector> {
    let doc = expect_document(value, "selector", errors)?;
    match Selector::new(doc) {
        Ok(s) => Some(s),
        Err(e) => {
            errors.child("selector").add("selector", [("message", e.to_string())]);
            None
        }
    }
}

pub(crate) fn validate_changes(value: Bson, errors: &mut Errors) -> Option<Document> {
    let doc = canonicalize(expect_document(value, "changes", errors)?);
    if doc.is_empty() {
        errors.child("changes").add("presence", no_params());
        return None;
    }
    if let Some(tag) = doc.keys().find(|k| Operator::is_tag(k) || k.starts_with('$')) {
        errors.child("changes").add("operator", [("key", tag.as_str())]);
        return None;
    }
    Some(doc)
}

pub(crate) fn audit(op: &str, collection: &str, result: &OpResult) {
    if result.is_ok() {
        log::info!(target: crate::logger::AUDIT_TARGET, "op={op} collection={collection} count={}", result.count);
    } else {
        log::warn!(
            target: crate::logger::AUDIT_TARGET,
            "op={op} collection={collection} rejected: {}",
            result.errors.full_messages().join(", ")
        );
    }
}
