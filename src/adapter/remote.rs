//! Document-store backend. Criteria compile into a native filter document plus
//! find options; the wire protocol belongs to the injected client.

use bson::{Bson, Document, doc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{Adapter, OpResult, audit, validate_changes, validate_record, validate_selector};
use crate::errors::{DbError, Errors};
use crate::query::{Criterion, Direction, Operator, Plan, Query, QuerySource, Selector};

/// Native find options: sort document (`{field: 1 | -1}`), skip and limit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteFindOptions {
    pub sort: Option<Document>,
    pub skip: Option<u64>,
    pub limit: Option<u64>,
}

/// Synchronous driver boundary. Filters use the store's native `$op` syntax.
pub trait DocumentStoreClient: Send + Sync {
    /// # Errors
    /// Driver or network failures.
    fn find(&self, collection: &str, filter: &Document, options: &RemoteFindOptions) -> Result<Vec<Document>, DbError>;

    /// # Errors
    /// Driver or network failures.
    fn count_documents(&self, collection: &str, filter: &Document, options: &RemoteFindOptions) -> Result<u64, DbError>;

    /// # Errors
    /// Driver or network failures.
    fn insert_one(&self, collection: &str, record: &Document) -> Result<(), DbError>;

    /// # Errors
    /// Driver or network failures.
    fn delete_many(&self, collection: &str, filter: &Document) -> Result<u64, DbError>;

    /// # Errors
    /// Driver or network failures.
    fn update_many(&self, collection: &str, filter: &Document, update: &Document) -> Result<u64, DbError>;

    /// # Errors
    /// Driver or network failures.
    fn list_collection_names(&self) -> Result<Vec<String>, DbError>;

    /// # Errors
    /// Driver or network failures.
    fn drop_collection(&self, collection: &str) -> Result<bool, DbError>;
}

/// Rewrites a selector into a native filter document.
///
/// Plain nested paths flatten to dotted keys so they keep superset semantics
/// (`{"a": {"b": 1}}` becomes `{"a.b": 1}`), operator tags become `$op`, and a
/// literal empty document becomes a type check.
#[must_use]
pub fn translate_selector(selector: &Selector) -> Document {
    let mut out = Document::new();
    flatten(selector.as_document(), "", &mut out);
    out
}

fn flatten(doc: &Document, prefix: &str, out: &mut Document) {
    for (k, v) in doc {
        let path = if prefix.is_empty() { k.clone() } else { format!("{prefix}.{k}") };
        match v {
            Bson::Document(nested) if nested.is_empty() => {
                out.insert(path, doc! {"$type": "object"});
            }
            Bson::Document(nested) => {
                let mut ops = Document::new();
                for (tag, arg) in nested.iter().filter(|(t, _)| Operator::is_tag(t)) {
                    if let Ok(op) = Operator::from_tag(tag) {
                        ops.insert(op.native_tag(), arg.clone());
                    }
                }
                if !ops.is_empty() {
                    out.insert(path.clone(), ops);
                }
                let plain: Document = nested
                    .iter()
                    .filter(|(t, _)| !Operator::is_tag(t))
                    .map(|(t, a)| (t.clone(), a.clone()))
                    .collect();
                flatten(&plain, &path, out);
            }
            other => {
                out.insert(path, other.clone());
            }
        }
    }
}

/// Document-store reading of a criteria list: selectors merge exactly as in
/// memory and the merged selector is translated once; the smallest limit
/// wins, the last offset and order win.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemotePlan {
    pub selector: Selector,
    pub filter: Document,
    pub options: RemoteFindOptions,
}

impl Plan for RemotePlan {
    fn apply(&mut self, criterion: &Criterion) {
        match criterion {
            Criterion::Match(s) => {
                self.selector = self.selector.merge(s);
                self.filter = translate_selector(&self.selector);
            }
            Criterion::Limit(n) => {
                let n = u64::try_from(*n).unwrap_or(u64::MAX);
                self.options.limit = Some(self.options.limit.map_or(n, |prev| prev.min(n)));
            }
            Criterion::Offset(n) => self.options.skip = Some(u64::try_from(*n).unwrap_or(u64::MAX)),
            Criterion::Order(order) => {
                let mut sort = Document::new();
                for spec in order.specs() {
                    let dir = match spec.direction {
                        Direction::Asc => 1,
                        Direction::Desc => -1,
                    };
                    sort.insert(spec.field.clone(), dir);
                }
                self.options.sort = Some(sort);
            }
        }
    }
}

struct RemoteSource {
    name: String,
    client: Arc<dyn DocumentStoreClient>,
}

impl QuerySource for RemoteSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch(&self, criteria: &[Criterion]) -> Result<Vec<Document>, DbError> {
        let plan = RemotePlan::compile(criteria);
        // A zero limit means "no limit" to the store.
        if plan.options.limit == Some(0) {
            return Ok(Vec::new());
        }
        self.client.find(&self.name, &plan.filter, &plan.options)
    }

    fn count(&self, criteria: &[Criterion]) -> Result<usize, DbError> {
        let plan = RemotePlan::compile(criteria);
        if plan.options.limit == Some(0) {
            return Ok(0);
        }
        let n = self.client.count_documents(&self.name, &plan.filter, &plan.options)?;
        Ok(usize::try_from(n).unwrap_or(usize::MAX))
    }

    fn exists(&self, criteria: &[Criterion]) -> Result<bool, DbError> {
        let mut plan = RemotePlan::compile(criteria);
        if plan.options.limit == Some(0) {
            return Ok(false);
        }
        plan.options.limit = Some(1);
        plan.options.sort = None;
        Ok(!self.client.find(&self.name, &plan.filter, &plan.options)?.is_empty())
    }
}

/// Adapter over a document-store client.
#[derive(Clone)]
pub struct RemoteAdapter {
    client: Arc<dyn DocumentStoreClient>,
}

impl std::fmt::Debug for RemoteAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteAdapter").finish_non_exhaustive()
    }
}

impl RemoteAdapter {
    pub fn new(client: Arc<dyn DocumentStoreClient>) -> Self {
        Self { client }
    }
}

impl Adapter for RemoteAdapter {
    fn insert_one(&self, collection: &str, record: Bson) -> Result<OpResult, DbError> {
        let mut errors = Errors::new();
        let result = match validate_record(record, &mut errors) {
            Some(record) => {
                self.client.insert_one(collection, &record)?;
                OpResult::ok(1, vec![record])
            }
            None => OpResult::invalid(errors),
        };
        audit("insert", collection, &result);
        Ok(result)
    }

    fn delete_matching(&self, collection: &str, selector: Bson) -> Result<OpResult, DbError> {
        let mut errors = Errors::new();
        let result = match validate_selector(selector, &mut errors) {
            Some(selector) => {
                let n = self.client.delete_many(collection, &translate_selector(&selector))?;
                OpResult::ok(usize::try_from(n).unwrap_or(usize::MAX), Vec::new())
            }
            None => OpResult::invalid(errors),
        };
        audit("delete", collection, &result);
        Ok(result)
    }

    fn update_matching(&self, collection: &str, selector: Bson, changes: Bson) -> Result<OpResult, DbError> {
        let mut errors = Errors::new();
        let selector = validate_selector(selector, &mut errors);
        let changes = validate_changes(changes, &mut errors);
        let result = match (selector, changes) {
            (Some(selector), Some(changes)) => {
                let update = doc! {"$set": changes};
                let n = self.client.update_many(collection, &translate_selector(&selector), &update)?;
                OpResult::ok(usize::try_from(n).unwrap_or(usize::MAX), Vec::new())
            }
            _ => OpResult::invalid(errors),
        };
        audit("update", collection, &result);
        Ok(result)
    }

    fn query(&self, collection: &str) -> Query {
        Query::new(Arc::new(RemoteSource { name: collection.to_string(), client: Arc::clone(&self.client) }))
    }

    fn collection_names(&self) -> Result<Vec<String>, DbError> {
        self.client.list_collection_names()
    }

    fn drop_collection(&self, collection: &str) -> Result<bool, DbError> {
        self.client.drop_collection(collection)
    }
}
