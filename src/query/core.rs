use bson::Document;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use super::criterion::Criterion;
use super::cursor::Cursor;
use super::order::RecordOrder;
use super::selector::Selector;
use super::types::SortSpec;
use crate::config;
use crate::errors::DbError;
use crate::transform::{Identity, Transform};

/// Backend execution strategy behind a `Query`.
///
/// Implementations receive the accumulated criteria in call order and decide
/// how each kind combines. Returned records are owned copies.
pub trait QuerySource: Send + Sync {
    fn name(&self) -> &str;

    /// # Errors
    /// Propagates backend failures and ordering contract violations.
    fn fetch(&self, criteria: &[Criterion]) -> Result<Vec<Document>, DbError>;

    /// # Errors
    /// Propagates backend failures.
    fn count(&self, criteria: &[Criterion]) -> Result<usize, DbError>;

    /// # Errors
    /// Propagates backend failures.
    fn exists(&self, criteria: &[Criterion]) -> Result<bool, DbError> {
        Ok(self.count(criteria)? > 0)
    }
}

/// An immutable, chainable query. Every builder method returns a new `Query`;
/// nothing is executed until `to_vec`, `count`, `exists`, `first`, `for_each`
/// or iteration.
#[derive(Clone)]
pub struct Query {
    source: Arc<dyn QuerySource>,
    criteria: Arc<[Criterion]>,
    transform: Arc<dyn Transform>,
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("source", &self.source.name())
            .field("criteria", &self.criteria)
            .field("transform", &self.transform)
            .finish()
    }
}

impl Query {
    pub fn new(source: Arc<dyn QuerySource>) -> Self {
        Self { source, criteria: Arc::from(Vec::new()), transform: Arc::new(Identity) }
    }

    #[must_use]
    pub fn with_transform(&self, transform: Arc<dyn Transform>) -> Self {
        Self { source: Arc::clone(&self.source), criteria: Arc::clone(&self.criteria), transform }
    }

    fn with(&self, criterion: Criterion) -> Self {
        let mut criteria = self.criteria.to_vec();
        criteria.push(criterion);
        Self {
            source: Arc::clone(&self.source),
            criteria: Arc::from(criteria),
            transform: Arc::clone(&self.transform),
        }
    }

    /// Appends already-validated criteria, e.g. from `parse_query_json`.
    #[must_use]
    pub fn extend<I: IntoIterator<Item = Criterion>>(&self, criteria: I) -> Self {
        criteria.into_iter().fold(self.clone(), |q, c| q.with(c))
    }

    /// Narrows the query; successive calls merge field by field.
    ///
    /// # Errors
    /// Returns the selector construction error for malformed selectors.
    pub fn matching(&self, selector: Document) -> Result<Self, DbError> {
        Ok(self.with(Criterion::Match(Selector::new(selector)?)))
    }

    #[must_use]
    pub fn matching_selector(&self, selector: Selector) -> Self {
        self.with(Criterion::Match(selector))
    }

    /// Replaces the ordering with `(field, direction-token)` pairs.
    ///
    /// # Errors
    /// Returns `DbError::InvalidOrder` or `DbError::InvalidDirection`.
    pub fn order<I, F, D>(&self, fields: I) -> Result<Self, DbError>
    where
        I: IntoIterator<Item = (F, D)>,
        F: AsRef<str>,
        D: AsRef<str>,
    {
        Ok(self.with(Criterion::Order(RecordOrder::parse(fields)?)))
    }

    /// # Errors
    /// Returns `DbError::InvalidOrder` for an empty list.
    pub fn order_by(&self, specs: Vec<SortSpec>) -> Result<Self, DbError> {
        Ok(self.with(Criterion::Order(RecordOrder::new(specs)?)))
    }

    #[must_use]
    pub fn limit(&self, n: usize) -> Self {
        self.with(Criterion::Limit(n))
    }

    #[must_use]
    pub fn offset(&self, n: usize) -> Self {
        self.with(Criterion::Offset(n))
    }

    #[must_use]
    pub fn criteria(&self) -> &[Criterion] {
        &self.criteria
    }

    #[must_use]
    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// Executes and returns the records in final order, denormalized.
    ///
    /// # Errors
    /// Propagates backend failures and `DbError::IncomparableValues`.
    pub fn to_vec(&self) -> Result<Vec<Document>, DbError> {
        let start = Instant::now();
        let records = self.source.fetch(&self.criteria)?;
        let out: Vec<Document> = records.into_iter().map(|r| self.transform.denormalize(r)).collect();
        self.observe("find", start, out.len());
        Ok(out)
    }

    /// Cardinality of the result, after offset and limit.
    ///
    /// # Errors
    /// Propagates backend failures.
    pub fn count(&self) -> Result<usize, DbError> {
        let start = Instant::now();
        let n = self.source.count(&self.criteria)?;
        self.observe("count", start, n);
        Ok(n)
    }

    /// # Errors
    /// Propagates backend failures.
    pub fn exists(&self) -> Result<bool, DbError> {
        let start = Instant::now();
        let found = self.source.exists(&self.criteria)?;
        self.observe("exists", start, usize::from(found));
        Ok(found)
    }

    /// # Errors
    /// Propagates backend failures.
    pub fn first(&self) -> Result<Option<Document>, DbError> {
        Ok(self.limit(1).to_vec()?.into_iter().next())
    }

    /// Executes once and hands each record to `f`.
    ///
    /// # Errors
    /// Propagates execution failures; `f` is not called in that case.
    pub fn for_each<F: FnMut(Document)>(&self, f: F) -> Result<(), DbError> {
        self.to_vec()?.into_iter().for_each(f);
        Ok(())
    }

    /// A lazy cursor; nothing runs until the first `next`. Each fresh cursor
    /// re-reads the source.
    #[must_use]
    pub fn cursor(&self) -> Cursor {
        Cursor::new(self.clone())
    }

    fn observe(&self, op: &str, start: Instant, result_count: usize) {
        let ms = start.elapsed().as_millis();
        let line = serde_json::json!({
            "bench": "query",
            "ts": chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            "op": op,
            "collection": self.source.name(),
            "duration_ms": u64::try_from(ms).unwrap_or(u64::MAX),
            "criteria": self.criteria.len(),
            "result_count": result_count,
        });
        crate::dev6!("{line}");
        if ms > u128::from(config::query_config().slow_query_ms) {
            log::warn!("slow query: op={op} collection={} duration_ms={ms} criteria={:?}", self.source.name(), self.criteria);
        } else {
            log::debug!("query op={op} collection={} results={result_count}", self.source.name());
        }
    }
}

impl<'a> IntoIterator for &'a Query {
    type Item = Result<Document, DbError>;
    type IntoIter = Cursor;

    fn into_iter(self) -> Self::IntoIter {
        self.cursor()
    }
}
