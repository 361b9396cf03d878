use bson::{Bson, Document};

use super::core::Collection;
use crate::adapter::OpResult;
use crate::errors::DbError;
use crate::query::{Criterion, Query};
use crate::types::canonicalize;

impl Collection {
    /// A fresh query over every record, denormalized through the collection's transform.
    #[must_use]
    pub fn query(&self) -> Query {
        self.adapter.query(self.name()).with_transform(self.transform.clone())
    }

    /// # Errors
    /// Returns the selector construction error for malformed selectors.
    pub fn matching(&self, selector: Document) -> Result<Query, DbError> {
        self.query().matching(selector)
    }

    /// # Errors
    /// Returns `DbError::InvalidOrder` or `DbError::InvalidDirection`.
    pub fn order<I, F, D>(&self, fields: I) -> Result<Query, DbError>
    where
        I: IntoIterator<Item = (F, D)>,
        F: AsRef<str>,
        D: AsRef<str>,
    {
        self.query().order(fields)
    }

    #[must_use]
    pub fn limit(&self, n: usize) -> Query {
        self.query().limit(n)
    }

    #[must_use]
    pub fn offset(&self, n: usize) -> Query {
        self.query().offset(n)
    }

    /// Runs a parsed JSON query document against this collection.
    ///
    /// # Errors
    /// Returns parse/contract errors, or execution errors.
    pub fn find_json(&self, json: &str) -> Result<Vec<Document>, DbError> {
        let criteria: Vec<Criterion> = crate::query::parse_query_json(json)?;
        self.query().extend(criteria).to_vec()
    }

    /// # Errors
    /// Propagates execution errors.
    pub fn all(&self) -> Result<Vec<Document>, DbError> {
        self.query().to_vec()
    }

    /// # Errors
    /// Propagates execution errors.
    pub fn count(&self) -> Result<usize, DbError> {
        self.query().count()
    }

    /// Normalizes and inserts one record.
    ///
    /// # Errors
    /// Propagates backend failures; validation failures land in the result.
    pub fn insert<R: Into<Bson>>(&self, record: R) -> Result<OpResult, DbError> {
        let mut result = self.adapter.insert_one(self.name(), self.normalize(record.into()))?;
        self.denormalize_data(&mut result);
        Ok(result)
    }

    /// `selector` is expressed in stored field names.
    ///
    /// # Errors
    /// Propagates backend failures; validation failures land in the result.
    pub fn delete<S: Into<Bson>>(&self, selector: S) -> Result<OpResult, DbError> {
        let mut result = self.adapter.delete_matching(self.name(), selector.into())?;
        self.denormalize_data(&mut result);
        Ok(result)
    }

    /// `selector` is expressed in stored field names; `changes` in application names.
    ///
    /// # Errors
    /// Propagates backend failures; validation failures land in the result.
    pub fn update<S: Into<Bson>, C: Into<Bson>>(&self, selector: S, changes: C) -> Result<OpResult, DbError> {
        let mut result =
            self.adapter.update_matching(self.name(), selector.into(), self.normalize(changes.into()))?;
        self.denormalize_data(&mut result);
        Ok(result)
    }

    // Keys are canonical before the transform sees them.
    fn normalize(&self, value: Bson) -> Bson {
        match value {
            Bson::Document(d) => Bson::Document(self.transform.normalize(canonicalize(d))),
            other => other,
        }
    }

    fn denormalize_data(&self, result: &mut OpResult) {
        result.data = std::mem::take(&mut result.data)
            .into_iter()
            .map(|d| self.transform.denormalize(d))
            .collect();
    }
}
