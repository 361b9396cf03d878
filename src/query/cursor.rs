use bson::Document;

use super::core::Query;
use crate::errors::DbError;

/// Lazy, restartable iteration over a query's results.
///
/// The query executes on the first `next`. Cloning an unstarted cursor, or
/// calling `restart`, gives an independent pass that re-reads the source.
#[derive(Clone, Debug)]
pub struct Cursor {
    query: Query,
    pending: Option<std::vec::IntoIter<Document>>,
}

impl Cursor {
    pub(crate) fn new(query: Query) -> Self {
        Self { query, pending: None }
    }

    #[must_use]
    pub fn restart(&self) -> Self {
        Self::new(self.query.clone())
    }

    #[must_use]
    pub fn is_started(&self) -> bool {
        self.pending.is_some()
    }
}

impl Iterator for Cursor {
    type Item = Result<Document, DbError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pending.is_none() {
            match self.query.to_vec() {
                Ok(records) => self.pending = Some(records.into_iter()),
                Err(e) => {
                    self.pending = Some(Vec::new().into_iter());
                    return Some(Err(e));
                }
            }
        }
        self.pending.as_mut().and_then(Iterator::next).map(Ok)
    }
}
