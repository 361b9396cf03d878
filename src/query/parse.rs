use bson::{Bson, Document};
use serde::{Deserialize, Serialize};

use super::criterion::Criterion;
use super::order::RecordOrder;
use super::selector::Selector;
use crate::errors::DbError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OrderEntrySerde {
    /// `"field"`: ascending.
    Field(String),
    /// `["field", "desc"]`
    Pair(String, String),
}

/// Serde-facing query document:
/// `{"selector": {...}, "order": [["age", "desc"], "name"], "limit": 10, "offset": 20}`.
///
/// Counts stay loosely typed here so that negative and fractional values are
/// reported as contract violations instead of generic decode errors.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QuerySerde {
    #[serde(default)]
    pub selector: Option<Bson>,
    #[serde(default)]
    pub order: Option<Vec<OrderEntrySerde>>,
    #[serde(default)]
    pub limit: Option<Bson>,
    #[serde(default)]
    pub offset: Option<Bson>,
}

impl TryFrom<QuerySerde> for Vec<Criterion> {
    type Error = DbError;

    fn try_from(qs: QuerySerde) -> Result<Self, Self::Error> {
        let mut out = Vec::new();
        if let Some(sel) = qs.selector {
            out.push(Criterion::Match(Selector::from_bson(sel)?));
        }
        if let Some(entries) = qs.order {
            let pairs = entries.into_iter().map(|e| match e {
                OrderEntrySerde::Field(f) => (f, "asc".to_string()),
                OrderEntrySerde::Pair(f, d) => (f, d),
            });
            out.push(Criterion::Order(RecordOrder::parse(pairs)?));
        }
        if let Some(off) = &qs.offset {
            out.push(Criterion::offset_from(off)?);
        }
        if let Some(lim) = &qs.limit {
            out.push(Criterion::limit_from(lim)?);
        }
        Ok(out)
    }
}

/// Parses a JSON query document into validated criteria.
///
/// # Errors
/// Returns `DbError::Json` for malformed JSON and the matching contract
/// violation for invalid selector, order, limit or offset values.
pub fn parse_query_json(json: &str) -> Result<Vec<Criterion>, DbError> {
    let qs: QuerySerde = serde_json::from_str(json)?;
    Vec::<Criterion>::try_from(qs)
}

/// Parses a bare JSON selector object.
///
/// # Errors
/// Returns `DbError::Json` or the selector construction error.
pub fn parse_selector_json(json: &str) -> Result<Selector, DbError> {
    let doc: Document = serde_json::from_str(json)?;
    Selector::new(doc)
}
