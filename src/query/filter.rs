use bson::{Bson, Document};
use std::cmp::Ordering;

use super::eval::{compare_values, values_equal};
use super::selector::Selector;
use super::types::Operator;
use crate::errors::DbError;

/// Result of resolving a field path against a record. `Undefined` means the
/// path does not exist (or crosses a non-document value); a stored `null` is
/// `Value(&Bson::Null)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolved<'a> {
    Value(&'a Bson),
    Undefined,
}

impl<'a> Resolved<'a> {
    #[must_use]
    pub fn value(self) -> Option<&'a Bson> {
        match self {
            Self::Value(v) => Some(v),
            Self::Undefined => None,
        }
    }
}

/// Walks `path` through nested documents.
#[must_use]
pub fn resolve<'a>(record: &'a Document, path: &[String]) -> Resolved<'a> {
    let Some((last, parents)) = path.split_last() else {
        return Resolved::Undefined;
    };
    let mut cur = record;
    for seg in parents {
        match cur.get(seg) {
            Some(Bson::Document(d)) => cur = d,
            _ => return Resolved::Undefined,
        }
    }
    cur.get(last).map_or(Resolved::Undefined, Resolved::Value)
}

#[derive(Debug, Clone)]
enum Predicate {
    Cmp(Operator, Bson),
    #[cfg(feature = "regex")]
    Regex(regex::Regex),
}

impl Predicate {
    fn compile(op: Operator, arg: &Bson) -> Result<Self, DbError> {
        #[cfg(feature = "regex")]
        {
            if op == Operator::Regex {
                let pattern = arg.as_str().unwrap_or_default();
                return regex::Regex::new(pattern)
                    .map(Predicate::Regex)
                    .map_err(|e| DbError::InvalidSelector(e.to_string()));
            }
        }
        Ok(Self::Cmp(op, arg.clone()))
    }

    fn eval(&self, value: Resolved<'_>) -> bool {
        match self {
            Self::Cmp(op, arg) => eval_operator(*op, value, arg),
            #[cfg(feature = "regex")]
            Self::Regex(re) => matches!(value, Resolved::Value(Bson::String(s)) if re.is_match(s)),
        }
    }
}

fn contains(set: &Bson, value: &Bson) -> bool {
    match set {
        Bson::Array(items) => items.iter().any(|x| values_equal(x, value)),
        _ => false,
    }
}

fn ordered(value: Resolved<'_>, arg: &Bson, accept: impl Fn(Ordering) -> bool) -> bool {
    value.value().and_then(|v| compare_values(v, arg)).is_some_and(accept)
}

fn eval_operator(op: Operator, value: Resolved<'_>, arg: &Bson) -> bool {
    match op {
        Operator::Eq => value.value().is_some_and(|v| values_equal(v, arg)),
        Operator::Ne => !value.value().is_some_and(|v| values_equal(v, arg)),
        Operator::In => value.value().is_some_and(|v| contains(arg, v)),
        Operator::Nin => !value.value().is_some_and(|v| contains(arg, v)),
        Operator::Gt => ordered(value, arg, |o| o == Ordering::Greater),
        Operator::Gte => ordered(value, arg, |o| o != Ordering::Less),
        Operator::Lt => ordered(value, arg, |o| o == Ordering::Less),
        Operator::Lte => ordered(value, arg, |o| o != Ordering::Greater),
        Operator::Exists => matches!(value, Resolved::Value(_)) == matches!(arg, Bson::Boolean(true)),
        #[cfg(feature = "regex")]
        Operator::Regex => false,
    }
}

/// A selector compiled into a plain-equality `subhash` plus per-path operator filters.
///
/// A record matches when it is a structural superset of the subhash and every
/// operator at every path holds.
#[derive(Debug, Clone)]
pub struct HashFilter {
    subhash: Document,
    filters: Vec<(Vec<String>, Vec<Predicate>)>,
}

impl HashFilter {
    /// # Errors
    /// Returns an error only if an operator argument fails to compile.
    pub fn new(selector: &Selector) -> Result<Self, DbError> {
        let mut raw: Vec<(Vec<String>, Vec<(Operator, Bson)>)> = Vec::new();
        let subhash = partition(selector.as_document(), &mut Vec::new(), &mut raw)?;
        let filters = raw
            .into_iter()
            .map(|(path, ops)| {
                let preds = ops
                    .iter()
                    .map(|(op, arg)| Predicate::compile(*op, arg))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok((path, preds))
            })
            .collect::<Result<Vec<_>, DbError>>()?;
        Ok(Self { subhash, filters })
    }

    #[must_use]
    pub fn subhash(&self) -> &Document {
        &self.subhash
    }

    /// Paths carrying operator filters, in selector order.
    pub fn filtered_paths(&self) -> impl Iterator<Item = &[String]> {
        self.filters.iter().map(|(p, _)| p.as_slice())
    }

    #[must_use]
    pub fn matches(&self, record: &Document) -> bool {
        is_superset(record, &self.subhash)
            && self.filters.iter().all(|(path, preds)| {
                let value = resolve(record, path);
                preds.iter().all(|p| p.eval(value))
            })
    }
}

type RawFilters = Vec<(Vec<String>, Vec<(Operator, Bson)>)>;

/// Operator keys at a level always become filters on that level's path; plain
/// keys with document values recurse. A nested level whose entries were all
/// extracted as filters leaves no trace in the subhash.
fn partition(doc: &Document, path: &mut Vec<String>, filters: &mut RawFilters) -> Result<Document, DbError> {
    let mut sub = Document::new();
    for (k, v) in doc {
        if Operator::is_tag(k) {
            let op = Operator::from_tag(k)?;
            push_filter(filters, path, op, v.clone());
            continue;
        }
        match v {
            Bson::Document(nested) if !nested.is_empty() => {
                path.push(k.clone());
                let inner = partition(nested, path, filters)?;
                path.pop();
                if !inner.is_empty() {
                    sub.insert(k.clone(), inner);
                }
            }
            _ => {
                sub.insert(k.clone(), v.clone());
            }
        }
    }
    Ok(sub)
}

fn push_filter(filters: &mut RawFilters, path: &[String], op: Operator, arg: Bson) {
    if let Some((_, ops)) = filters.iter_mut().find(|(p, _)| p.as_slice() == path) {
        ops.push((op, arg));
    } else {
        filters.push((path.to_vec(), vec![(op, arg)]));
    }
}

/// True when every path/value of `sub` is present in `record` with an equal value.
#[must_use]
pub fn is_superset(record: &Document, sub: &Document) -> bool {
    sub.iter().all(|(k, sv)| match (record.get(k), sv) {
        (Some(Bson::Document(rd)), Bson::Document(sd)) => is_superset(rd, sd),
        (Some(rv), _) => values_equal(rv, sv),
        (None, _) => false,
    })
}
