use bson::{Bson, Document};
use std::cmp::Ordering;

use super::eval::{compare_values, is_absent, order_class};
use super::types::{Direction, SortSpec};
use crate::errors::DbError;
use crate::types::type_name;

/// A validated, non-empty list of ordering keys with a stable comparator.
///
/// Fields are top-level keys only; dotted and `$`-prefixed names are rejected
/// so that every backend reads a field the same way. Absent and `null` values
/// sort after present values in both directions. Records that tie on every key
/// keep their input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordOrder {
    specs: Vec<SortSpec>,
}

impl RecordOrder {
    /// # Errors
    /// Returns `DbError::InvalidOrder` for an empty list or an empty field name.
    pub fn new(specs: Vec<SortSpec>) -> Result<Self, DbError> {
        if specs.is_empty() {
            return Err(DbError::InvalidOrder("order needs at least one field".into()));
        }
        if specs.iter().any(|s| s.field.is_empty()) {
            return Err(DbError::InvalidOrder("empty field name".into()));
        }
        if let Some(bad) = specs.iter().find(|s| s.field.contains('.') || s.field.starts_with('$')) {
            return Err(DbError::InvalidOrder(format!("{} is not a top-level field name", bad.field)));
        }
        Ok(Self { specs })
    }

    /// Builds an order from `(field, direction-token)` pairs such as `("age", "DESC")`.
    ///
    /// # Errors
    /// Returns `DbError::InvalidDirection` for unknown tokens and
    /// `DbError::InvalidOrder` for an empty list.
    pub fn parse<I, F, D>(fields: I) -> Result<Self, DbError>
    where
        I: IntoIterator<Item = (F, D)>,
        F: AsRef<str>,
        D: AsRef<str>,
    {
        let specs = fields
            .into_iter()
            .map(|(f, d)| Ok(SortSpec::new(f.as_ref(), d.as_ref().parse::<Direction>()?)))
            .collect::<Result<Vec<_>, DbError>>()?;
        Self::new(specs)
    }

    #[must_use]
    pub fn specs(&self) -> &[SortSpec] {
        &self.specs
    }

    /// Fails when two present values of one ordering field have no natural ordering.
    ///
    /// # Errors
    /// Returns `DbError::IncomparableValues` naming the field and both value types.
    pub fn check_comparable<'a, I>(&self, records: I) -> Result<(), DbError>
    where
        I: IntoIterator<Item = &'a Document> + Clone,
    {
        for spec in &self.specs {
            let mut first: Option<&Bson> = None;
            for rec in records.clone() {
                let v = rec.get(&spec.field);
                if is_absent(v) {
                    continue;
                }
                let Some(v) = v else { continue };
                match first {
                    None => first = Some(v),
                    Some(f) => {
                        if order_class(f).is_none() || order_class(f) != order_class(v) {
                            return Err(DbError::IncomparableValues {
                                field: spec.field.clone(),
                                left: type_name(f).to_string(),
                                right: type_name(v).to_string(),
                            });
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Compares two records on the ordering keys only (no positional tie-break).
    #[must_use]
    pub fn compare(&self, a: &Document, b: &Document) -> Ordering {
        for spec in &self.specs {
            let ord = compare_field(a.get(&spec.field), b.get(&spec.field), spec.direction);
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }

    /// Sorts borrowed records, breaking ties by input position.
    ///
    /// # Errors
    /// Returns `DbError::IncomparableValues` before any reordering happens.
    pub fn sort<'a>(&self, records: Vec<&'a Document>) -> Result<Vec<&'a Document>, DbError> {
        self.check_comparable(records.iter().copied())?;
        let mut decorated: Vec<(usize, &Document)> = records.into_iter().enumerate().collect();
        decorated.sort_unstable_by(|(ia, a), (ib, b)| self.compare(a, b).then(ia.cmp(ib)));
        Ok(decorated.into_iter().map(|(_, d)| d).collect())
    }
}

fn compare_field(a: Option<&Bson>, b: Option<&Bson>, direction: Direction) -> Ordering {
    match (is_absent(a), is_absent(b)) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => {
            let ord = match (a, b) {
                (Some(x), Some(y)) => compare_values(x, y).unwrap_or(Ordering::Equal),
                _ => Ordering::Equal,
            };
            match direction {
                Direction::Asc => ord,
                Direction::Desc => ord.reverse(),
            }
        }
    }
}
