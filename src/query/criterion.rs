use bson::Bson;

use super::order::RecordOrder;
use super::selector::Selector;
use crate::errors::DbError;
use crate::types::type_name;

/// One unit of query intent. Backends give each kind their own meaning by
/// folding a criteria list into a `Plan`.
#[derive(Debug, Clone, PartialEq)]
pub enum Criterion {
    Match(Selector),
    Limit(usize),
    Offset(usize),
    Order(RecordOrder),
}

impl Criterion {
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Match(_) => "match",
            Self::Limit(_) => "limit",
            Self::Offset(_) => "offset",
            Self::Order(_) => "order",
        }
    }

    /// Limit from a loosely typed value; only non-negative integers are accepted.
    ///
    /// # Errors
    /// Returns `DbError::InvalidLimit` for negative or non-integer values.
    pub fn limit_from(value: &Bson) -> Result<Self, DbError> {
        count_from(value).map(Self::Limit).map_err(DbError::InvalidLimit)
    }

    /// Offset from a loosely typed value; only non-negative integers are accepted.
    ///
    /// # Errors
    /// Returns `DbError::InvalidOffset` for negative or non-integer values.
    pub fn offset_from(value: &Bson) -> Result<Self, DbError> {
        count_from(value).map(Self::Offset).map_err(DbError::InvalidOffset)
    }
}

fn count_from(value: &Bson) -> Result<usize, String> {
    let n = match value {
        Bson::Int32(i) => i64::from(*i),
        Bson::Int64(i) => *i,
        other => return Err(format!("expected a non-negative integer, got {}", type_name(other))),
    };
    usize::try_from(n).map_err(|_| format!("{n} is negative"))
}

/// A backend's compiled form of a criteria list.
///
/// `apply` folds one criterion into the plan; `compile` folds a whole list left to right.
pub trait Plan: Default {
    fn apply(&mut self, criterion: &Criterion);

    fn compile(criteria: &[Criterion]) -> Self {
        let mut plan = Self::default();
        for c in criteria {
            plan.apply(c);
        }
        plan
    }
}
