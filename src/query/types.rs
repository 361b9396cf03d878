use crate::errors::DbError;
use crate::types::canonical_key;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Prefix marking a selector key as an operator tag (`__eq`, `__in`, ...).
pub const OPERATOR_PREFIX: &str = "__";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Asc,
    Desc,
}

impl FromStr for Direction {
    type Err = DbError;

    /// Accepts `asc`/`ascending` and `desc`/`descending` in any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Asc),
            "desc" | "descending" => Ok(Self::Desc),
            _ => Err(DbError::InvalidDirection(s.to_string())),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        })
    }
}

/// One ordering key. In-memory ordering resolves `field` as a top-level key only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    pub direction: Direction,
}

impl SortSpec {
    #[must_use]
    pub fn new(field: &str, direction: Direction) -> Self {
        Self { field: canonical_key(field).to_string(), direction }
    }

    #[must_use]
    pub fn asc(field: &str) -> Self {
        Self::new(field, Direction::Asc)
    }

    #[must_use]
    pub fn desc(field: &str) -> Self {
        Self::new(field, Direction::Desc)
    }
}

/// Closed set of selector operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Ne,
    In,
    Nin,
    Gt,
    Gte,
    Lt,
    Lte,
    Exists,
    #[cfg(feature = "regex")]
    Regex,
}

impl Operator {
    /// True when `key` uses the operator-tag convention, known or not.
    #[must_use]
    pub fn is_tag(key: &str) -> bool {
        key.starts_with(OPERATOR_PREFIX)
    }

    /// Resolves an operator tag such as `__in`.
    ///
    /// # Errors
    /// Returns `DbError::UnknownOperator` for tags outside the closed set.
    pub fn from_tag(tag: &str) -> Result<Self, DbError> {
        let name = tag.strip_prefix(OPERATOR_PREFIX).unwrap_or(tag);
        Ok(match name {
            "eq" => Self::Eq,
            "ne" => Self::Ne,
            "in" => Self::In,
            "nin" => Self::Nin,
            "gt" => Self::Gt,
            "gte" => Self::Gte,
            "lt" => Self::Lt,
            "lte" => Self::Lte,
            "exists" => Self::Exists,
            #[cfg(feature = "regex")]
            "regex" => Self::Regex,
            _ => return Err(DbError::UnknownOperator(tag.to_string())),
        })
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::In => "in",
            Self::Nin => "nin",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Exists => "exists",
            #[cfg(feature = "regex")]
            Self::Regex => "regex",
        }
    }

    /// Tag in the local selector syntax (`__in`).
    #[must_use]
    pub fn tag(self) -> String {
        format!("{OPERATOR_PREFIX}{}", self.name())
    }

    /// Tag in the document store's native syntax (`$in`).
    #[must_use]
    pub fn native_tag(self) -> String {
        format!("${}", self.name())
    }
}
