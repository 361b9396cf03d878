use bson::{Bson, Document};
use serde::Serialize;

use super::types::Operator;
use crate::config::{self, QueryConfig};
use crate::errors::DbError;
use crate::types::{canonicalize, type_name};

/// Validated match criteria: a tree of plain equality constraints and
/// `__op` operator maps over (possibly nested) field paths.
///
/// Keys are canonicalized on construction, and every operator tag is checked
/// against the closed operator set, so a `Selector` that exists is well formed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Selector {
    doc: Document,
}

impl Selector {
    /// The selector that matches every record.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// # Errors
    /// Returns `DbError::InvalidSelector` or `DbError::UnknownOperator` when the
    /// document breaks the operator-placement rules or the configured limits.
    pub fn new(doc: Document) -> Result<Self, DbError> {
        let doc = canonicalize(doc);
        let cfg = config::query_config();
        validate_level(&doc, 1, true, &cfg)?;
        Ok(Self { doc })
    }

    /// Builds a selector from an arbitrary value, which must be a document.
    ///
    /// # Errors
    /// Returns `DbError::InvalidSelector` for non-document values.
    pub fn from_bson(value: Bson) -> Result<Self, DbError> {
        match value {
            Bson::Document(d) => Self::new(d),
            other => Err(DbError::InvalidSelector(format!(
                "selector must be a document, got {}",
                type_name(&other)
            ))),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.doc.is_empty()
    }

    #[must_use]
    pub fn as_document(&self) -> &Document {
        &self.doc
    }

    #[must_use]
    pub fn into_document(self) -> Document {
        self.doc
    }

    /// Field-by-field merge: nested plain documents merge recursively, any
    /// other value (including operator arguments) from `other` replaces ours.
    #[must_use]
    pub fn merge(&self, other: &Selector) -> Selector {
        let mut doc = self.doc.clone();
        deep_merge(&mut doc, &other.doc);
        Selector { doc }
    }
}

impl TryFrom<Document> for Selector {
    type Error = DbError;

    fn try_from(doc: Document) -> Result<Self, Self::Error> {
        Self::new(doc)
    }
}

fn deep_merge(base: &mut Document, other: &Document) {
    for (k, v) in other {
        if !Operator::is_tag(k)
            && let (Some(Bson::Document(b)), Bson::Document(o)) = (base.get_mut(k), v)
        {
            deep_merge(b, o);
            continue;
        }
        base.insert(k.clone(), v.clone());
    }
}

fn validate_level(doc: &Document, depth: usize, root: bool, cfg: &QueryConfig) -> Result<(), DbError> {
    if depth > cfg.max_path_depth {
        return Err(DbError::InvalidSelector(format!(
            "selector nesting exceeds {} levels",
            cfg.max_path_depth
        )));
    }
    for (k, v) in doc {
        if k.is_empty() {
            return Err(DbError::InvalidSelector("empty field name".into()));
        }
        // Both spellings carry meaning for document stores: `$` marks native
        // operators and `.` marks paths. Nesting is the only path syntax here.
        if k.starts_with('$') {
            return Err(DbError::InvalidSelector(format!("field {k} uses the reserved '$' prefix")));
        }
        if k.contains('.') {
            return Err(DbError::InvalidSelector(format!("field {k} contains '.'; nest documents instead")));
        }
        if Operator::is_tag(k) {
            let op = Operator::from_tag(k)?;
            if root {
                return Err(DbError::InvalidSelector(format!("operator {k} needs a field path")));
            }
            validate_argument(op, k, v, cfg)?;
        } else if let Bson::Document(nested) = v {
            validate_level(nested, depth + 1, false, cfg)?;
        }
    }
    Ok(())
}

fn validate_argument(op: Operator, tag: &str, arg: &Bson, cfg: &QueryConfig) -> Result<(), DbError> {
    match op {
        Operator::In | Operator::Nin => match arg {
            Bson::Array(items) if items.len() <= cfg.max_in_set => Ok(()),
            Bson::Array(items) => Err(DbError::InvalidSelector(format!(
                "{tag} set has {} entries, limit is {}",
                items.len(),
                cfg.max_in_set
            ))),
            other => Err(DbError::InvalidSelector(format!("{tag} expects an array, got {}", type_name(other)))),
        },
        Operator::Exists => match arg {
            Bson::Boolean(_) => Ok(()),
            other => Err(DbError::InvalidSelector(format!("{tag} expects a bool, got {}", type_name(other)))),
        },
        Operator::Gt | Operator::Gte | Operator::Lt | Operator::Lte => {
            if super::eval::order_class(arg).is_some() {
                Ok(())
            } else {
                Err(DbError::InvalidSelector(format!("{tag} expects an ordered value, got {}", type_name(arg))))
            }
        }
        #[cfg(feature = "regex")]
        Operator::Regex => match arg {
            Bson::String(p) => regex::Regex::new(p)
                .map(|_| ())
                .map_err(|e| DbError::InvalidSelector(format!("{tag}: {e}"))),
            other => Err(DbError::InvalidSelector(format!("{tag} expects a pattern, got {}", type_name(other)))),
        },
        Operator::Eq | Operator::Ne => Ok(()),
    }
}
