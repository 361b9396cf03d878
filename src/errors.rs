use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serde JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("BSON: {0}")]
    Bson(#[from] bson::error::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    #[error("Unknown operator: {0}")]
    UnknownOperator(String),

    #[error("Invalid limit: {0}")]
    InvalidLimit(String),

    #[error("Invalid offset: {0}")]
    InvalidOffset(String),

    #[error("Invalid order: {0}")]
    InvalidOrder(String),

    #[error("Invalid sort direction: {0}")]
    InvalidDirection(String),

    #[error("Cannot compare values of field '{field}': {left} vs {right}")]
    IncomparableValues { field: String, left: String, right: String },

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("feature not implemented: {0}")]
    FeatureNotImplemented(String),
}

/// A single validation failure: a kind tag plus free-form parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    pub kind: String,
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

/// Nestable accumulator for validation failures reported by adapter operations.
///
/// Errors recorded at this level apply to the value as a whole; child containers
/// scope errors to a named field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Errors {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    errors: Vec<ValidationError>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    children: BTreeMap<String, Errors>,
}

impl Errors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<K, I, P, V>(&mut self, kind: K, params: I)
    where
        K: Into<String>,
        I: IntoIterator<Item = (P, V)>,
        P: Into<String>,
        V: ToString,
    {
        let params = params.into_iter().map(|(k, v)| (k.into(), v.to_string())).collect();
        self.errors.push(ValidationError { kind: kind.into(), params });
    }

    /// Returns the container scoped to `name`, creating it on first use.
    pub fn child(&mut self, name: &str) -> &mut Errors {
        self.children.entry(name.to_string()).or_default()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Errors> {
        self.children.get(name)
    }

    /// Errors recorded directly on this level (children excluded).
    #[must_use]
    pub fn own(&self) -> &[ValidationError] {
        &self.errors
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.children.values().all(Errors::is_empty)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len() + self.children.values().map(Errors::len).sum::<usize>()
    }

    /// Flattened `path: kind` messages, children prefixed with their dotted path.
    #[must_use]
    pub fn full_messages(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_messages("", &mut out);
        out
    }

    fn collect_messages(&self, prefix: &str, out: &mut Vec<String>) {
        for e in &self.errors {
            if prefix.is_empty() {
                out.push(e.kind.clone());
            } else {
                out.push(format!("{prefix}: {}", e.kind));
            }
        }
        for (name, child) in &self.children {
            let path = if prefix.is_empty() { name.clone() } else { format!("{prefix}.{name}") };
            child.collect_messages(&path, out);
        }
    }
}
