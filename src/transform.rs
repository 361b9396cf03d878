//! Per-record value transforms between application form and stored form.

use crate::types::Record;
use bson::Document;
use std::fmt::Debug;

/// `normalize` runs on write, `denormalize` on read. For well-formed records
/// `denormalize(normalize(r)) == r`.
pub trait Transform: Send + Sync + Debug {
    fn normalize(&self, record: Record) -> Document;
    fn denormalize(&self, stored: Document) -> Record;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl Transform for Identity {
    fn normalize(&self, record: Record) -> Document {
        record
    }

    fn denormalize(&self, stored: Document) -> Record {
        stored
    }
}

/// Renames top-level fields: application names on one side, storage names on the other.
///
/// Its domain is records that do not already use a storage name as an
/// application field.
#[derive(Debug, Clone, Default)]
pub struct FieldRename {
    pairs: Vec<(String, String)>,
}

impl FieldRename {
    /// `pairs` are `(application_name, stored_name)`.
    pub fn new<I, A, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (A, S)>,
        A: Into<String>,
        S: Into<String>,
    {
        Self { pairs: pairs.into_iter().map(|(a, s)| (a.into(), s.into())).collect() }
    }

    fn rename(doc: Document, map: impl Fn(&str) -> Option<String>) -> Document {
        doc.into_iter().map(|(k, v)| (map(&k).unwrap_or(k), v)).collect()
    }
}

impl Transform for FieldRename {
    fn normalize(&self, record: Record) -> Document {
        Self::rename(record, |k| self.pairs.iter().find(|(a, _)| a == k).map(|(_, s)| s.clone()))
    }

    fn denormalize(&self, stored: Document) -> Record {
        Self::rename(stored, |k| self.pairs.iter().find(|(_, s)| s == k).map(|(a, _)| a.clone()))
    }
}
