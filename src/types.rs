use bson::{Bson, Document};

/// A stored record. Top-level keys are field names, values are any BSON value.
pub type Record = Document;

/// Prefix of the symbol-style key spelling (`":name"`), which canonicalizes to `"name"`.
pub const SYMBOL_PREFIX: char = ':';

/// Canonical spelling of a key: the symbol form `":name"` becomes `"name"`.
#[must_use]
pub fn canonical_key(key: &str) -> &str {
    match key.strip_prefix(SYMBOL_PREFIX) {
        Some(rest) if !rest.is_empty() => rest,
        _ => key,
    }
}

/// Rewrites every key of `doc` (recursively, including documents inside arrays)
/// to its canonical spelling. When two spellings of one key collide the later entry wins.
#[must_use]
pub fn canonicalize(doc: Document) -> Document {
    let mut out = Document::new();
    for (k, v) in doc {
        out.insert(canonical_key(&k).to_string(), canonicalize_value(v));
    }
    out
}

fn canonicalize_value(v: Bson) -> Bson {
    match v {
        Bson::Document(d) => Bson::Document(canonicalize(d)),
        Bson::Array(items) => Bson::Array(items.into_iter().map(canonicalize_value).collect()),
        other => other,
    }
}

/// Short, stable name of a BSON value's type, used in diagnostics.
#[must_use]
pub fn type_name(v: &Bson) -> &'static str {
    match v {
        Bson::Null => "null",
        Bson::Undefined => "undefined",
        Bson::Boolean(_) => "bool",
        Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) | Bson::Decimal128(_) => "number",
        Bson::String(_) | Bson::Symbol(_) => "string",
        Bson::Array(_) => "array",
        Bson::Document(_) => "document",
        Bson::DateTime(_) => "datetime",
        Bson::Timestamp(_) => "timestamp",
        Bson::ObjectId(_) => "objectid",
        Bson::Binary(_) => "binary",
        Bson::RegularExpression(_) => "regex",
        _ => "other",
    }
}
