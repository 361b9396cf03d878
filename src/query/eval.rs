use bson::{Bson, Document};
use std::cmp::Ordering;

/// Families of values that have a natural ordering among themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OrderClass {
    Number,
    String,
    Bool,
    DateTime,
    Timestamp,
    ObjectId,
}

pub(crate) fn order_class(v: &Bson) -> Option<OrderClass> {
    match v {
        Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) | Bson::Decimal128(_) => Some(OrderClass::Number),
        Bson::String(_) | Bson::Symbol(_) => Some(OrderClass::String),
        Bson::Boolean(_) => Some(OrderClass::Bool),
        Bson::DateTime(_) => Some(OrderClass::DateTime),
        Bson::Timestamp(_) => Some(OrderClass::Timestamp),
        Bson::ObjectId(_) => Some(OrderClass::ObjectId),
        _ => None,
    }
}

enum Num {
    Int(i64),
    Float(f64),
}

fn as_num(v: &Bson) -> Option<Num> {
    match v {
        Bson::Int32(i) => Some(Num::Int(i64::from(*i))),
        Bson::Int64(i) => Some(Num::Int(*i)),
        Bson::Double(f) => Some(Num::Float(*f)),
        Bson::Decimal128(d) => Some(Num::Float(d.to_string().parse::<f64>().unwrap_or(f64::NAN))),
        _ => None,
    }
}

/// Exact numeric ordering: integers never round through `f64`, `-0.0 == 0.0`,
/// and NaN is unordered.
fn cmp_num(a: &Num, b: &Num) -> Option<Ordering> {
    match (a, b) {
        (Num::Int(x), Num::Int(y)) => Some(x.cmp(y)),
        (Num::Int(x), Num::Float(y)) => cmp_int_float(*x, *y),
        (Num::Float(x), Num::Int(y)) => cmp_int_float(*y, *x).map(Ordering::reverse),
        (Num::Float(x), Num::Float(y)) => x.partial_cmp(y),
    }
}

// 2^63 is exactly representable; every float in [-2^63, 2^63) truncates into i64.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

#[allow(clippy::cast_possible_truncation)]
fn cmp_int_float(i: i64, f: f64) -> Option<Ordering> {
    if f.is_nan() {
        return None;
    }
    if f >= I64_BOUND {
        return Some(Ordering::Less);
    }
    if f < -I64_BOUND {
        return Some(Ordering::Greater);
    }
    let whole = f.trunc();
    Some(i.cmp(&(whole as i64)).then_with(|| 0.0_f64.partial_cmp(&(f - whole)).unwrap_or(Ordering::Equal)))
}

fn as_str(v: &Bson) -> Option<&str> {
    match v {
        Bson::String(s) | Bson::Symbol(s) => Some(s),
        _ => None,
    }
}

/// Natural ordering of two values of the same `OrderClass`; `None` when the
/// values are not mutually comparable.
pub(crate) fn compare_values(a: &Bson, b: &Bson) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (as_num(a), as_num(b)) {
        return cmp_num(&x, &y);
    }
    if let (Some(x), Some(y)) = (as_str(a), as_str(b)) {
        return Some(x.cmp(y));
    }
    match (a, b) {
        (Bson::Boolean(x), Bson::Boolean(y)) => Some(x.cmp(y)),
        (Bson::DateTime(x), Bson::DateTime(y)) => Some(x.cmp(y)),
        (Bson::Timestamp(x), Bson::Timestamp(y)) => Some((x.time, x.increment).cmp(&(y.time, y.increment))),
        (Bson::ObjectId(x), Bson::ObjectId(y)) => Some(x.bytes().cmp(&y.bytes())),
        _ => None,
    }
}

/// Value equality used by selectors: numeric widths compare by value, strings
/// and symbols compare by text, documents compare key-by-key regardless of key order.
pub(crate) fn values_equal(a: &Bson, b: &Bson) -> bool {
    if let (Some(x), Some(y)) = (as_num(a), as_num(b)) {
        return match cmp_num(&x, &y) {
            Some(o) => o == Ordering::Equal,
            None => matches!((x, y), (Num::Float(p), Num::Float(q)) if p.is_nan() && q.is_nan()),
        };
    }
    if let (Some(x), Some(y)) = (as_str(a), as_str(b)) {
        return x == y;
    }
    match (a, b) {
        (Bson::Document(x), Bson::Document(y)) => documents_equal(x, y),
        (Bson::Array(x), Bson::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(p, q)| values_equal(p, q))
        }
        _ => a == b,
    }
}

pub(crate) fn documents_equal(a: &Document, b: &Document) -> bool {
    a.len() == b.len() && a.iter().all(|(k, v)| b.get(k).is_some_and(|w| values_equal(v, w)))
}

/// Null and absence are treated alike when ordering.
pub(crate) fn is_absent(v: Option<&Bson>) -> bool {
    matches!(v, None | Some(Bson::Null | Bson::Undefined))
}
