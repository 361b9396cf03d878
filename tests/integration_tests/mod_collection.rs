use bson::{Bson, doc};
use nexus_query::adapter::{Adapter, MemoryAdapter};
use nexus_query::{Collection, FieldRename};
use std::sync::Arc;

fn users() -> (Arc<MemoryAdapter>, Collection) {
    let adapter = Arc::new(MemoryAdapter::new());
    let c = Collection::with_transform("users", adapter.clone(), Arc::new(FieldRename::new([("email", "e")])));
    (adapter, c)
}

#[test]
fn test_insert_reports_canonical_record() {
    let (_, c) = users();
    let r = c.insert(doc! {":email": "a@x", "n": 1}).unwrap();
    assert!(r.is_ok());
    assert_eq!(r.count, 1);
    assert_eq!(r.data, vec![doc! {"email": "a@x", "n": 1}]);
    assert_eq!(c.matching(doc! {"e": "a@x"}).unwrap().count().unwrap(), 1);
}

#[test]
fn test_insert_rejects_non_documents() {
    let (adapter, c) = users();
    let r = c.insert(Bson::Int32(3)).unwrap();
    assert!(!r.is_ok());
    assert_eq!(r.count, 0);
    assert_eq!(r.errors.full_messages().len(), 1);
    assert_eq!(adapter.query("users").count().unwrap(), 0);
}

#[test]
fn test_reads_are_denormalized() {
    let (adapter, c) = users();
    c.insert(doc! {"email": "a@x", "n": 1}).unwrap();
    c.insert(doc! {"email": "b@x", "n": 2}).unwrap();
    assert_eq!(adapter.query("users").matching(doc! {"e": "b@x"}).unwrap().count().unwrap(), 1);
    let got = c.matching(doc! {"e": "b@x"}).unwrap().to_vec().unwrap();
    assert_eq!(got, vec![doc! {"email": "b@x", "n": 2}]);
    assert_eq!(c.order([("n", "desc")]).unwrap().first().unwrap().unwrap().get_str("email").unwrap(), "b@x");
}

#[test]
fn test_update_and_delete() {
    let (_, c) = users();
    for i in 0..4 {
        c.insert(doc! {"email": format!("{i}@x"), "n": i}).unwrap();
    }
    let upd = c.update(doc! {"n": {"__gte": 2}}, doc! {"email": "hi@x"}).unwrap();
    assert_eq!(upd.count, 2);
    assert!(upd.data.iter().all(|d| d.get_str("email").unwrap() == "hi@x"));
    let del = c.delete(doc! {"e": "hi@x"}).unwrap();
    assert_eq!(del.count, 2);
    assert_eq!(c.count().unwrap(), 2);
    assert_eq!(c.limit(1).count().unwrap(), 1);
    assert_eq!(c.offset(1).count().unwrap(), 1);
}

#[test]
fn test_collections_share_store_by_name() {
    let adapter = Arc::new(MemoryAdapter::new());
    let a = Collection::new("shared", adapter.clone());
    let b = Collection::new("shared", adapter.clone());
    let q = b.query();
    a.insert(doc! {"x": 1}).unwrap();
    assert_eq!(q.count().unwrap(), 1);
    assert_eq!(a.name(), "shared");
}
