use bson::{Bson, Document, doc};
use nexus_query::adapter::{Adapter, MemoryAdapter};
use nexus_query::query::{Direction, SortSpec, parse_query_json};
use nexus_query::DbError;

fn people() -> MemoryAdapter {
    let a = MemoryAdapter::new();
    let rows = [
        doc! {"name": "ann", "age": 31, "addr": {"city": "oslo", "zip": "0150"}, "tags": ["a", "b"]},
        doc! {"name": "bob", "age": 25, "addr": {"city": "rome"}},
        doc! {"name": "cid", "age": 40, "addr": {"city": "oslo", "zip": "0151"}},
        doc! {"name": "dee", "age": Bson::Null},
        doc! {"name": "eve", "age": 25, "addr": {"city": "lima"}},
    ];
    for r in rows {
        a.insert_one("people", r.into()).unwrap();
    }
    a
}

fn names(docs: &[Document]) -> Vec<&str> {
    docs.iter().map(|d| d.get_str("name").unwrap()).collect()
}

#[test]
fn test_empty_selector_matches_everything() {
    let a = people();
    assert_eq!(a.query("people").matching(doc! {}).unwrap().count().unwrap(), 5);
}

#[test]
fn test_nested_superset_and_operators_combine() {
    let a = people();
    let q = a.query("people").matching(doc! {"addr": {"city": "oslo"}, "age": {"__gt": 35}}).unwrap();
    assert_eq!(names(&q.to_vec().unwrap()), vec!["cid"]);
}

#[test]
fn test_symbol_keys_on_either_side() {
    let a = MemoryAdapter::new();
    a.insert_one("t", doc! {":kind": "x", "n": 1}.into()).unwrap();
    assert_eq!(a.query("t").matching(doc! {"kind": "x"}).unwrap().count().unwrap(), 1);
    assert_eq!(a.query("t").matching(doc! {":n": {"__in": [1, 2]}}).unwrap().count().unwrap(), 1);
}

#[test]
fn test_missing_values_and_operators() {
    let a = people();
    let missing_zip = a.query("people").matching(doc! {"addr": {"zip": {"__exists": false}}}).unwrap();
    assert_eq!(names(&missing_zip.to_vec().unwrap()), vec!["bob", "dee", "eve"]);
    let not_oslo = a.query("people").matching(doc! {"addr": {"city": {"__ne": "oslo"}}}).unwrap();
    assert_eq!(names(&not_oslo.to_vec().unwrap()), vec!["bob", "dee", "eve"]);
    let null_age = a.query("people").matching(doc! {"age": Bson::Null}).unwrap();
    assert_eq!(names(&null_age.to_vec().unwrap()), vec!["dee"]);
}

#[test]
fn test_successive_matching_merges_fields() {
    let a = people();
    let q = a
        .query("people")
        .matching(doc! {"addr": {"city": "oslo"}})
        .unwrap()
        .matching(doc! {"addr": {"zip": "0151"}})
        .unwrap();
    assert_eq!(names(&q.to_vec().unwrap()), vec!["cid"]);
}

#[test]
fn test_order_with_ties_and_nulls() {
    let a = people();
    let asc = a.query("people").order([("age", "asc")]).unwrap().to_vec().unwrap();
    assert_eq!(names(&asc), vec!["bob", "eve", "ann", "cid", "dee"]);
    let desc = a.query("people").order([("age", "DESCENDING"), ("name", "asc")]).unwrap().to_vec().unwrap();
    assert_eq!(names(&desc), vec!["cid", "ann", "bob", "eve", "dee"]);
}

#[test]
fn test_last_order_wins() {
    let a = people();
    let q = a.query("people").order([("age", "asc")]).unwrap().order_by(vec![SortSpec::new("name", Direction::Desc)]);
    assert_eq!(names(&q.unwrap().to_vec().unwrap()), vec!["eve", "dee", "cid", "bob", "ann"]);
}

#[test]
fn test_incomparable_order_values_fail() {
    let a = MemoryAdapter::new();
    a.insert_one("mix", doc! {"v": 1}.into()).unwrap();
    a.insert_one("mix", doc! {"v": "one"}.into()).unwrap();
    let err = a.query("mix").order([("v", "asc")]).unwrap().to_vec().unwrap_err();
    assert!(matches!(err, DbError::IncomparableValues { ref field, .. } if field == "v"));
    // count does not order, so it still succeeds
    assert_eq!(a.query("mix").order([("v", "asc")]).unwrap().count().unwrap(), 2);
}

#[test]
fn test_construction_errors() {
    let a = people();
    let q = a.query("people");
    assert!(matches!(q.order(Vec::<(&str, &str)>::new()), Err(DbError::InvalidOrder(_))));
    assert!(matches!(q.order([("age", "up")]), Err(DbError::InvalidDirection(_))));
    assert!(matches!(q.matching(doc! {"a": {"__like": "x"}}), Err(DbError::UnknownOperator(_))));
    assert!(matches!(q.matching(doc! {"__eq": 1}), Err(DbError::InvalidSelector(_))));
    assert!(matches!(q.matching(doc! {"a": {"__in": 3}}), Err(DbError::InvalidSelector(_))));
    assert!(matches!(q.matching(doc! {"addr.city": "oslo"}), Err(DbError::InvalidSelector(_))));
    assert!(matches!(q.order([("addr.city", "asc")]), Err(DbError::InvalidOrder(_))));
}

#[test]
fn test_pagination_and_limit_zero() {
    let a = people();
    let ordered = a.query("people").order([("name", "asc")]).unwrap();
    assert_eq!(names(&ordered.offset(1).limit(2).to_vec().unwrap()), vec!["bob", "cid"]);
    assert_eq!(names(&ordered.offset(4).limit(10).to_vec().unwrap()), vec!["eve"]);
    assert!(ordered.offset(9).to_vec().unwrap().is_empty());
    assert!(ordered.limit(0).to_vec().unwrap().is_empty());
    assert_eq!(ordered.limit(0).count().unwrap(), 0);
    // last limit wins in memory
    assert_eq!(ordered.limit(1).limit(3).count().unwrap(), 3);
}

#[test]
fn test_first_for_each_and_iteration() {
    let a = people();
    let q = a.query("people").order([("age", "desc")]).unwrap();
    assert_eq!(q.first().unwrap().unwrap().get_str("name").unwrap(), "cid");
    let mut seen = Vec::new();
    q.for_each(|d| seen.push(d.get_str("name").unwrap().to_string())).unwrap();
    assert_eq!(seen.len(), 5);
    let collected: Result<Vec<Document>, DbError> = (&q).into_iter().collect();
    assert_eq!(collected.unwrap().len(), 5);
    assert!(a.query("empty").first().unwrap().is_none());
    assert!(!a.collection_names().unwrap().contains(&"empty".to_string()));
}

#[test]
fn test_cursor_restarts() {
    let a = people();
    let q = a.query("people").matching(doc! {"age": 25}).unwrap();
    let mut c = q.cursor();
    assert!(c.next().is_some());
    assert!(c.is_started());
    let fresh = c.restart();
    assert!(!fresh.is_started());
    assert_eq!(fresh.count(), 2);
}

#[test]
fn test_cursor_surfaces_errors_once() {
    let a = MemoryAdapter::new();
    a.insert_one("mix", doc! {"v": 1}.into()).unwrap();
    a.insert_one("mix", doc! {"v": true}.into()).unwrap();
    let mut c = a.query("mix").order([("v", "asc")]).unwrap().cursor();
    assert!(matches!(c.next(), Some(Err(DbError::IncomparableValues { .. }))));
    assert!(c.next().is_none());
}

#[test]
fn test_parsed_query_runs_against_memory() {
    let a = people();
    let criteria = parse_query_json(r#"{"selector":{"addr":{"city":"oslo"}},"order":[["age","desc"]],"limit":1}"#).unwrap();
    let got = a.query("people").extend(criteria).to_vec().unwrap();
    assert_eq!(names(&got), vec!["cid"]);
}
