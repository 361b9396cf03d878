use bson::{Bson, doc};
use nexus_query::adapter::{Adapter, MemoryAdapter};
use nexus_query::Errors;

#[test]
fn test_errors_are_scoped_by_argument() {
    let a = MemoryAdapter::new();
    let r = a.update_matching("t", Bson::String("x".into()), doc! {"__ne": 1}.into()).unwrap();
    let sel = r.errors.get("selector").unwrap();
    assert_eq!(sel.own()[0].kind, "type");
    assert_eq!(sel.own()[0].params.get("actual").map(String::as_str), Some("string"));
    assert_eq!(r.errors.get("changes").unwrap().own()[0].kind, "operator");
    assert_eq!(r.errors.len(), 2);
    let msgs = r.errors.full_messages();
    assert!(msgs.iter().any(|m| m.starts_with("selector")));
    assert!(msgs.iter().any(|m| m.starts_with("changes")));
}

#[test]
fn test_errors_serialize_to_json() {
    let mut e = Errors::new();
    e.child("record").add("presence", std::iter::empty::<(&str, &str)>());
    let v = serde_json::to_value(&e).unwrap();
    assert!(v.to_string().contains("presence"));
}
