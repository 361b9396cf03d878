use bson::{Bson, Document, doc};
use nexus_query::query::{HashFilter, Selector, is_superset};
use proptest::prelude::*;

fn scalar() -> impl Strategy<Value = Bson> {
    prop_oneof![
        (0i32..4).prop_map(Bson::Int32),
        "[ab]{1}".prop_map(Bson::String),
        any::<bool>().prop_map(Bson::Boolean),
        Just(Bson::Null),
    ]
}

fn record() -> impl Strategy<Value = Document> {
    (
        proptest::option::of(scalar()),
        proptest::option::of(scalar()),
        proptest::option::of((scalar(), proptest::option::of(scalar()))),
    )
        .prop_map(|(a, b, nested)| {
            let mut d = Document::new();
            if let Some(a) = a {
                d.insert("a", a);
            }
            if let Some(b) = b {
                d.insert("b", b);
            }
            if let Some((x, y)) = nested {
                let mut n = doc! {"x": x};
                if let Some(y) = y {
                    n.insert("y", y);
                }
                d.insert("n", n);
            }
            d
        })
}

fn plain_selector() -> impl Strategy<Value = Document> {
    (proptest::option::of(scalar()), proptest::option::of(scalar())).prop_map(|(a, x)| {
        let mut d = Document::new();
        if let Some(a) = a {
            d.insert("a", a);
        }
        if let Some(x) = x {
            d.insert("n", doc! {"x": x});
        }
        d
    })
}

proptest! {
    #![proptest_config(proptest::test_runner::Config {
        failure_persistence: Some(Box::new(proptest::test_runner::FileFailurePersistence::WithSource("proptest-regressions"))),
        .. proptest::test_runner::Config::default()
    })]

    // Plain selectors match exactly the structural supersets
    #[test]
    fn prop_plain_selector_is_superset(r in record(), s in plain_selector()) {
        let selector = Selector::new(s.clone()).unwrap();
        let filter = HashFilter::new(&selector).unwrap();
        prop_assert_eq!(filter.matches(&r), is_superset(&r, &s));
    }

    // Adding an operator on `b` never changes the outcome of the plain part on other paths
    #[test]
    fn prop_operator_independence(r in record(), s in plain_selector(), v in 0i32..4) {
        let plain = HashFilter::new(&Selector::new(s.clone()).unwrap()).unwrap();
        let op = HashFilter::new(&Selector::new(doc! {"b": {"__eq": v}}).unwrap()).unwrap();
        let mut both = s;
        both.insert("b", doc! {"__eq": v});
        let combined = HashFilter::new(&Selector::new(both).unwrap()).unwrap();
        prop_assert_eq!(combined.matches(&r), plain.matches(&r) && op.matches(&r));
    }

    #[test]
    fn prop_eq_and_ne_are_complementary(r in record(), v in scalar()) {
        let eq = HashFilter::new(&Selector::new(doc! {"a": {"__eq": v.clone()}}).unwrap()).unwrap();
        let ne = HashFilter::new(&Selector::new(doc! {"a": {"__ne": v}}).unwrap()).unwrap();
        prop_assert_ne!(eq.matches(&r), ne.matches(&r));
    }

    #[test]
    fn prop_in_and_nin_are_complementary(r in record(), vs in proptest::collection::vec(0i32..4, 0..4)) {
        let arr: Vec<Bson> = vs.into_iter().map(Bson::Int32).collect();
        let inn = HashFilter::new(&Selector::new(doc! {"a": {"__in": arr.clone()}}).unwrap()).unwrap();
        let nin = HashFilter::new(&Selector::new(doc! {"a": {"__nin": arr}}).unwrap()).unwrap();
        prop_assert_ne!(inn.matches(&r), nin.matches(&r));
    }
}
