use bson::{Bson, Document, doc};
use nexus_query::adapter::{Adapter, MemoryAdapter};
use nexus_query::query::{Direction, RecordOrder, SortSpec};
use proptest::prelude::*;

fn key() -> impl Strategy<Value = Option<i32>> {
    proptest::option::weighted(0.8, 0i32..5)
}

fn rows(keys: &[Option<i32>]) -> Vec<Document> {
    keys.iter()
        .enumerate()
        .map(|(i, k)| {
            let i = i32::try_from(i).unwrap();
            match k {
                Some(v) => doc! {"k": *v, "pos": i},
                None if i % 2 == 0 => doc! {"k": Bson::Null, "pos": i},
                None => doc! {"pos": i},
            }
        })
        .collect()
}

proptest! {
    #![proptest_config(proptest::test_runner::Config {
        failure_persistence: Some(Box::new(proptest::test_runner::FileFailurePersistence::WithSource("proptest-regressions"))),
        cases: 64,
        .. proptest::test_runner::Config::default()
    })]

    // Equal keys keep input order; nulls and missing values come last in either direction
    #[test]
    fn prop_sort_is_stable_with_nulls_last(keys in proptest::collection::vec(key(), 0..20), desc in any::<bool>()) {
        let direction = if desc { Direction::Desc } else { Direction::Asc };
        let order = RecordOrder::new(vec![SortSpec::new("k", direction)]).unwrap();
        let input = rows(&keys);
        let sorted = order.sort(input.iter().collect()).unwrap();
        prop_assert_eq!(sorted.len(), input.len());
        for w in sorted.windows(2) {
            let a = w[0].get_i32("k").ok();
            let b = w[1].get_i32("k").ok();
            match (a, b) {
                (Some(x), Some(y)) => {
                    if desc { prop_assert!(x >= y); } else { prop_assert!(x <= y); }
                    if x == y {
                        prop_assert!(w[0].get_i32("pos").unwrap() < w[1].get_i32("pos").unwrap());
                    }
                }
                (None, Some(_)) => prop_assert!(false, "absent key sorted before a present one"),
                (Some(_), None) => {}
                (None, None) => prop_assert!(w[0].get_i32("pos").unwrap() < w[1].get_i32("pos").unwrap()),
            }
        }
    }

    #[test]
    fn prop_multi_key_sort_non_decreasing(v in proptest::collection::vec((0i64..4, any::<i64>()), 0..15)) {
        let a = MemoryAdapter::new();
        for (x, y) in &v {
            a.insert_one("srt", doc! {"a": *x, "b": *y}.into()).unwrap();
        }
        let docs = a.query("srt").order([("a", "asc"), ("b", "desc")]).unwrap().to_vec().unwrap();
        for w in docs.windows(2) {
            let (a0, b0) = (w[0].get_i64("a").unwrap(), w[0].get_i64("b").unwrap());
            let (a1, b1) = (w[1].get_i64("a").unwrap(), w[1].get_i64("b").unwrap());
            prop_assert!(a0 < a1 || (a0 == a1 && b0 >= b1));
        }
    }
}

#[test]
fn test_nulls_last_documented_cases() {
    let input = [doc! {"a": 2}, doc! {"a": Bson::Null}, doc! {"a": 1}];
    let asc = RecordOrder::new(vec![SortSpec::asc("a")]).unwrap();
    let desc = RecordOrder::new(vec![SortSpec::desc("a")]).unwrap();
    let got: Vec<Document> = asc.sort(input.iter().collect()).unwrap().into_iter().cloned().collect();
    assert_eq!(got, vec![doc! {"a": 1}, doc! {"a": 2}, doc! {"a": Bson::Null}]);
    let got: Vec<Document> = desc.sort(input.iter().collect()).unwrap().into_iter().cloned().collect();
    assert_eq!(got, vec![doc! {"a": 2}, doc! {"a": 1}, doc! {"a": Bson::Null}]);
}
