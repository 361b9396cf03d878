use crate::integration_tests::support::RecordingClient;
use bson::{Document, doc};
use nexus_query::adapter::{Adapter, MemoryAdapter, RemoteAdapter, RemotePlan};
use nexus_query::query::{Criterion, Plan};
use proptest::prelude::*;
use std::sync::Arc;

fn seeded(n: usize) -> MemoryAdapter {
    let a = MemoryAdapter::new();
    for i in 0..n {
        a.insert_one("n", doc! {"i": i64::try_from(i).unwrap()}.into()).unwrap();
    }
    a
}

proptest! {
    #![proptest_config(proptest::test_runner::Config {
        failure_persistence: Some(Box::new(proptest::test_runner::FileFailurePersistence::WithSource("proptest-regressions"))),
        cases: 64,
        .. proptest::test_runner::Config::default()
    })]

    // offset(o).limit(l) equals slicing the fully ordered result
    #[test]
    fn prop_offset_limit_is_a_slice(n in 0usize..25, o in 0usize..30, l in 0usize..30) {
        let a = seeded(n);
        let ordered = a.query("n").order([("i", "desc")]).unwrap();
        let full = ordered.to_vec().unwrap();
        let page = ordered.offset(o).limit(l).to_vec().unwrap();
        let expected: Vec<Document> = full.iter().skip(o).take(l).cloned().collect();
        prop_assert_eq!(&page, &expected);
        prop_assert_eq!(ordered.offset(o).limit(l).count().unwrap(), expected.len());
        prop_assert_eq!(ordered.offset(o).limit(l).exists().unwrap(), !expected.is_empty());
    }

    #[test]
    fn prop_limit_zero_is_empty_on_both_backends(n in 1usize..10, o in 0usize..5) {
        let a = seeded(n);
        prop_assert!(a.query("n").offset(o).limit(0).to_vec().unwrap().is_empty());
        let rows: Vec<Document> = (0..n).map(|i| doc! {"i": i64::try_from(i).unwrap()}).collect();
        let client = Arc::new(RecordingClient::with_rows(rows));
        let r = RemoteAdapter::new(client.clone());
        prop_assert!(r.query("n").offset(o).limit(0).to_vec().unwrap().is_empty());
        prop_assert!(client.calls().is_empty());
    }

    #[test]
    fn prop_remote_limit_is_minimum(limits in proptest::collection::vec(0usize..100, 1..6)) {
        let criteria: Vec<Criterion> = limits.iter().copied().map(Criterion::Limit).collect();
        let plan = RemotePlan::compile(&criteria);
        let min = limits.iter().copied().min().unwrap();
        prop_assert_eq!(plan.options.limit, Some(u64::try_from(min).unwrap()));
    }

    // Derived queries leave the base untouched, and re-running gives equal results
    #[test]
    fn prop_immutability_and_idempotence(n in 0usize..15, o in 0usize..5, l in 0usize..5) {
        let a = seeded(n);
        let base = a.query("n").order([("i", "asc")]).unwrap();
        let before = base.to_vec().unwrap();
        let _derived = base.offset(o).limit(l).matching(doc! {"i": {"__gte": 2}}).unwrap().order([("i", "desc")]).unwrap();
        prop_assert_eq!(base.criteria().len(), 1);
        prop_assert_eq!(&base.to_vec().unwrap(), &before);
        prop_assert_eq!(&base.to_vec().unwrap(), &base.to_vec().unwrap());
    }
}
