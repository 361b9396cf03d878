#![no_main]
use libfuzzer_sys::fuzz_target;
use nexus_query::query::{HashFilter, parse_selector_json};

fuzz_target!(|input: (String, String)| {
    let (sel, rec) = input;
    if sel.len() > 4096 || rec.len() > 4096 { return; }
    let Ok(selector) = parse_selector_json(&sel) else { return };
    let Ok(filter) = HashFilter::new(&selector) else { return };
    if let Ok(record) = serde_json::from_str::<bson::Document>(&rec) {
        let _ = filter.matches(&record);
    }
});
