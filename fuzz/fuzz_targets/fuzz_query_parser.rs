#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 8192 { return; }
    if let Ok(s) = std::str::from_utf8(data) {
        // Malformed queries must come back as errors, never panics
        let _ = nexus_query::query::parse_query_json(s);
    }
});
